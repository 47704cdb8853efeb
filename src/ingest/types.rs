// src/ingest/types.rs
use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One opportunity notice as returned by the search API.
///
/// Only the fields the monitor reads are typed; everything else is kept in
/// `extra` so the registry holds the record exactly as it arrived.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(default, deserialize_with = "lenient_string")]
    pub notice_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub solicitation_number: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub notice_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub naics_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_parent_path_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub posted_date: Option<String>,
    #[serde(rename = "responseDeadLine", default, deserialize_with = "lenient_string")]
    pub response_deadline: Option<String>,
    #[serde(
        rename = "typeOfSetAsideDescription",
        default,
        deserialize_with = "lenient_string"
    )]
    pub set_aside: Option<String>,
    /// Detail-fetch URL (the API names it `description`).
    #[serde(rename = "description", default, deserialize_with = "lenient_string")]
    pub detail_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ui_link: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub additional_info_link: Option<String>,

    // shape varies per notice, kept raw
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_address: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_of_performance: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_contact: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_contact: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_of_contact: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Listing {
    /// Dedup key: notice id, else solicitation number. Empty strings count as absent.
    pub fn uid(&self) -> Option<&str> {
        non_empty(self.notice_id.as_deref()).or_else(|| non_empty(self.solicitation_number.as_deref()))
    }

    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().unwrap_or("No title")
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}

/// Accepts strings, numbers and booleans; `null` becomes `None`.
fn lenient_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Inclusive posting-date range sent with each search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl SearchWindow {
    /// `to` minus `lookback_days`; `None` if the start date is not representable.
    pub fn trailing(to: NaiveDate, lookback_days: u32) -> Option<Self> {
        let from = to.checked_sub_days(chrono::Days::new(u64::from(lookback_days)))?;
        Some(Self { from, to })
    }

    /// MM/DD/YYYY, the format the search API expects.
    pub fn from_param(&self) -> String {
        self.from.format("%m/%d/%Y").to_string()
    }

    pub fn to_param(&self) -> String {
        self.to.format("%m/%d/%Y").to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DetailError {
    #[error("detail endpoint returned HTTP {0}")]
    Status(u16),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    /// One page of raw candidates for a single classification code.
    async fn search(&self, naics: &str, window: SearchWindow) -> Result<Vec<Listing>>;
    /// Free-text detail body for a listing.
    async fn fetch_details(&self, listing: &Listing) -> Result<String, DetailError>;
    fn name(&self) -> &'static str;
}
