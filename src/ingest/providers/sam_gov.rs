use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use metrics::histogram;
use serde::Deserialize;

use crate::ingest::types::{DetailError, Listing, ListingSource, SearchWindow};
use crate::ingest::DETAIL_MISSING_FIELD;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "opportunitiesData", default)]
    opportunities: Vec<Listing>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    description: Option<serde_json::Value>,
}

/// Settings for the opportunity search endpoint.
#[derive(Debug, Clone)]
pub struct SamGovSettings {
    pub base_url: String,
    pub api_key: String,
    pub page_size: u32,
    /// Notice category filter (`r` = Sources Sought).
    pub ptype: String,
    pub timeout: Duration,
}

pub struct SamGovProvider {
    http: reqwest::Client,
    settings: SamGovSettings,
}

impl SamGovProvider {
    pub fn new(settings: SamGovSettings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sam-opportunity-monitor/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(settings.timeout)
            .build()
            .context("building SAM.gov http client")?;
        Ok(Self { http, settings })
    }

    fn parse_search_body(body: &str) -> Result<Vec<Listing>> {
        let t0 = std::time::Instant::now();
        let resp: SearchResponse =
            serde_json::from_str(body).context("parsing opportunity search json")?;
        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("sam_parse_ms").record(ms);
        Ok(resp.opportunities)
    }
}

/// Append `api_key` to a detail URL, respecting an existing query string.
pub fn detail_url_with_key(url: &str, api_key: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}api_key={api_key}")
}

#[async_trait]
impl ListingSource for SamGovProvider {
    async fn search(&self, naics: &str, window: SearchWindow) -> Result<Vec<Listing>> {
        let limit = self.settings.page_size.to_string();
        let from = window.from_param();
        let to = window.to_param();
        let resp = self
            .http
            .get(&self.settings.base_url)
            .query(&[
                ("api_key", self.settings.api_key.as_str()),
                ("postedFrom", from.as_str()),
                ("postedTo", to.as_str()),
                ("limit", limit.as_str()),
                ("naics", naics),
                ("ptype", self.settings.ptype.as_str()),
            ])
            .send()
            .await
            .context("sam.gov search request")?;

        let status = resp.status();
        let body = resp.text().await.context("sam.gov search .text()")?;
        if !status.is_success() {
            return Err(anyhow!("sam.gov search returned {status}: {body}"));
        }
        let listings = Self::parse_search_body(&body)?;
        tracing::debug!(naics, returned = listings.len(), "sam.gov search ok");
        Ok(listings)
    }

    async fn fetch_details(&self, listing: &Listing) -> Result<String, DetailError> {
        let Some(url) = listing.detail_url.as_deref() else {
            return Ok(crate::ingest::NO_DETAIL_URL.to_string());
        };
        let resp = self
            .http
            .get(detail_url_with_key(url, &self.settings.api_key))
            .send()
            .await
            .context("sam.gov detail request")?;
        if !resp.status().is_success() {
            return Err(DetailError::Status(resp.status().as_u16()));
        }
        let detail: DetailResponse = resp.json().await.context("sam.gov detail json")?;
        Ok(match detail.description {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => DETAIL_MISSING_FIELD.to_string(),
            Some(other) => other.to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "SAM.gov"
    }
}
