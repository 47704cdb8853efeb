//! Issue titles: language-model suggestion with a deterministic fallback.

pub mod ai_adapter;

use metrics::counter;
use tracing::{info, warn};

use crate::ingest::types::Listing;
use ai_adapter::DynTitleModel;

pub const MAX_TITLE_CHARS: usize = 80;
pub const FALLBACK_PREFIX: &str = "SAM.gov: ";
const ELLIPSIS: &str = "...";

/// Cut to `MAX_TITLE_CHARS` characters, ending in "..." when shortened.
pub fn clamp_title(s: &str) -> String {
    if s.chars().count() <= MAX_TITLE_CHARS {
        return s.to_string();
    }
    let keep = MAX_TITLE_CHARS - ELLIPSIS.len();
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// "SAM.gov: <title>", prefixed first and then clamped.
pub fn fallback_title(listing: &Listing) -> String {
    clamp_title(&format!("{FALLBACK_PREFIX}{}", listing.title_or_default()))
}

/// Single line, surrounding quotes removed, clamped. Empty means unusable.
pub fn sanitize_title(raw: &str) -> String {
    let one_line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let unquoted = one_line.trim_matches(['"', '\'']).trim();
    clamp_title(unquoted)
}

/// User prompt for the model, built from the listing's key fields.
pub fn build_prompt(listing: &Listing) -> String {
    let field = |v: &Option<String>, default: &'static str| -> String {
        v.as_deref().unwrap_or(default).to_string()
    };
    format!(
        "You are helping create actionable issue titles for a defense contracting company's project management system.\n\
         \n\
         Based on this SAM.gov opportunity, create a concise, actionable issue title that would be useful for a project manager:\n\
         \n\
         Original Title: {title}\n\
         Notice Type: {kind}\n\
         NAICS Code: {naics}\n\
         Organization: {org}\n\
         Set-Aside: {set_aside}\n\
         Response Deadline: {deadline}\n\
         \n\
         The issue title should be:\n\
         - Clear and actionable (starts with a verb when possible)\n\
         - Specific to the opportunity type and industry\n\
         - Under {max} characters\n\
         - Professional but direct\n\
         - Focus on what action needs to be taken\n\
         \n\
         Examples of good titles:\n\
         - \"Evaluate Army 9mm Ammo RFP - 150k rounds - Due June 15\"\n\
         - \"Review USMC Rifle Team Equipment Sources Sought\"\n\
         - \"Assess Small Business Set-Aside for Navy Munitions\"\n\
         \n\
         Generate ONLY the title, no explanations or quotes:",
        title = listing.title_or_default(),
        kind = field(&listing.notice_type, "Unknown type"),
        naics = field(&listing.naics_code, "Unknown NAICS"),
        org = field(&listing.full_parent_path_name, "Unknown organization"),
        set_aside = field(&listing.set_aside, "No set-aside info"),
        deadline = field(&listing.response_deadline, "No deadline"),
        max = MAX_TITLE_CHARS,
    )
}

pub struct TitleGenerator {
    model: DynTitleModel,
}

impl TitleGenerator {
    pub fn new(model: DynTitleModel) -> Self {
        Self { model }
    }

    pub fn ai_enabled(&self) -> bool {
        self.model.is_enabled()
    }

    /// Never fails and never returns an empty string.
    pub async fn generate(&self, listing: &Listing) -> String {
        if !self.model.is_enabled() {
            return fallback_title(listing);
        }

        let prompt = build_prompt(listing);
        match self.model.complete(&prompt).await {
            Ok(raw) => {
                let title = sanitize_title(&raw);
                if !title.is_empty() {
                    info!(provider = self.model.provider_name(), %title, "AI generated title");
                    return title;
                }
                warn!(provider = self.model.provider_name(), "AI returned an empty title");
            }
            Err(e) => {
                warn!(provider = self.model.provider_name(), error = ?e, "failed to generate AI title");
            }
        }

        counter!("title_fallbacks_total").increment(1);
        let title = fallback_title(listing);
        info!(%title, "using fallback title");
        title
    }
}
