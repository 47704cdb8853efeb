// src/ingest/mod.rs
pub mod providers;
pub mod types;

use crate::ingest::types::{DetailError, Listing, ListingSource, SearchWindow};
use metrics::counter;
use std::collections::HashSet;

pub const NO_DETAIL_URL: &str = "No detailed description available";
pub const DETAIL_HTTP_FAILED: &str = "Failed to fetch detailed description";
pub const DETAIL_ERROR: &str = "Error fetching detailed description";
pub const DETAIL_MISSING_FIELD: &str = "No description found";

const DETAIL_MAX_CHARS: usize = 2000;

/// Normalize detail text: decode entities, strip tags, collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    // 4) Length cap
    if out.chars().count() > DETAIL_MAX_CHARS {
        out = out.chars().take(DETAIL_MAX_CHARS).collect();
        out.push_str("...");
    }

    out
}

/// Record's code contains at least one requested code (substring match).
pub fn matches_naics<S: AsRef<str>>(listing: &Listing, codes: &[S]) -> bool {
    match listing.naics_code.as_deref() {
        Some(code) if !code.is_empty() => codes.iter().any(|c| code.contains(c.as_ref())),
        _ => false,
    }
}

/// Record's notice type contains one of the targets, ignoring case.
pub fn matches_notice_type<S: AsRef<str>>(listing: &Listing, targets: &[S]) -> bool {
    let kind = listing.notice_type.as_deref().unwrap_or_default().trim();
    if kind.is_empty() {
        return false;
    }
    let kind = kind.to_lowercase();
    targets
        .iter()
        .any(|t| kind.contains(&t.as_ref().to_lowercase()))
}

/// Keep the first occurrence of every identifier. Unidentified records pass
/// through untouched so the registry can report them.
pub fn dedup_by_uid(listings: Vec<Listing>) -> Vec<Listing> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(listings.len());
    for l in listings {
        match l.uid() {
            Some(uid) => {
                if seen.insert(uid.to_string()) {
                    out.push(l);
                }
            }
            None => out.push(l),
        }
    }
    out
}

/// Query every code once, filter, merge, and dedup.
///
/// A failing code is logged and contributes nothing; the remaining codes still run.
pub async fn collect_listings<S: AsRef<str>>(
    source: &dyn ListingSource,
    naics_codes: &[S],
    notice_types: &[S],
    window: SearchWindow,
) -> Vec<Listing> {
    let mut merged = Vec::new();
    for code in naics_codes {
        let code = code.as_ref();
        tracing::debug!(naics = code, provider = source.name(), "searching");
        let raw = match source.search(code, window).await {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = ?e, naics = code, provider = source.name(), "search failed");
                counter!("sam_search_errors_total").increment(1);
                continue;
            }
        };
        let returned = raw.len();
        let kept: Vec<Listing> = raw
            .into_iter()
            .filter(|l| matches_naics(l, naics_codes) && matches_notice_type(l, notice_types))
            .collect();
        tracing::debug!(naics = code, returned, kept = kept.len(), "filtered");
        merged.extend(kept);
    }

    let unique = dedup_by_uid(merged);
    counter!("sam_listings_matched_total").increment(unique.len() as u64);
    unique
}

/// Detail body for logging; any failure degrades to a placeholder.
pub async fn detail_text(source: &dyn ListingSource, listing: &Listing) -> String {
    if !matches!(listing.detail_url.as_deref(), Some(u) if !u.trim().is_empty()) {
        return NO_DETAIL_URL.to_string();
    }
    match source.fetch_details(listing).await {
        Ok(text) => normalize_text(&text),
        Err(DetailError::Status(status)) => {
            tracing::warn!(status, provider = source.name(), "detail fetch rejected");
            DETAIL_HTTP_FAILED.to_string()
        }
        Err(DetailError::Other(e)) => {
            tracing::warn!(error = ?e, provider = source.name(), "detail fetch failed");
            DETAIL_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, naics: &str, kind: &str) -> Listing {
        Listing {
            notice_id: Some(id.into()),
            naics_code: Some(naics.into()),
            notice_type: Some(kind.into()),
            ..Default::default()
        }
    }

    #[test]
    fn normalize_text_strips_markup_and_collapses_ws() {
        let s = "<p>Market&nbsp;research</p>\n\n<b>only</b>  ";
        assert_eq!(normalize_text(s), "Market research only");
    }

    #[test]
    fn naics_match_is_substring() {
        let l = listing("a", "332992-x", "Sources Sought");
        assert!(matches_naics(&l, &["332992"]));
        assert!(!matches_naics(&l, &["336992"]));
        assert!(!matches_naics(&Listing::default(), &["332992"]));
    }

    #[test]
    fn notice_type_match_ignores_case() {
        let l = listing("a", "332992", "  SOURCES SOUGHT Synopsis ");
        assert!(matches_notice_type(&l, &["Sources Sought"]));
        assert!(!matches_notice_type(&l, &["RFI"]));
        assert!(!matches_notice_type(&Listing::default(), &["RFI"]));
    }

    #[test]
    fn dedup_keeps_first_and_passes_unidentified() {
        let mut a2 = listing("A", "1", "x");
        a2.title = Some("second".into());
        let out = dedup_by_uid(vec![
            listing("A", "1", "x"),
            Listing::default(),
            a2,
            listing("B", "1", "x"),
        ]);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].title, None);
        assert_eq!(out[1].uid(), None);
        assert_eq!(out[2].uid(), Some("B"));
    }
}
