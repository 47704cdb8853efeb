use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static DESCRIBED: OnceCell<()> = OnceCell::new();

/// Register descriptions for every series the monitor emits. Idempotent.
pub fn describe() {
    DESCRIBED.get_or_init(|| {
        describe_counter!(
            "sam_listings_matched_total",
            "Listings that passed the code and notice-type filters."
        );
        describe_counter!(
            "sam_listings_admitted_total",
            "Listings admitted to the seen registry for the first time."
        );
        describe_counter!(
            "sam_search_errors_total",
            "Failed search calls, one per classification code."
        );
        describe_counter!("issues_created_total", "Issues created successfully.");
        describe_counter!(
            "issue_publish_errors_total",
            "Issue creation attempts that failed."
        );
        describe_counter!(
            "title_fallbacks_total",
            "Titles produced by the deterministic fallback after an AI failure."
        );
        describe_gauge!("registry_size", "Identifiers held by the seen registry.");
        describe_gauge!(
            "scan_last_run_ts",
            Unit::Seconds,
            "Unix time of the last completed scan."
        );
        describe_histogram!(
            "sam_parse_ms",
            Unit::Milliseconds,
            "Time spent decoding a search response."
        );
    });
}

/// Install the global Prometheus recorder with a scrape listener on `addr`.
pub fn install_exporter(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("prometheus: install exporter on {addr}"))?;
    describe();
    Ok(())
}

/// Install a recorder without a listener; callers render the handle themselves.
pub fn install_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("prometheus: install recorder")?;
    describe();
    Ok(handle)
}
