// tests/metrics.rs
//
// One test per binary: the Prometheus recorder is process-global.
mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{listing, FakeSource, RecordingPublisher};
use sam_opportunity_monitor::ai_adapter::DisabledClient;
use sam_opportunity_monitor::{metrics, Monitor, MonitorSettings, TitleGenerator};

#[tokio::test]
async fn scan_series_are_exported() {
    let handle = metrics::install_recorder().expect("recorder");

    let mut source = FakeSource::new(vec![
        listing("A", "332992", "Sources Sought"),
        listing("B", "332992", "Sources Sought"),
    ]);
    source.fail_codes.insert("336992".to_string());

    let mut monitor = Monitor::new(
        MonitorSettings {
            naics_codes: vec!["332992".into(), "336992".into()],
            notice_types: vec!["Sources Sought".into()],
            scan_interval: Duration::from_secs(60),
            lookback_days: 90,
        },
        Arc::new(source),
        TitleGenerator::new(Arc::new(DisabledClient)),
        Arc::new(RecordingPublisher::failing_on(&[2])),
    );
    monitor.scan_once().await.expect("scan");

    let out = handle.render();
    assert!(out.contains("sam_listings_matched_total 2"), "{out}");
    assert!(out.contains("sam_listings_admitted_total 2"));
    assert!(out.contains("sam_search_errors_total 1"));
    assert!(out.contains("issues_created_total 1"));
    assert!(out.contains("issue_publish_errors_total 1"));
    assert!(out.contains("registry_size"));
    assert!(out.contains("scan_last_run_ts"));
}
