// tests/monitor_cycle.rs
//
// Orchestrator scenarios with fake source, model and publisher.
mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, TimeZone};
use common::{listing, CountingModel, FakeSource, InstantSleeper, RecordingPublisher};
use sam_opportunity_monitor::ai_adapter::DisabledClient;
use sam_opportunity_monitor::{Monitor, MonitorSettings, ScanReport, TitleGenerator};

fn settings(lookback_days: u32) -> MonitorSettings {
    MonitorSettings {
        naics_codes: vec!["332992".into()],
        notice_types: vec!["Sources Sought".into(), "RFI".into()],
        scan_interval: Duration::from_secs(3600),
        lookback_days,
    }
}

fn fixed_clock() -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()
}

#[tokio::test]
async fn repeated_listing_is_titled_and_published_once() {
    let source = Arc::new(FakeSource::new(vec![listing("N0001", "332992", "Sources Sought")]));
    let model = Arc::new(CountingModel::new("Review SOCOM ammunition RFI"));
    let publisher = Arc::new(RecordingPublisher::default());

    let mut monitor = Monitor::new(
        settings(90),
        source.clone(),
        TitleGenerator::new(model.clone()),
        publisher.clone(),
    )
    .with_clock(fixed_clock);

    let first = monitor.scan_once().await.expect("first scan");
    let second = monitor.scan_once().await.expect("second scan");

    assert_eq!(first.admitted, 1);
    assert_eq!(second.admitted, 0);
    assert_eq!(second.matched, 1, "still matched, just not new");
    assert_eq!(model.calls(), 1);
    assert_eq!(publisher.attempts(), 1);
    assert_eq!(publisher.titles(), vec!["Review SOCOM ammunition RFI"]);
    assert_eq!(monitor.registry().size(), 1);
}

#[tokio::test]
async fn publish_failure_is_counted_and_listing_stays_seen() {
    let source = Arc::new(FakeSource::new(vec![
        listing("A", "332992", "Sources Sought"),
        listing("B", "332992", "Sources Sought"),
        listing("C", "332992", "Sources Sought"),
    ]));
    let publisher = Arc::new(RecordingPublisher::failing_on(&[2]));
    let mut monitor = Monitor::new(
        settings(90),
        source,
        TitleGenerator::new(Arc::new(DisabledClient)),
        publisher.clone(),
    )
    .with_clock(fixed_clock);

    let report = monitor.scan_once().await.unwrap();
    assert_eq!(
        report,
        ScanReport {
            matched: 3,
            admitted: 3,
            published: 2,
            publish_failures: 1,
            registry_size: 3,
        }
    );
    assert_eq!(
        publisher.titles(),
        vec!["SAM.gov: Notice A", "SAM.gov: Notice B", "SAM.gov: Notice C"]
    );

    // B is not retried on the next cycle
    let again = monitor.scan_once().await.unwrap();
    assert_eq!(again.admitted, 0);
    assert_eq!(publisher.attempts(), 3);
}

#[tokio::test]
async fn unidentified_listing_is_never_published() {
    let mut anon = listing("", "332992", "Sources Sought");
    anon.notice_id = None;
    let source = Arc::new(FakeSource::new(vec![anon]));
    let publisher = Arc::new(RecordingPublisher::default());
    let mut monitor = Monitor::new(
        settings(90),
        source,
        TitleGenerator::new(Arc::new(DisabledClient)),
        publisher.clone(),
    )
    .with_clock(fixed_clock);

    let report = monitor.scan_once().await.unwrap();
    assert_eq!(report.matched, 1);
    assert_eq!(report.admitted, 0);
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn unrepresentable_window_fails_the_scan() {
    let source = Arc::new(FakeSource::new(vec![]));
    let mut monitor = Monitor::new(
        settings(u32::MAX),
        source.clone(),
        TitleGenerator::new(Arc::new(DisabledClient)),
        Arc::new(RecordingPublisher::default()),
    )
    .with_clock(fixed_clock);

    assert!(monitor.scan_once().await.is_err());
    assert_eq!(source.search_count(), 0);
}

#[tokio::test]
async fn failed_scan_still_waits_and_loop_continues_until_shutdown() {
    let source = Arc::new(FakeSource::new(vec![]));
    let sleeper = InstantSleeper::default();
    let slept = sleeper.slept.clone();
    let mut monitor = Monitor::new(
        settings(u32::MAX),
        source,
        TitleGenerator::new(Arc::new(DisabledClient)),
        Arc::new(RecordingPublisher::default()),
    )
    .with_clock(fixed_clock)
    .with_sleeper(sleeper);

    let watcher = slept.clone();
    // stop during the third wait
    let shutdown = async move {
        while watcher.lock().len() < 3 {
            tokio::task::yield_now().await;
        }
    };

    tokio::time::timeout(Duration::from_secs(5), monitor.run(shutdown))
        .await
        .expect("run returns after shutdown");

    let waits = slept.lock().clone();
    assert!(waits.len() >= 3);
    assert!(waits.iter().all(|d| *d == Duration::from_secs(3600)));
}

#[tokio::test]
async fn shutdown_before_first_scan_stops_immediately() {
    let source = Arc::new(FakeSource::new(vec![listing("N1", "332992", "Sources Sought")]));
    let publisher = Arc::new(RecordingPublisher::default());
    let mut monitor = Monitor::new(
        settings(90),
        source.clone(),
        TitleGenerator::new(Arc::new(DisabledClient)),
        publisher.clone(),
    )
    .with_sleeper(InstantSleeper::default());

    monitor.run(async {}).await;

    assert_eq!(source.search_count(), 0);
    assert_eq!(publisher.attempts(), 0);
}

#[tokio::test]
async fn scans_repeat_between_waits() {
    let source = Arc::new(FakeSource::new(vec![listing("N1", "332992", "Sources Sought")]));
    let publisher = Arc::new(RecordingPublisher::default());
    let sleeper = InstantSleeper::default();
    let slept = sleeper.slept.clone();
    let mut monitor = Monitor::new(
        settings(90),
        source.clone(),
        TitleGenerator::new(Arc::new(DisabledClient)),
        publisher.clone(),
    )
    .with_clock(fixed_clock)
    .with_sleeper(sleeper);

    let watcher = slept.clone();
    let shutdown = async move {
        while watcher.lock().len() < 2 {
            tokio::task::yield_now().await;
        }
    };
    tokio::time::timeout(Duration::from_secs(5), monitor.run(shutdown))
        .await
        .expect("run returns after shutdown");

    assert!(source.search_count() >= 2);
    assert_eq!(publisher.attempts(), 1, "second scan finds nothing new");
}
