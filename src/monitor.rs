//! Scan orchestrator: scanning → waiting, until shutdown.
//!
//! One scan queries the source for every configured code, admits new
//! listings into the registry, then titles and publishes each new listing
//! in order. Nothing runs concurrently.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use metrics::{counter, gauge};
use serde::Serialize;
use tracing::{error, info};

use crate::config::monitor::Operational;
use crate::ingest::types::{Listing, ListingSource, SearchWindow};
use crate::ingest::{collect_listings, detail_text};
use crate::notify::render::{office_location, performance_location};
use crate::notify::IssuePublisher;
use crate::registry::SeenRegistry;
use crate::title::TitleGenerator;

/// Waiting between scans. Swapped out in tests.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

pub type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub naics_codes: Vec<String>,
    pub notice_types: Vec<String>,
    pub scan_interval: Duration,
    pub lookback_days: u32,
}

impl From<&Operational> for MonitorSettings {
    fn from(op: &Operational) -> Self {
        Self {
            naics_codes: op.naics_codes.clone(),
            notice_types: op.notice_types.clone(),
            scan_interval: op.scan_interval(),
            lookback_days: op.lookback_days,
        }
    }
}

/// Counts for one completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub matched: usize,
    pub admitted: usize,
    pub published: usize,
    pub publish_failures: usize,
    pub registry_size: usize,
}

pub struct Monitor {
    settings: MonitorSettings,
    source: Arc<dyn ListingSource>,
    titles: TitleGenerator,
    publisher: Arc<dyn IssuePublisher>,
    registry: SeenRegistry,
    sleeper: Box<dyn Sleeper>,
    clock: Clock,
}

impl Monitor {
    pub fn new(
        settings: MonitorSettings,
        source: Arc<dyn ListingSource>,
        titles: TitleGenerator,
        publisher: Arc<dyn IssuePublisher>,
    ) -> Self {
        Self {
            settings,
            source,
            titles,
            publisher,
            registry: SeenRegistry::new(),
            sleeper: Box::new(TokioSleeper),
            clock: Box::new(Local::now),
        }
    }

    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn registry(&self) -> &SeenRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// One pass over every configured code.
    ///
    /// Source, detail, title and publish failures are absorbed along the way;
    /// an `Err` means the scan could not start at all.
    pub async fn scan_once(&mut self) -> Result<ScanReport> {
        let now = (self.clock)();
        let window = SearchWindow::trailing(now.date_naive(), self.settings.lookback_days)
            .ok_or_else(|| {
                anyhow!(
                    "lookback of {} days before {} is out of range",
                    self.settings.lookback_days,
                    now.date_naive()
                )
            })?;

        info!(
            from = %window.from_param(),
            to = %window.to_param(),
            codes = self.settings.naics_codes.len(),
            "checking SAM.gov for new opportunities"
        );

        let matched = collect_listings(
            self.source.as_ref(),
            &self.settings.naics_codes,
            &self.settings.notice_types,
            window,
        )
        .await;
        let matched_count = matched.len();

        let fresh = self.registry.admit(matched);
        counter!("sam_listings_admitted_total").increment(fresh.len() as u64);
        gauge!("registry_size").set(self.registry.size() as f64);

        let mut report = ScanReport {
            matched: matched_count,
            admitted: fresh.len(),
            ..ScanReport::default()
        };

        for listing in &fresh {
            self.log_listing(listing).await;
            let title = self.titles.generate(listing).await;
            match self.publisher.publish(listing, &title).await {
                Some(issue) => {
                    report.published += 1;
                    info!(
                        uid = listing.uid().unwrap_or_default(),
                        identifier = %issue.identifier,
                        url = %issue.url,
                        "issue created for listing"
                    );
                }
                None => {
                    report.publish_failures += 1;
                    error!(
                        uid = listing.uid().unwrap_or_default(),
                        %title,
                        "no issue created for listing"
                    );
                }
            }
        }

        report.registry_size = self.registry.size();
        gauge!("scan_last_run_ts").set((self.clock)().timestamp() as f64);
        info!(
            matched = report.matched,
            new = report.admitted,
            published = report.published,
            failed = report.publish_failures,
            total_tracked = report.registry_size,
            "scan complete"
        );
        Ok(report)
    }

    async fn log_listing(&self, listing: &Listing) {
        let detail = detail_text(self.source.as_ref(), listing).await;
        let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "N/A".to_string());
        info!(
            uid = listing.uid().unwrap_or_default(),
            title = listing.title_or_default(),
            solicitation = %or_na(&listing.solicitation_number),
            notice_type = %or_na(&listing.notice_type),
            naics = %or_na(&listing.naics_code),
            set_aside = %or_na(&listing.set_aside),
            posted = %or_na(&listing.posted_date),
            deadline = %or_na(&listing.response_deadline),
            organization = %or_na(&listing.full_parent_path_name),
            office = %office_location(listing),
            performance = %performance_location(listing),
            link = %or_na(&listing.ui_link),
            %detail,
            "new opportunity"
        );
    }

    /// Scan, wait, repeat until `shutdown` resolves.
    ///
    /// A failed scan is logged and followed by the regular wait. Shutdown
    /// abandons an in-flight scan or wait.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            codes = ?self.settings.naics_codes,
            notice_types = ?self.settings.notice_types,
            interval_secs = self.settings.scan_interval.as_secs(),
            lookback_days = self.settings.lookback_days,
            tracked = self.registry.size(),
            ai_titles = self.titles.ai_enabled(),
            "SAM.gov monitor started"
        );

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                res = self.scan_once() => {
                    if let Err(e) = res {
                        error!(error = ?e, "scan failed");
                    }
                }
            }

            let interval = self.settings.scan_interval;
            info!(secs = interval.as_secs(), "waiting for next scan");
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.sleeper.sleep(interval) => {}
            }
        }

        info!(tracked = self.registry.size(), "SAM.gov monitor stopped");
    }
}
