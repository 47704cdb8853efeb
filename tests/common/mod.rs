// tests/common/mod.rs
//
// Shared fakes and an in-process HTTP server for integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use sam_opportunity_monitor::ai_adapter::TitleModel;
use sam_opportunity_monitor::ingest::types::{DetailError, Listing, ListingSource, SearchWindow};
use sam_opportunity_monitor::monitor::Sleeper;
use sam_opportunity_monitor::notify::{CreatedIssue, IssueDraft, IssuePublisher, PublishError};

/// Serve `router` on an ephemeral localhost port; returns `http://127.0.0.1:PORT`.
pub async fn spawn(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

pub fn listing(id: &str, naics: &str, kind: &str) -> Listing {
    Listing {
        notice_id: Some(id.to_string()),
        title: Some(format!("Notice {id}")),
        notice_type: Some(kind.to_string()),
        naics_code: Some(naics.to_string()),
        ..Listing::default()
    }
}

/// Returns the same listings for every code it is asked about.
pub struct FakeSource {
    pub listings: Vec<Listing>,
    pub fail_codes: HashSet<String>,
    pub searches: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            fail_codes: HashSet::new(),
            searches: Mutex::new(Vec::new()),
        }
    }

    pub fn search_count(&self) -> usize {
        self.searches.lock().len()
    }
}

#[async_trait::async_trait]
impl ListingSource for FakeSource {
    async fn search(&self, naics: &str, _window: SearchWindow) -> Result<Vec<Listing>> {
        self.searches.lock().push(naics.to_string());
        if self.fail_codes.contains(naics) {
            return Err(anyhow!("search for {naics} failed"));
        }
        Ok(self.listings.clone())
    }

    async fn fetch_details(&self, _listing: &Listing) -> Result<String, DetailError> {
        Ok("Detail body".to_string())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Counts prompts and answers with a fixed title.
pub struct CountingModel {
    pub reply: String,
    pub calls: Mutex<usize>,
}

impl CountingModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

impl TitleModel for CountingModel {
    fn complete<'a>(
        &'a self,
        _prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        *self.calls.lock() += 1;
        let out = self.reply.clone();
        Box::pin(async move { Ok(out) })
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// Records every draft; attempts listed in `fail_on` (1-based) get a 500.
#[derive(Default)]
pub struct RecordingPublisher {
    pub fail_on: HashSet<usize>,
    pub drafts: Mutex<Vec<IssueDraft>>,
}

impl RecordingPublisher {
    pub fn failing_on(attempts: &[usize]) -> Self {
        Self {
            fail_on: attempts.iter().copied().collect(),
            drafts: Mutex::new(Vec::new()),
        }
    }

    pub fn attempts(&self) -> usize {
        self.drafts.lock().len()
    }

    pub fn titles(&self) -> Vec<String> {
        self.drafts.lock().iter().map(|d| d.title.clone()).collect()
    }
}

#[async_trait::async_trait]
impl IssuePublisher for RecordingPublisher {
    async fn try_publish(&self, draft: &IssueDraft) -> Result<CreatedIssue, PublishError> {
        let attempt = {
            let mut drafts = self.drafts.lock();
            drafts.push(draft.clone());
            drafts.len()
        };
        if self.fail_on.contains(&attempt) {
            return Err(PublishError::Status {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(CreatedIssue {
            id: format!("id-{attempt}"),
            identifier: format!("SAM-{attempt}"),
            title: draft.title.clone(),
            url: format!("https://linear.app/test/issue/SAM-{attempt}"),
        })
    }
}

/// Returns at once and remembers the requested durations.
#[derive(Clone, Default)]
pub struct InstantSleeper {
    pub slept: Arc<Mutex<Vec<Duration>>>,
}

#[async_trait::async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().push(duration);
        tokio::task::yield_now().await;
    }
}
