pub mod linear;
pub mod render;

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::ingest::types::Listing;

/// Linear scale: 1 urgent, 2 high, 3 medium, 4 low.
pub const DEFAULT_PRIORITY: u8 = 3;

/// Confirmation fields read back after an issue is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub id: String,
    pub identifier: String,
    pub title: String,
    pub url: String,
}

/// Request sent for one newly discovered listing.
#[derive(Debug, Clone)]
pub struct IssueDraft {
    pub title: String,
    pub description: String,
    pub priority: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("issue request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("issue API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("GraphQL errors: {0}")]
    GraphQl(String),
    #[error("issue creation was not successful")]
    Unsuccessful,
    #[error("malformed issue response: {0}")]
    Malformed(String),
}

#[async_trait::async_trait]
pub trait IssuePublisher: Send + Sync {
    async fn try_publish(&self, draft: &IssueDraft) -> Result<CreatedIssue, PublishError>;

    fn priority(&self) -> u8 {
        DEFAULT_PRIORITY
    }

    /// Render the listing and submit it once. Failures are logged and
    /// reported as `None`; there is no retry.
    async fn publish(&self, listing: &Listing, title: &str) -> Option<CreatedIssue> {
        let draft = IssueDraft {
            title: title.to_string(),
            description: render::render_description(listing, Local::now().naive_local()),
            priority: self.priority(),
        };
        match self.try_publish(&draft).await {
            Ok(issue) => {
                tracing::info!(
                    identifier = %issue.identifier,
                    title = %issue.title,
                    url = %issue.url,
                    "created issue"
                );
                metrics::counter!("issues_created_total").increment(1);
                Some(issue)
            }
            Err(e) => {
                tracing::error!(error = %e, title = %draft.title, "failed to create issue");
                metrics::counter!("issue_publish_errors_total").increment(1);
                None
            }
        }
    }
}
