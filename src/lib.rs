// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod config;
pub mod ingest;
pub mod metrics;
pub mod monitor;
pub mod notify;
pub mod registry;
pub mod title;

// ---- Re-exports for stable public API ----
pub use crate::ingest::types::{Listing, ListingSource, SearchWindow};
pub use crate::monitor::{Monitor, MonitorSettings, ScanReport};
pub use crate::notify::{CreatedIssue, IssuePublisher};
pub use crate::registry::SeenRegistry;
pub use crate::title::ai_adapter;
pub use crate::title::TitleGenerator;
