//! # media-harvester
//!
//! Sequential batch harvester for a public resource site. Each resource lives
//! on its own page addressed by a numeric ID; the harvester walks a
//! descending ID range, pulls the resource name and media URLs (MP4 video,
//! images) out of every page, downloads the media with size verification and
//! classifies each ID as success, no-media or failed.
//!
//! ## Design
//!
//! - **Sequential** - One request at a time with a randomized pause between
//!   IDs; nothing runs in parallel
//! - **Idempotent** - Files already on disk are reused, so an interrupted
//!   batch can simply be started again
//! - **Never aborts** - Per-ID errors become a `Failed` outcome that a retry
//!   pass can pick up
//! - **Observable** - Progress is delivered as [`Event`]s to a
//!   [`ProgressObserver`]; the library itself never prints
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_harvester::{Config, Harvester, IdRange};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output_dir: "downloads".into(),
//!         ..Default::default()
//!     };
//!
//!     let (events, mut rx) = tokio::sync::broadcast::channel(1000);
//!     tokio::spawn(async move {
//!         while let Ok(event) = rx.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let mut harvester = Harvester::new(config)?.with_observer(Arc::new(events));
//!     harvester.run_range(IdRange::new(141150, 141100)?).await;
//!     if !harvester.state().failed().is_empty() {
//!         harvester.retry_failed().await;
//!     }
//!
//!     let report = std::path::Path::new("download_report.txt");
//!     media_harvester::write_report(harvester.state(), report).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Page parsing: resource name and media URLs
pub mod extract;
/// Single-URL media download with verification
pub mod fetcher;
/// Batch orchestration (decomposed into focused submodules)
pub mod harvester;
/// Shared HTTP session
pub mod http;
/// Progress observers
pub mod observer;
/// Run report and console summary
pub mod report;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Capabilities, Config, HttpConfig, Pacing};
pub use error::{Error, Result};
pub use extract::PageExtractor;
pub use fetcher::MediaFetcher;
pub use harvester::{Harvester, RetryStats, RunStats};
pub use observer::{NoopObserver, ProgressObserver, TracingObserver};
pub use report::{render_report, render_summary, write_report};
pub use types::{
    BatchState, DownloadOutcome, DownloadTarget, Event, ExtractionResult, IdRange, MediaKind,
    ResourceId, SavedMedia, SuccessRecord,
};
pub use utils::{normalize_url, sanitize_filename};
