//! Progress observers
//!
//! The harvester reports everything it does through [`ProgressObserver`].
//! Two implementations ship with the crate: [`TracingObserver`] turns events
//! into log lines, and a `tokio::sync::broadcast::Sender<Event>` forwards
//! them to any number of subscribers.

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::types::Event;

/// Receives progress events from the harvester and the media fetcher
pub trait ProgressObserver: Send + Sync {
    /// Called once per event, in order, on the harvesting task
    fn on_progress(&self, event: &Event);
}

/// Observer that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ProgressObserver for NoopObserver {
    fn on_progress(&self, _event: &Event) {}
}

impl ProgressObserver for broadcast::Sender<Event> {
    fn on_progress(&self, event: &Event) {
        // No subscribers is fine
        let _ = self.send(event.clone());
    }
}

/// Observer that logs every event through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ProgressObserver for TracingObserver {
    fn on_progress(&self, event: &Event) {
        match event {
            Event::RunStarted { start, end, total } => {
                info!(%start, %end, total, "Starting batch");
            }
            Event::PageRequested { id, url } => info!(%id, %url, "Fetching resource page"),
            Event::NameResolved {
                id,
                name,
                from_page,
            } => {
                if *from_page {
                    info!(%id, %name, "Resource name");
                } else {
                    warn!(%id, %name, "Page has no resource name, using fallback");
                }
            }
            Event::MediaFound { id, kind, url } => info!(%id, %kind, %url, "Media found"),
            Event::FilenameSimplified { id, path } => {
                warn!(%id, path = %path.display(), "Filename unusable, simplified");
            }
            Event::AlreadyExists {
                id,
                kind,
                path,
                bytes,
            } => {
                info!(%id, %kind, path = %path.display(), bytes, "Already downloaded, skipping");
            }
            Event::DownloadStarted { url, path } => {
                info!(%url, path = %path.display(), "Downloading");
            }
            Event::Downloading {
                path,
                downloaded_bytes,
                percent,
                speed_bps,
                ..
            } => {
                debug!(
                    path = %path.display(),
                    downloaded_bytes,
                    percent = percent.unwrap_or(0.0),
                    speed_bps,
                    "Download progress"
                );
            }
            Event::DownloadComplete { path, bytes } => {
                info!(path = %path.display(), bytes, "Download complete");
            }
            Event::DownloadFailed { kind, url, error } => {
                warn!(%kind, %url, %error, "Download failed");
            }
            Event::Classified {
                id,
                outcome,
                reason,
            } => match reason {
                Some(reason) => warn!(%id, outcome, %reason, "Resource classified"),
                None => info!(%id, outcome, "Resource classified"),
            },
            Event::Waiting { delay } => {
                debug!(delay_secs = delay.as_secs_f64(), "Waiting before next request");
            }
            Event::RetryStarted { count } => info!(count, "Retrying failed resources"),
            Event::RetryFinished {
                recovered,
                still_failing,
            } => info!(recovered, still_failing, "Retry pass finished"),
        }
    }
}
