//! Batch orchestration split into focused submodules.
//!
//! [`Harvester`] walks a range of resource IDs one at a time and classifies
//! each as success, no-media or failed:
//! - [`page`] - Resource page fetch and debug dumps
//! - [`media`] - Target filenames, existing-file reuse and media downloads
//!
//! Per-resource errors never escape: they are logged, reported through the
//! observer and recorded as `Failed`, so a batch always runs to the end.

mod media;
mod page;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{Config, Pacing};
use crate::error::{Error, Result};
use crate::extract::PageExtractor;
use crate::fetcher::MediaFetcher;
use crate::http::build_client;
use crate::observer::{ProgressObserver, TracingObserver};
use crate::types::{
    BatchState, DownloadOutcome, Event, ExtractionResult, IdRange, ResourceId, SuccessRecord,
};
use crate::utils::{sanitize_filename, url_file_stem};

/// Counts for one range pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// IDs processed
    pub attempted: usize,
    /// IDs with at least one saved file
    pub succeeded: usize,
    /// IDs whose page had no media
    pub no_media: usize,
    /// IDs that failed
    pub failed: usize,
}

impl RunStats {
    fn count(&mut self, outcome: &DownloadOutcome) {
        self.attempted += 1;
        match outcome {
            DownloadOutcome::Success(_) => self.succeeded += 1,
            DownloadOutcome::NoMedia { .. } => self.no_media += 1,
            DownloadOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Counts for one retry pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RetryStats {
    /// IDs taken from the failure list
    pub attempted: usize,
    /// IDs that are no longer failing
    pub recovered: usize,
    /// IDs that failed again
    pub still_failing: usize,
}

/// Sequential media harvester
///
/// Owns the HTTP session, the extractor and the accumulated [`BatchState`].
/// One instance serves one run: a range pass optionally followed by retry
/// passes.
pub struct Harvester {
    config: Arc<Config>,
    client: reqwest::Client,
    extractor: PageExtractor,
    fetcher: MediaFetcher,
    observer: Arc<dyn ProgressObserver>,
    state: BatchState,
}

impl Harvester {
    /// Validate the configuration and set up the HTTP session
    ///
    /// Events go to a [`TracingObserver`] until [`with_observer`](Self::with_observer)
    /// replaces it.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let client = build_client(&config.http)?;
        let extractor = PageExtractor::new(config.capabilities)?;
        let observer: Arc<dyn ProgressObserver> = Arc::new(TracingObserver);
        let fetcher = MediaFetcher::new(
            client.clone(),
            config.http.media_timeout,
            Arc::clone(&observer),
        );

        Ok(Self {
            config: Arc::new(config),
            client,
            extractor,
            fetcher,
            observer,
            state: BatchState::default(),
        })
    }

    /// Send progress events to `observer` instead
    pub fn with_observer(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.fetcher = MediaFetcher::new(
            self.client.clone(),
            self.config.http.media_timeout,
            Arc::clone(&observer),
        );
        self.observer = observer;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Outcomes recorded so far
    pub fn state(&self) -> &BatchState {
        &self.state
    }

    /// Consume the harvester and keep its outcomes
    pub fn into_state(self) -> BatchState {
        self.state
    }

    /// Process every ID of `range`, from start down to end
    ///
    /// Outcomes are recorded in [`state`](Self::state); the returned counts
    /// cover this pass only.
    pub async fn run_range(&mut self, range: IdRange) -> RunStats {
        self.observer.on_progress(&Event::RunStarted {
            start: range.start(),
            end: range.end(),
            total: range.len(),
        });

        let mut stats = RunStats::default();
        for (index, id) in range.iter().enumerate() {
            if index > 0 {
                self.pause(self.config.pacing).await;
            }
            let outcome = self.process_id(id).await;
            stats.count(&outcome);
            self.state.record(outcome);
        }
        stats
    }

    /// Process the current failure list again, in order
    ///
    /// Afterwards the failure list holds exactly the IDs that failed again.
    pub async fn retry_failed(&mut self) -> RetryStats {
        let ids = self.state.take_failed();
        self.observer
            .on_progress(&Event::RetryStarted { count: ids.len() });

        let mut stats = RetryStats {
            attempted: ids.len(),
            ..Default::default()
        };
        for (index, id) in ids.into_iter().enumerate() {
            if index > 0 {
                self.pause(self.config.retry_pacing).await;
            }
            let outcome = self.process_id(id).await;
            if matches!(outcome, DownloadOutcome::Failed { .. }) {
                stats.still_failing += 1;
            } else {
                stats.recovered += 1;
            }
            self.state.record(outcome);
        }

        self.observer.on_progress(&Event::RetryFinished {
            recovered: stats.recovered,
            still_failing: stats.still_failing,
        });
        stats
    }

    /// Fetch, extract and download one resource
    ///
    /// Never fails: errors become [`DownloadOutcome::Failed`]. The outcome is
    /// not recorded in the batch state.
    pub async fn process_id(&self, id: ResourceId) -> DownloadOutcome {
        let outcome = match self.try_process(id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(%id, error = %e, transient = e.is_transient(), "Resource failed");
                DownloadOutcome::Failed {
                    id,
                    reason: e.to_string(),
                }
            }
        };

        let reason = match &outcome {
            DownloadOutcome::Failed { reason, .. } => Some(reason.clone()),
            _ => None,
        };
        self.observer.on_progress(&Event::Classified {
            id,
            outcome: outcome.label(),
            reason,
        });
        outcome
    }

    async fn try_process(&self, id: ResourceId) -> Result<DownloadOutcome> {
        let html = self.fetch_page(id).await?;
        let extraction = self.extractor.extract(&html);

        let media = extraction.media();
        if media.is_empty() {
            debug!(%id, "No media on page");
            return Ok(DownloadOutcome::NoMedia { id });
        }
        for (kind, url) in &media {
            self.observer.on_progress(&Event::MediaFound {
                id,
                kind: *kind,
                url: url.to_string(),
            });
        }

        let (raw_name, from_page) = self.resolve_name(id, &extraction);
        self.observer.on_progress(&Event::NameResolved {
            id,
            name: raw_name.clone(),
            from_page,
        });
        let name = sanitize_filename(&raw_name);

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        let mut saved = Vec::with_capacity(media.len());
        let mut missing = Vec::new();
        let mut last_error = None;
        for (kind, url) in media {
            match self.save_media(id, &name, kind, url).await {
                Ok(file) => saved.push(file),
                Err(e) => {
                    self.observer.on_progress(&Event::DownloadFailed {
                        kind,
                        url: url.to_string(),
                        error: e.to_string(),
                    });
                    missing.push(kind);
                    last_error = Some(e);
                }
            }
        }

        if saved.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| Error::Other(format!("no media saved for resource {id}"))));
        }
        if !missing.is_empty() {
            warn!(%id, ?missing, "Saved some media but not all");
        }

        Ok(DownloadOutcome::Success(SuccessRecord {
            id,
            name,
            media: saved,
            missing,
        }))
    }

    /// Name used for filenames, and whether it came from the page
    fn resolve_name(&self, id: ResourceId, extraction: &ExtractionResult) -> (String, bool) {
        if let Some(name) = &extraction.name {
            return (name.clone(), true);
        }

        let caps = self.extractor.capabilities();
        if caps.video
            && !caps.image
            && let Some(stem) = extraction.video_url.as_deref().and_then(url_file_stem)
        {
            return (stem, false);
        }

        (format!("resource_{id}"), false)
    }

    async fn pause(&self, pacing: Pacing) {
        let delay = pacing.sample();
        if delay.is_zero() {
            return;
        }
        self.observer.on_progress(&Event::Waiting { delay });
        tokio::time::sleep(delay).await;
    }
}
