//! Media download with progress reporting and size verification

use reqwest::StatusCode;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::http;
use crate::observer::ProgressObserver;
use crate::types::{DownloadTarget, Event};

/// Bodies below this size may be buffered whole when the caller asks for it
pub const SMALL_OBJECT_THRESHOLD: u64 = 10 * 1024 * 1024;

/// Write buffer size for streamed downloads
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Minimum fraction of the declared length that must reach the disk
pub const MIN_COMPLETE_RATIO: f64 = 0.95;

/// Minimum gap between two progress events
const PROGRESS_INTERVAL: Duration = Duration::from_millis(500);

/// Whether `actual` bytes are enough for a transfer that declared `declared`
///
/// A declared length of zero means "unknown" and always passes.
pub fn is_complete(actual: u64, declared: u64) -> bool {
    declared == 0 || actual as f64 >= declared as f64 * MIN_COMPLETE_RATIO
}

/// Downloads single URLs to local files
///
/// Every attempt starts from byte zero; nothing is resumed. On any failure
/// the partially written file is removed before the error is returned.
pub struct MediaFetcher {
    client: reqwest::Client,
    timeout: Duration,
    observer: Arc<dyn ProgressObserver>,
}

impl MediaFetcher {
    /// Create a fetcher sharing the run's HTTP client
    pub fn new(
        client: reqwest::Client,
        timeout: Duration,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            client,
            timeout,
            observer,
        }
    }

    /// Download `target`, returning the number of bytes on disk
    ///
    /// The fetcher's timeout bounds the wait for the response head and for
    /// each body read, not the transfer as a whole.
    ///
    /// With `whole_in_memory` set, bodies declared below
    /// [`SMALL_OBJECT_THRESHOLD`] (or with no declared length) are buffered
    /// and written in one go; everything else is streamed.
    ///
    /// # Errors
    /// - [`Error::HttpStatus`] for any status other than 200 (no file is created)
    /// - [`Error::Network`] / [`Error::Io`] for transport or disk errors
    /// - [`Error::DownloadIncomplete`] when less than 95% of the declared
    ///   length arrived
    pub async fn fetch(&self, target: &DownloadTarget, whole_in_memory: bool) -> Result<u64> {
        let path = target.local_path.as_path();

        let response = http::send(self.client.get(&target.remote_url), self.timeout).await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::HttpStatus {
                url: target.remote_url.clone(),
                status: status.as_u16(),
            });
        }

        let declared = target.declared_size.or(response.content_length());
        debug!(url = %target.remote_url, ?declared, whole_in_memory, "Media response received");

        self.observer.on_progress(&Event::DownloadStarted {
            url: target.remote_url.clone(),
            path: path.to_path_buf(),
        });

        let written = if whole_in_memory && declared.unwrap_or(0) < SMALL_OBJECT_THRESHOLD {
            write_whole(response, path, self.timeout).await
        } else {
            self.stream_to_file(response, path, declared).await
        };

        if let Err(e) = written {
            remove_partial(path).await;
            return Err(e);
        }

        let actual = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                remove_partial(path).await;
                return Err(e.into());
            }
        };

        if let Some(declared) = declared
            && !is_complete(actual, declared)
        {
            remove_partial(path).await;
            return Err(Error::DownloadIncomplete {
                path: path.to_path_buf(),
                actual,
                declared,
            });
        }

        self.observer.on_progress(&Event::DownloadComplete {
            path: path.to_path_buf(),
            bytes: actual,
        });
        Ok(actual)
    }

    async fn stream_to_file(
        &self,
        mut response: reqwest::Response,
        path: &Path,
        declared: Option<u64>,
    ) -> Result<u64> {
        let file = File::create(path).await?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);

        let started = Instant::now();
        let mut last_report: Option<Instant> = None;
        let mut downloaded: u64 = 0;

        while let Some(chunk) = http::within(self.timeout, "media body", response.chunk()).await? {
            writer.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            let now = Instant::now();
            if last_report.is_none_or(|at| now.duration_since(at) >= PROGRESS_INTERVAL) {
                self.report_progress(path, downloaded, declared, now.duration_since(started));
                last_report = Some(now);
            }
        }

        writer.flush().await?;
        writer.into_inner().sync_all().await?;
        Ok(downloaded)
    }

    fn report_progress(&self, path: &Path, downloaded: u64, declared: Option<u64>, elapsed: Duration) {
        let total_bytes = declared.filter(|total| *total > 0);
        let secs = elapsed.as_secs_f64();
        let speed_bps = if secs > 0.0 {
            (downloaded as f64 / secs) as u64
        } else {
            0
        };

        self.observer.on_progress(&Event::Downloading {
            path: path.to_path_buf(),
            downloaded_bytes: downloaded,
            total_bytes,
            percent: total_bytes.map(|total| (downloaded as f64 / total as f64 * 100.0) as f32),
            speed_bps,
        });
    }
}

async fn write_whole(response: reqwest::Response, path: &Path, limit: Duration) -> Result<u64> {
    let body = http::read_body(response, limit).await?;
    tokio::fs::write(path, &body).await?;
    Ok(body.len() as u64)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await
        && e.kind() != std::io::ErrorKind::NotFound
    {
        warn!(path = %path.display(), error = %e, "Could not remove partial download");
    }
}
