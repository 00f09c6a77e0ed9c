//! Core types for media-harvester

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Numeric identifier of a remote resource page
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Create a new ResourceId
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner u64 value
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl From<u64> for ResourceId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ResourceId> for u64 {
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl PartialEq<u64> for ResourceId {
    fn eq(&self, other: &u64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ResourceId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Closed, descending range of resource IDs: `start` down to `end`, inclusive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdRange {
    start: u64,
    end: u64,
}

impl IdRange {
    /// Build a range walked from `start` down to `end`
    ///
    /// # Errors
    /// Returns a configuration error when either bound is zero or when
    /// `end` is greater than `start`.
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start == 0 || end == 0 {
            return Err(Error::config("range", "resource IDs must be positive"));
        }
        if end > start {
            return Err(Error::config(
                "range",
                format!("end ID {end} is greater than start ID {start}"),
            ));
        }
        Ok(Self { start, end })
    }

    /// First ID visited
    pub fn start(&self) -> ResourceId {
        ResourceId(self.start)
    }

    /// Last ID visited
    pub fn end(&self) -> ResourceId {
        ResourceId(self.end)
    }

    /// Number of IDs in the range
    pub fn len(&self) -> u64 {
        self.start - self.end + 1
    }

    /// Always false; a valid range holds at least one ID
    pub fn is_empty(&self) -> bool {
        false
    }

    /// IDs in visiting order (descending)
    pub fn iter(&self) -> impl Iterator<Item = ResourceId> + use<> {
        let (start, end) = (self.start, self.end);
        (end..=start).rev().map(ResourceId)
    }
}

/// Kind of media a page can reference
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// MP4 video
    Video,
    /// Still image (jpg, jpeg, png, gif, bmp)
    Image,
}

impl MediaKind {
    /// Lowercase label used in logs and reports
    pub fn label(self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Image => "image",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Best-effort data pulled out of one resource page
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Human-readable resource name, if the page carries one
    pub name: Option<String>,
    /// Normalized video URL
    pub video_url: Option<String>,
    /// Normalized image URL
    pub image_url: Option<String>,
}

impl ExtractionResult {
    /// True when at least one media URL was found
    pub fn has_media(&self) -> bool {
        self.video_url.is_some() || self.image_url.is_some()
    }

    /// Found media in download order: video first, then image
    pub fn media(&self) -> Vec<(MediaKind, &str)> {
        let mut media = Vec::with_capacity(2);
        if let Some(url) = &self.video_url {
            media.push((MediaKind::Video, url.as_str()));
        }
        if let Some(url) = &self.image_url {
            media.push((MediaKind::Image, url.as_str()));
        }
        media
    }
}

/// One media file that ended up on disk for a resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedMedia {
    /// Video or image
    pub kind: MediaKind,
    /// Local file path
    pub path: PathBuf,
    /// URL the file was (or would have been) downloaded from
    pub source_url: String,
    /// File size on disk
    pub bytes: u64,
    /// The file already existed and no request was made
    pub reused_existing: bool,
}

/// Details of a resource that produced at least one file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuccessRecord {
    /// Resource ID
    pub id: ResourceId,
    /// Sanitized resource name used for filenames
    pub name: String,
    /// Files saved for this resource
    pub media: Vec<SavedMedia>,
    /// Media that were found on the page but could not be downloaded
    pub missing: Vec<MediaKind>,
}

/// Final classification of one processed resource
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// At least one media file is on disk
    Success(SuccessRecord),
    /// The page loaded but referenced no usable media
    NoMedia {
        /// Resource ID
        id: ResourceId,
    },
    /// Page fetch or every download failed
    Failed {
        /// Resource ID
        id: ResourceId,
        /// Why the resource failed
        reason: String,
    },
}

impl DownloadOutcome {
    /// Resource the outcome belongs to
    pub fn id(&self) -> ResourceId {
        match self {
            DownloadOutcome::Success(record) => record.id,
            DownloadOutcome::NoMedia { id } | DownloadOutcome::Failed { id, .. } => *id,
        }
    }

    /// Short lowercase label ("success", "no_media", "failed")
    pub fn label(&self) -> &'static str {
        match self {
            DownloadOutcome::Success(_) => "success",
            DownloadOutcome::NoMedia { .. } => "no_media",
            DownloadOutcome::Failed { .. } => "failed",
        }
    }
}

/// Accumulated outcomes of one run
///
/// The three sequences are disjoint and keep insertion order. They are only
/// changed through [`BatchState::record`] and [`BatchState::take_failed`].
#[derive(Clone, Debug, Default)]
pub struct BatchState {
    successes: Vec<SuccessRecord>,
    no_media: Vec<ResourceId>,
    failed: Vec<ResourceId>,
}

impl BatchState {
    /// File an outcome, keeping each ID in at most one sequence
    ///
    /// An ID can move up (failed to no-media or success, no-media to
    /// success) but never down: a later `Failed` for an ID that already
    /// succeeded or had no media is ignored. A repeated success replaces the
    /// earlier record in place.
    pub fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Success(record) => {
                let id = record.id;
                self.failed.retain(|failed| *failed != id);
                self.no_media.retain(|no_media| *no_media != id);
                match self.successes.iter_mut().find(|s| s.id == id) {
                    Some(existing) => *existing = record,
                    None => self.successes.push(record),
                }
            }
            DownloadOutcome::NoMedia { id } => {
                if self.has_succeeded(id) {
                    return;
                }
                self.failed.retain(|failed| *failed != id);
                if !self.no_media.contains(&id) {
                    self.no_media.push(id);
                }
            }
            DownloadOutcome::Failed { id, .. } => {
                if self.has_succeeded(id) || self.no_media.contains(&id) {
                    return;
                }
                if !self.failed.contains(&id) {
                    self.failed.push(id);
                }
            }
        }
    }

    fn has_succeeded(&self, id: ResourceId) -> bool {
        self.successes.iter().any(|s| s.id == id)
    }

    /// Remove and return the current failure list (used by retry passes)
    pub fn take_failed(&mut self) -> Vec<ResourceId> {
        std::mem::take(&mut self.failed)
    }

    /// Successful resources in processing order
    pub fn successes(&self) -> &[SuccessRecord] {
        &self.successes
    }

    /// Resources whose pages had no media
    pub fn no_media(&self) -> &[ResourceId] {
        &self.no_media
    }

    /// Resources that failed
    pub fn failed(&self) -> &[ResourceId] {
        &self.failed
    }

    /// Total number of classified resources
    pub fn total(&self) -> usize {
        self.successes.len() + self.no_media.len() + self.failed.len()
    }
}

/// A single media transfer: where from, where to, and how big it should be
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTarget {
    /// URL to GET
    pub remote_url: String,
    /// Destination file
    pub local_path: PathBuf,
    /// Expected size; overrides the response Content-Length when set
    pub declared_size: Option<u64>,
}

impl DownloadTarget {
    /// Target without a size hint
    pub fn new(remote_url: impl Into<String>, local_path: impl Into<PathBuf>) -> Self {
        Self {
            remote_url: remote_url.into(),
            local_path: local_path.into(),
            declared_size: None,
        }
    }

    /// Attach an expected size
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }
}

/// Progress notifications emitted while a run is in flight
///
/// Delivered to a [`ProgressObserver`](crate::observer::ProgressObserver);
/// the core never prints on its own.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A range pass is starting
    RunStarted {
        /// First ID
        start: ResourceId,
        /// Last ID
        end: ResourceId,
        /// Number of IDs in the range
        total: u64,
    },

    /// A resource page is being requested
    PageRequested {
        /// Resource ID
        id: ResourceId,
        /// Page URL
        url: String,
    },

    /// Resource name chosen for filenames
    NameResolved {
        /// Resource ID
        id: ResourceId,
        /// Raw (unsanitized) name
        name: String,
        /// False when the name was synthesized because the page had none
        from_page: bool,
    },

    /// A media URL was found on the page
    MediaFound {
        /// Resource ID
        id: ResourceId,
        /// Video or image
        kind: MediaKind,
        /// Normalized URL
        url: String,
    },

    /// The preferred filename was unusable and `<id><ext>` is used instead
    FilenameSimplified {
        /// Resource ID
        id: ResourceId,
        /// Fallback path
        path: PathBuf,
    },

    /// Target file exists; download skipped
    AlreadyExists {
        /// Resource ID
        id: ResourceId,
        /// Video or image
        kind: MediaKind,
        /// Existing file
        path: PathBuf,
        /// Size on disk
        bytes: u64,
    },

    /// A media transfer is starting
    DownloadStarted {
        /// Media URL
        url: String,
        /// Destination file
        path: PathBuf,
    },

    /// Transfer progress (throttled to one event per half second)
    Downloading {
        /// Destination file
        path: PathBuf,
        /// Bytes written so far
        downloaded_bytes: u64,
        /// Declared length, if known
        #[serde(skip_serializing_if = "Option::is_none")]
        total_bytes: Option<u64>,
        /// Progress percentage (0.0 to 100.0), if the length is known
        #[serde(skip_serializing_if = "Option::is_none")]
        percent: Option<f32>,
        /// Average speed since the transfer began, bytes per second
        speed_bps: u64,
    },

    /// A media transfer finished and passed verification
    DownloadComplete {
        /// Destination file
        path: PathBuf,
        /// Bytes on disk
        bytes: u64,
    },

    /// A media transfer failed
    DownloadFailed {
        /// Video or image
        kind: MediaKind,
        /// Media URL
        url: String,
        /// Error message
        error: String,
    },

    /// A resource reached its final classification
    Classified {
        /// Resource ID
        id: ResourceId,
        /// "success", "no_media" or "failed"
        outcome: &'static str,
        /// Failure reason, for failed resources
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Pausing before the next request
    Waiting {
        /// Pause length
        #[serde(with = "crate::config::secs_f64_serde")]
        delay: Duration,
    },

    /// A retry pass is starting
    RetryStarted {
        /// Number of IDs being retried
        count: usize,
    },

    /// A retry pass finished
    RetryFinished {
        /// IDs that succeeded (or turned out to have no media) this time
        recovered: usize,
        /// IDs still failing
        still_failing: usize,
    },
}
