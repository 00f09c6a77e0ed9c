//! Error types for media-harvester
//!
//! Every fallible operation in the crate returns [`Result`]. The batch
//! orchestrator converts per-resource errors into a `Failed` outcome, so
//! these only escape to callers from setup code (configuration, HTTP client
//! construction, report writing).

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ResourceId;

/// Result type alias for media-harvester operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-harvester
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "base_url")
        key: Option<String>,
    },

    /// Resource page answered with something other than HTTP 200
    #[error("page {id} returned HTTP {status}")]
    PageFetch {
        /// The resource whose page could not be fetched
        id: ResourceId,
        /// HTTP status code returned by the server
        status: u16,
    },

    /// Media URL answered with something other than HTTP 200
    #[error("media request {url} returned HTTP {status}")]
    HttpStatus {
        /// The media URL that was requested
        url: String,
        /// HTTP status code returned by the server
        status: u16,
    },

    /// Downloaded file is smaller than 95% of the declared length
    #[error("incomplete download {path}: {actual} of {declared} bytes")]
    DownloadIncomplete {
        /// File that was written (already removed when this is returned)
        path: PathBuf,
        /// Bytes found on disk after the transfer
        actual: u64,
        /// Length advertised by the server or supplied as a size hint
        declared: u64,
    },

    /// Page extractor could not be built (invalid selector or pattern)
    #[error("extractor setup failed: {0}")]
    Extractor(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Whether a later attempt could plausibly succeed
    ///
    /// Used only for log wording; every failed resource is offered to the
    /// retry pass regardless.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect() || e.is_body(),
            Error::PageFetch { status, .. } | Error::HttpStatus { status, .. } => {
                *status == 429 || *status >= 500
            }
            Error::DownloadIncomplete { .. } => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::Interrupted
            ),
            Error::Config { .. }
            | Error::Extractor(_)
            | Error::Serialization(_)
            | Error::Other(_) => false,
        }
    }
}
