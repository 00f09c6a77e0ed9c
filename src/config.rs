//! Configuration types for media-harvester

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Which media kinds the extractor looks for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Extract and download `.mp4` videos (default: true)
    #[serde(default = "default_true")]
    pub video: bool,

    /// Extract and download images (default: true)
    #[serde(default = "default_true")]
    pub image: bool,
}

impl Capabilities {
    /// Videos only
    pub fn video_only() -> Self {
        Self {
            video: true,
            image: false,
        }
    }

    /// Images only
    pub fn image_only() -> Self {
        Self {
            video: false,
            image: true,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            video: true,
            image: true,
        }
    }
}

/// Delay inserted between consecutive requests
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pacing {
    /// Always wait the same amount of time
    Fixed(#[serde(with = "secs_f64_serde")] Duration),

    /// Wait a duration drawn uniformly from `[min, max]`
    Uniform {
        /// Shortest pause
        #[serde(with = "secs_f64_serde")]
        min: Duration,
        /// Longest pause
        #[serde(with = "secs_f64_serde")]
        max: Duration,
    },
}

impl Pacing {
    /// Uniform pacing between two whole-second bounds
    pub fn uniform_secs(min: u64, max: u64) -> Self {
        Pacing::Uniform {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    /// Pick the next pause length
    pub fn sample(&self) -> Duration {
        match *self {
            Pacing::Fixed(delay) => delay,
            Pacing::Uniform { min, max } if min >= max => min,
            Pacing::Uniform { min, max } => {
                let secs = rand::thread_rng().gen_range(min.as_secs_f64()..=max.as_secs_f64());
                Duration::from_secs_f64(secs)
            }
        }
    }

    fn validate(&self, key: &str) -> Result<()> {
        if let Pacing::Uniform { min, max } = self
            && min > max
        {
            return Err(Error::config(
                key,
                format!(
                    "minimum delay {:.1}s exceeds maximum {:.1}s",
                    min.as_secs_f64(),
                    max.as_secs_f64()
                ),
            ));
        }
        Ok(())
    }
}

/// Request headers and timeouts shared by every request of a run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Accept header
    #[serde(default = "default_accept")]
    pub accept: String,

    /// Accept-Language header
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Referer header
    #[serde(default = "default_referer")]
    pub referer: String,

    /// Timeout for resource page requests (default: 30 seconds)
    #[serde(default = "default_page_timeout", with = "secs_f64_serde")]
    pub page_timeout: Duration,

    /// Timeout for media requests (default: 60 seconds)
    #[serde(default = "default_media_timeout", with = "secs_f64_serde")]
    pub media_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            accept: default_accept(),
            accept_language: default_accept_language(),
            referer: default_referer(),
            page_timeout: default_page_timeout(),
            media_timeout: default_media_timeout(),
        }
    }
}

/// Main configuration for a [`Harvester`](crate::harvester::Harvester) run
///
/// The ID range itself is not part of the configuration; it is passed to
/// [`Harvester::run_range`](crate::harvester::Harvester::run_range).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Page URL prefix; the resource ID is appended verbatim
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory that receives media files and debug dumps (default: ".")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Report file written at the end of a run
    #[serde(default = "default_report_path")]
    pub report_path: PathBuf,

    /// Media kinds to extract
    #[serde(default)]
    pub capabilities: Capabilities,

    /// Pause between IDs during a range pass (default: uniform 3-10 seconds)
    #[serde(default = "default_pacing")]
    pub pacing: Pacing,

    /// Pause between IDs during a retry pass (default: uniform 3-8 seconds)
    #[serde(default = "default_retry_pacing")]
    pub retry_pacing: Pacing,

    /// Save each fetched page as `debug_<id>.html`
    #[serde(default)]
    pub debug_dump: bool,

    /// Headers and timeouts
    #[serde(default)]
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            output_dir: default_output_dir(),
            report_path: default_report_path(),
            capabilities: Capabilities::default(),
            pacing: default_pacing(),
            retry_pacing: default_retry_pacing(),
            debug_dump: false,
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read config file '{}': {}", path.display(), e),
            ))
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Check the configuration for values that would make a run meaningless
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| Error::config("base_url", format!("invalid base URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::config(
                "base_url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        if !self.capabilities.video && !self.capabilities.image {
            return Err(Error::config(
                "capabilities",
                "at least one of video or image must be enabled",
            ));
        }

        self.pacing.validate("pacing")?;
        self.retry_pacing.validate("retry_pacing")?;

        if self.http.page_timeout.is_zero() || self.http.media_timeout.is_zero() {
            return Err(Error::config("http", "timeouts must be greater than zero"));
        }

        Ok(())
    }

    /// URL of the page for one resource
    pub fn page_url(&self, id: crate::types::ResourceId) -> String {
        format!("{}{}", self.base_url, id)
    }
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://qr.cmpedu.com/CmpBookResource/show_resource.do?id=".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_report_path() -> PathBuf {
    PathBuf::from("download_report.txt")
}

fn default_pacing() -> Pacing {
    Pacing::uniform_secs(3, 10)
}

fn default_retry_pacing() -> Pacing {
    Pacing::uniform_secs(3, 8)
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string()
}

fn default_accept() -> String {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8".to_string()
}

fn default_accept_language() -> String {
    "zh-CN,zh;q=0.9,en;q=0.8".to_string()
}

fn default_referer() -> String {
    "http://qr.cmpedu.com/".to_string()
}

fn default_page_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_media_timeout() -> Duration {
    Duration::from_secs(60)
}

// Duration serialization helper (fractional seconds)
pub(crate) mod secs_f64_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}
