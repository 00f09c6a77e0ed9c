use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use media_harvester::report::format_size;
use media_harvester::{
    Capabilities, Config, Event, Harvester, IdRange, Pacing, ProgressObserver, TracingObserver,
    render_summary, write_report,
};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MediaArg {
    /// Videos only
    Video,
    /// Images only
    Image,
    /// Videos and images
    All,
}

impl From<MediaArg> for Capabilities {
    fn from(arg: MediaArg) -> Self {
        match arg {
            MediaArg::Video => Capabilities::video_only(),
            MediaArg::Image => Capabilities::image_only(),
            MediaArg::All => Capabilities::default(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Download videos and images from a range of resource pages")]
struct CliArgs {
    /// First (highest) resource ID
    #[arg(long)]
    pub start: u64,

    /// Last (lowest) resource ID
    #[arg(long)]
    pub end: u64,

    /// JSON configuration file. Command-line flags override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Page URL prefix; the resource ID is appended to it
    #[arg(long)]
    pub base_url: Option<String>,

    /// Directory for downloaded files
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Report file written at the end of the run
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Fixed pause between IDs, in seconds
    #[arg(long, conflicts_with = "delay_range")]
    pub delay: Option<f64>,

    /// Random pause between IDs, in seconds
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    pub delay_range: Option<Vec<f64>>,

    /// Media kinds to download
    #[arg(long, value_enum)]
    pub media: Option<MediaArg>,

    /// Save every fetched page as debug_<id>.html
    #[arg(long)]
    pub debug_html: bool,

    /// Retry failed IDs without asking
    #[arg(long, conflicts_with = "no_retry")]
    pub retry: bool,

    /// Never retry failed IDs
    #[arg(long)]
    pub no_retry: bool,
}

fn seconds(value: f64, flag: &str) -> Result<Duration> {
    Duration::try_from_secs_f64(value).with_context(|| format!("invalid {flag} value {value}"))
}

impl CliArgs {
    /// Config file (or defaults) with command-line overrides applied
    fn resolve_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)
                .with_context(|| format!("loading config file {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if let Some(report) = &self.report {
            config.report_path = report.clone();
        }
        if let Some(delay) = self.delay {
            config.pacing = Pacing::Fixed(seconds(delay, "--delay")?);
        }
        if let Some(range) = &self.delay_range {
            let [min, max] = range.as_slice() else {
                bail!("--delay-range takes exactly two values");
            };
            config.pacing = Pacing::Uniform {
                min: seconds(*min, "--delay-range")?,
                max: seconds(*max, "--delay-range")?,
            };
        }
        if let Some(media) = self.media {
            config.capabilities = media.into();
        }
        if self.debug_html {
            config.debug_dump = true;
        }

        Ok(config)
    }
}

/// Logs events through tracing and keeps a live progress line on stderr
#[derive(Default)]
struct ConsoleObserver {
    progress_line: AtomicBool,
}

impl ProgressObserver for ConsoleObserver {
    fn on_progress(&self, event: &Event) {
        if let Event::Downloading {
            downloaded_bytes,
            total_bytes,
            percent,
            speed_bps,
            ..
        } = event
        {
            let line = match (percent, total_bytes) {
                (Some(percent), Some(total)) => format!(
                    "\r  {percent:5.1}% ({} / {}) {}/s   ",
                    format_size(*downloaded_bytes),
                    format_size(*total),
                    format_size(*speed_bps)
                ),
                _ => format!(
                    "\r  {} {}/s   ",
                    format_size(*downloaded_bytes),
                    format_size(*speed_bps)
                ),
            };
            let mut stderr = std::io::stderr().lock();
            let _ = stderr.write_all(line.as_bytes());
            let _ = stderr.flush();
            self.progress_line.store(true, Ordering::Relaxed);
            return;
        }

        if self.progress_line.swap(false, Ordering::Relaxed) {
            eprintln!();
        }
        TracingObserver.on_progress(event);
    }
}

async fn confirm_retry(failed: usize) -> Result<bool> {
    print!("Retry {failed} failed downloads? (y/n): ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await
        .context("reading answer from stdin")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let config = cli_args.resolve_config()?;
    let range = IdRange::new(cli_args.start, cli_args.end)?;
    let report_path = config.report_path.clone();

    let mut harvester = Harvester::new(config)
        .context("invalid configuration")?
        .with_observer(Arc::new(ConsoleObserver::default()));

    let started = Instant::now();
    let stats = harvester.run_range(range).await;
    info!(
        attempted = stats.attempted,
        succeeded = stats.succeeded,
        no_media = stats.no_media,
        failed = stats.failed,
        "Batch finished"
    );
    println!("{}", render_summary(harvester.state(), started.elapsed()));

    let failed = harvester.state().failed().len();
    if failed > 0 {
        let retry = if cli_args.retry {
            true
        } else if cli_args.no_retry {
            false
        } else {
            confirm_retry(failed).await?
        };

        if retry {
            let retry_stats = harvester.retry_failed().await;
            println!(
                "Retry recovered {} of {} IDs",
                retry_stats.recovered, retry_stats.attempted
            );
        }
    }

    write_report(harvester.state(), &report_path)
        .await
        .with_context(|| format!("writing report {}", report_path.display()))?;
    println!("Report saved: {}", report_path.display());

    Ok(())
}
