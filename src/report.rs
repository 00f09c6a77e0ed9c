//! Run report and console summary

use std::fmt;
use std::path::Path;
use std::time::Duration;

use chrono::Local;

use crate::error::Result;
use crate::types::{BatchState, ResourceId};

/// Longest no-media list printed in the console summary
pub const SUMMARY_NO_MEDIA_LIMIT: usize = 20;

const RULE: &str = "============================================================";

fn join_ids(ids: &[ResourceId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable byte count (B, KB, MB, GB)
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Full text report of a run
///
/// Lists every success with its files (and any medium that could not be
/// saved), then the no-media and failed IDs. Nothing is truncated.
pub fn render_report(state: &BatchState) -> String {
    Report(state).to_string()
}

struct Report<'a>(&'a BatchState);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.0;

        writeln!(f, "Media download report")?;
        writeln!(f, "Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
        writeln!(f, "{RULE}")?;
        writeln!(f)?;

        writeln!(f, "Succeeded: {}", state.successes().len())?;
        writeln!(f)?;
        for record in state.successes() {
            writeln!(f, "ID {}: {}", record.id, record.name)?;
            for media in &record.media {
                writeln!(f, "  {}: {}", media.kind, media.path.display())?;
                writeln!(f, "    URL: {}", media.source_url)?;
            }
            for kind in &record.missing {
                writeln!(f, "  {kind}: not downloaded")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "No media: {}", state.no_media().len())?;
        if !state.no_media().is_empty() {
            writeln!(f, "{}", join_ids(state.no_media()))?;
        }
        writeln!(f)?;

        writeln!(f, "Failed: {}", state.failed().len())?;
        if !state.failed().is_empty() {
            writeln!(f, "{}", join_ids(state.failed()))?;
        }
        Ok(())
    }
}

/// Write [`render_report`] to `path`
pub async fn write_report(state: &BatchState, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, render_report(state)).await?;
    tracing::info!(path = %path.display(), "Report written");
    Ok(())
}

/// Total size of saved files that are still on disk
pub fn saved_bytes(state: &BatchState) -> u64 {
    state
        .successes()
        .iter()
        .flat_map(|record| &record.media)
        .filter_map(|media| std::fs::metadata(&media.path).ok())
        .map(|meta| meta.len())
        .sum()
}

/// Console summary printed at the end of a pass
///
/// No-media IDs are only listed when there are at most
/// [`SUMMARY_NO_MEDIA_LIMIT`] of them; failed IDs are always listed.
pub fn render_summary(state: &BatchState, elapsed: Duration) -> String {
    Summary { state, elapsed }.to_string()
}

struct Summary<'a> {
    state: &'a BatchState,
    elapsed: Duration,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state;

        writeln!(f, "{RULE}")?;
        writeln!(f, "Summary")?;
        writeln!(f, "{RULE}")?;
        writeln!(f, "Succeeded: {}", state.successes().len())?;
        writeln!(f, "No media:  {}", state.no_media().len())?;
        writeln!(f, "Failed:    {}", state.failed().len())?;
        writeln!(f, "Total:     {}", state.total())?;
        writeln!(f, "Elapsed:   {:.1} min", self.elapsed.as_secs_f64() / 60.0)?;
        if !state.successes().is_empty() {
            writeln!(f, "Size:      {}", format_size(saved_bytes(state)))?;
        }

        let no_media = state.no_media();
        if !no_media.is_empty() && no_media.len() <= SUMMARY_NO_MEDIA_LIMIT {
            writeln!(f)?;
            writeln!(f, "No media IDs: {}", join_ids(no_media))?;
        }
        if !state.failed().is_empty() {
            writeln!(f)?;
            writeln!(f, "Failed IDs: {}", join_ids(state.failed()))?;
        }
        writeln!(f, "{RULE}")
    }
}
