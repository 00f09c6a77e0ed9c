//! Test configuration helpers

use media_harvester::{Config, Event, Harvester, Pacing};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use wiremock::MockServer;

use super::fixtures::PAGE_PATH;

/// Config for a run against `site`, writing into `output_dir`, with no pauses
pub fn test_config(site: &MockServer, output_dir: &Path) -> Config {
    Config {
        base_url: format!("{}{PAGE_PATH}?id=", site.uri()),
        output_dir: output_dir.to_path_buf(),
        report_path: output_dir.join("download_report.txt"),
        pacing: Pacing::Fixed(Duration::ZERO),
        retry_pacing: Pacing::Fixed(Duration::ZERO),
        ..Default::default()
    }
}

/// Build a harvester and subscribe to its events
pub fn create_harvester(config: Config) -> (Harvester, broadcast::Receiver<Event>) {
    let (tx, rx) = broadcast::channel(10_000);
    let harvester = Harvester::new(config)
        .expect("valid test config")
        .with_observer(Arc::new(tx));
    (harvester, rx)
}
