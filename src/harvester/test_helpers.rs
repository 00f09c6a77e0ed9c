//! Shared test helpers for building Harvester instances against a mock site.

use crate::config::{Config, Pacing};
use crate::harvester::Harvester;
use crate::types::Event;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock site serves resource pages under
pub(crate) const PAGE_PATH: &str = "/CmpBookResource/show_resource.do";

/// Config pointing at `server`, writing into `output_dir`, without pauses
pub(crate) fn test_config(server: &MockServer, output_dir: &Path) -> Config {
    Config {
        base_url: format!("{}{PAGE_PATH}?id=", server.uri()),
        output_dir: output_dir.to_path_buf(),
        report_path: output_dir.join("download_report.txt"),
        pacing: Pacing::Fixed(Duration::ZERO),
        retry_pacing: Pacing::Fixed(Duration::ZERO),
        ..Default::default()
    }
}

/// Harvester whose events are forwarded to the returned receiver
pub(crate) fn harvester_with_events(config: Config) -> (Harvester, broadcast::Receiver<Event>) {
    let (tx, rx) = broadcast::channel(1000);
    let harvester = Harvester::new(config).unwrap().with_observer(Arc::new(tx));
    (harvester, rx)
}

/// Everything received so far
pub(crate) fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Resource page with a name paragraph and a `<video>` tag
pub(crate) fn video_page(name: &str, video_url: &str) -> String {
    format!(
        r#"<html><head><title>资源详情</title></head><body>
<p>资源名称：{name}</p>
<video controls src="{video_url}"></video>
</body></html>"#
    )
}

/// Resource page with both a video tag and an identified image
pub(crate) fn video_and_image_page(name: &str, video_url: &str, image_url: &str) -> String {
    format!(
        r#"<html><head><title>资源详情</title></head><body>
<p>资源名称：{name}</p>
<video controls src="{video_url}"></video>
<img id="image" src="{image_url}">
</body></html>"#
    )
}

/// Resource page that names a resource but links no media
pub(crate) fn empty_page(name: &str) -> String {
    format!(
        r#"<html><head><title>资源详情</title></head><body>
<p>资源名称：{name}</p>
<p>This resource is not available online.</p>
</body></html>"#
    )
}

/// Serve `body` as the page for `id`
pub(crate) async fn mount_page(server: &MockServer, id: u64, body: String) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .and(query_param("id", id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Answer the page for `id` with a bare status code
pub(crate) async fn mount_page_status(server: &MockServer, id: u64, status: u16) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .and(query_param("id", id.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Serve `body` at `route` on the mock site
pub(crate) async fn mount_media(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}
