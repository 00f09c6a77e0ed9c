//! Resource page fixtures and mock-site helpers

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path resource pages are served under
pub const PAGE_PATH: &str = "/CmpBookResource/show_resource.do";

/// Page with a name paragraph and a `<video>` tag
pub fn video_page(name: &str, video_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>资源详情</title></head>
<body>
  <div class="header"><img src="/static/site-logo.png"></div>
  <p>资源名称：{name}</p>
  <video id="player" controls src="{video_url}"></video>
</body></html>"#
    )
}

/// Page whose player is configured from script with escaped slashes
pub fn script_video_page(title: &str, video_url: &str) -> String {
    let escaped = video_url.replace('/', "\\/");
    format!(
        r#"<!DOCTYPE html>
<html><head><title>{title}</title></head>
<body>
  <div id="player"></div>
  <script>
    var player = new Player({{ id: "player", source: "{escaped}", autoplay: false }});
  </script>
</body></html>"#
    )
}

/// Page carrying both a video and an identified image
pub fn video_and_image_page(name: &str, video_url: &str, image_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>资源详情</title></head>
<body>
  <p class="video_title">{name}</p>
  <video controls><source src="{video_url}" type="video/mp4"></video>
  <img id="image" src="{image_url}">
</body></html>"#
    )
}

/// Page that names a resource but links no media
pub fn empty_page(name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head><title>资源详情</title></head>
<body><p>资源名称：{name}</p><p>暂无资源</p></body></html>"#
    )
}

/// Deterministic media body of `len` bytes
pub fn media_body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

/// Serve `body` as the page for `id`
pub async fn mount_page(site: &MockServer, id: u64, body: String) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .and(query_param("id", id.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(body),
        )
        .mount(site)
        .await;
}

/// Answer the page for `id` with a bare status
pub async fn mount_page_status(site: &MockServer, id: u64, status: u16) {
    Mock::given(method("GET"))
        .and(path(PAGE_PATH))
        .and(query_param("id", id.to_string()))
        .respond_with(ResponseTemplate::new(status))
        .mount(site)
        .await;
}

/// Serve `body` at `route`, expecting exactly `hits` requests
pub async fn mount_media(site: &MockServer, route: &str, body: Vec<u8>, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(hits)
        .mount(site)
        .await;
}
