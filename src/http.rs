//! HTTP session setup
//!
//! One `reqwest::Client` is built per run and shared by page and media
//! requests, so cookies and keep-alive connections carry over between IDs.
//! Timeouts bound each wait on the server (the response head, then every
//! body read) rather than the whole transfer, so a large file that keeps
//! arriving is never cut off. Pages and media use different limits.

use std::future::Future;
use std::time::Duration;

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderName, HeaderValue, REFERER, USER_AGENT,
};

use crate::config::HttpConfig;
use crate::error::{Error, Result};

fn header_value(key: &str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::config(key, format!("invalid header value '{value}': {e}")))
}

/// Static headers sent with every request
pub fn default_headers(config: &HttpConfig) -> Result<HeaderMap> {
    let entries: [(HeaderName, &str, &str); 5] = [
        (USER_AGENT, "http.user_agent", &config.user_agent),
        (ACCEPT, "http.accept", &config.accept),
        (ACCEPT_LANGUAGE, "http.accept_language", &config.accept_language),
        (CONNECTION, "http.connection", "keep-alive"),
        (REFERER, "http.referer", &config.referer),
    ];

    let mut headers = HeaderMap::with_capacity(entries.len());
    for (name, key, value) in entries {
        headers.insert(name, header_value(key, value)?);
    }
    Ok(headers)
}

/// Build the shared client for a run
///
/// # Errors
/// Returns a configuration error for header values that are not valid HTTP,
/// or a network error if the TLS backend cannot be initialized.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .default_headers(default_headers(config)?)
        .cookie_store(true)
        .build()?;
    Ok(client)
}

fn stalled(what: &str, limit: Duration) -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::TimedOut,
        format!("{what} stalled for more than {:.1}s", limit.as_secs_f64()),
    ))
}

/// Await one network step, failing with `TimedOut` if it takes longer than `limit`
pub(crate) async fn within<T>(
    limit: Duration,
    what: &str,
    step: impl Future<Output = reqwest::Result<T>>,
) -> Result<T> {
    match tokio::time::timeout(limit, step).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(stalled(what, limit)),
    }
}

/// Send `request`, allowing at most `limit` until the response head arrives
pub(crate) async fn send(
    request: reqwest::RequestBuilder,
    limit: Duration,
) -> Result<reqwest::Response> {
    within(limit, "request", request.send()).await
}

/// Read the whole body, allowing at most `limit` between two chunks
pub(crate) async fn read_body(mut response: reqwest::Response, limit: Duration) -> Result<Vec<u8>> {
    let capacity = response.content_length().unwrap_or(0).min(16 * 1024 * 1024);
    let mut body = Vec::with_capacity(capacity as usize);
    while let Some(chunk) = within(limit, "response body", response.chunk()).await? {
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
