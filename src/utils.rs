//! Filename and URL helpers
//!
//! Pure string functions used between extraction and download: turning a
//! display name into something every common filesystem accepts, repairing
//! URLs lifted out of escaped script text, and picking file extensions.

use std::path::Path;

/// Longest sanitized name, in characters
pub const MAX_NAME_CHARS: usize = 120;

/// Name used when sanitizing leaves nothing behind
pub const UNKNOWN_NAME: &str = "unknown";

/// Image extensions recognized in URLs and on disk
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".bmp"];

/// Extension given to images whose URL carries none of [`IMAGE_EXTENSIONS`]
pub const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

/// Extension given to videos
pub const VIDEO_EXTENSION: &str = ".mp4";

fn is_reserved(c: char) -> bool {
    matches!(
        c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\n' | '\r' | '\t'
    )
}

fn is_edge_junk(c: char) -> bool {
    matches!(c, '.' | '_' | '-' | ' ')
}

/// Map an arbitrary display string to a filesystem-safe name
///
/// Reserved characters become `_`, whitespace runs collapse to one space,
/// leading/trailing `. _ -` and spaces are stripped, and the result is cut
/// to [`MAX_NAME_CHARS`] characters. Never returns an empty string.
///
/// # Examples
///
/// ```
/// use media_harvester::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Lesson 1: <Intro>"), "Lesson 1_ _Intro");
/// assert_eq!(sanitize_filename("  ..  "), "unknown");
/// ```
#[must_use]
pub fn sanitize_filename(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| if is_reserved(c) { '_' } else { c })
        .collect();

    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = collapsed.trim_matches(is_edge_junk);

    // Truncation can expose a new trailing space or dot
    let truncated: String = stripped.chars().take(MAX_NAME_CHARS).collect();
    let name = truncated.trim_matches(is_edge_junk);

    if name.is_empty() {
        UNKNOWN_NAME.to_string()
    } else {
        name.to_string()
    }
}

fn is_quote_or_space(c: char) -> bool {
    c == '"' || c == '\'' || c.is_whitespace()
}

/// Repair a URL copied out of markup or script text
///
/// Strips surrounding quotes and whitespace and turns escaped slashes
/// (`\/`, `\\/`) into plain ones. Returns `None` for missing or blank input.
///
/// # Examples
///
/// ```
/// use media_harvester::utils::normalize_url;
///
/// assert_eq!(
///     normalize_url(Some(r#""http:\/\/cdn.example.com\/a.mp4""#)),
///     Some("http://cdn.example.com/a.mp4".to_string())
/// );
/// assert_eq!(normalize_url(None), None);
/// ```
#[must_use]
pub fn normalize_url(raw: Option<&str>) -> Option<String> {
    let mut url = raw?.trim_matches(is_quote_or_space).to_string();
    while url.contains("\\/") {
        url = url.replace("\\/", "/");
    }
    let url = url.trim_matches(is_quote_or_space);

    if url.is_empty() {
        None
    } else {
        Some(url.to_string())
    }
}

/// URL with query string and fragment removed
fn url_path_part(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Image extension (lowercase, with dot) the URL path ends with, if any
#[must_use]
pub fn image_extension(url: &str) -> Option<&'static str> {
    let path = url_path_part(url).to_ascii_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|ext| path.ends_with(ext))
}

/// Extension used when saving an image downloaded from `url`
#[must_use]
pub fn image_file_extension(url: &str) -> &'static str {
    image_extension(url).unwrap_or(DEFAULT_IMAGE_EXTENSION)
}

/// Last path segment of a URL with its extension removed
///
/// Used as a resource name when the page has none.
#[must_use]
pub fn url_file_stem(url: &str) -> Option<String> {
    let segment = url_path_part(url).rsplit('/').next()?;
    let stem = Path::new(segment).file_stem()?.to_str()?;
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
