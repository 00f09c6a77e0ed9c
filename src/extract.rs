//! Resource page extraction
//!
//! Pages on the resource site come in several layouts: some carry a plain
//! `<video>` tag, others build the player from script with the URL inside a
//! JSON-ish literal (often with escaped slashes), and a few only mention the
//! media URL somewhere in the raw text. Each lookup below tries structured
//! DOM attributes first, then script literals, then raw-text scraping, and
//! stops at the first usable candidate. The order decides which URL wins on
//! pages that match several rules, so it must not be rearranged.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::Capabilities;
use crate::error::{Error, Result};
use crate::types::ExtractionResult;
use crate::utils::{image_extension, normalize_url};

/// Title the site uses on pages that have no specific name
const PLACEHOLDER_TITLE: &str = "资源详情";

/// Marker preceding the resource name in a paragraph (both colon widths)
const NAME_MARKERS: [&str; 2] = ["资源名称：", "资源名称:"];

/// URL substrings that identify decorative images
const DECORATIVE_MARKERS: [&str; 2] = ["icon", "logo"];

struct Selectors {
    paragraph: Selector,
    video_title: Selector,
    title: Selector,
    video: Selector,
    source: Selector,
    image_by_id: Selector,
    image: Selector,
}

struct Patterns {
    name_marker: Regex,
    js_source: Regex,
    js_src_or_url: Regex,
    escaped_video: Regex,
    plain_video: Regex,
    escaped_image: Regex,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| Error::Extractor(format!("selector '{css}': {e:?}")))
}

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| Error::Extractor(format!("pattern '{re}': {e}")))
}

/// Pulls a resource name and media URLs out of page markup
///
/// Build one per run and reuse it; construction compiles every selector and
/// pattern up front.
pub struct PageExtractor {
    capabilities: Capabilities,
    selectors: Selectors,
    patterns: Patterns,
}

impl PageExtractor {
    /// Create an extractor looking for the given media kinds
    pub fn new(capabilities: Capabilities) -> Result<Self> {
        let selectors = Selectors {
            paragraph: selector("p")?,
            video_title: selector("p.video_title")?,
            title: selector("title")?,
            video: selector("video")?,
            source: selector("source")?,
            image_by_id: selector("img#image")?,
            image: selector("img")?,
        };

        let patterns = Patterns {
            name_marker: pattern(r"^资源名称[：:]\s*")?,
            js_source: pattern(r#"(?i)source\s*:\s*["']([^"']+\.mp4)["']"#)?,
            js_src_or_url: pattern(r#"(?i)(?:src|url)\s*:\s*["']([^"']+\.mp4)["']"#)?,
            escaped_video: pattern(r#"https?:\\?/\\?/[^\s"'<>]+\.mp4"#)?,
            plain_video: pattern(r#"https?://[^\s"'<>]+\.mp4"#)?,
            escaped_image: pattern(r#"(?i)https?:\\?/\\?/[^\s"'<>]+\.(?:jpg|jpeg|png|gif|bmp)"#)?,
        };

        Ok(Self {
            capabilities,
            selectors,
            patterns,
        })
    }

    /// Media kinds this extractor looks for
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Extract name and media URLs from a fetched page
    ///
    /// `markup` doubles as the raw text scanned by the pattern fallbacks.
    /// Kinds disabled in the capabilities are always `None`.
    pub fn extract(&self, markup: &str) -> ExtractionResult {
        let doc = Html::parse_document(markup);

        ExtractionResult {
            name: self.resource_name(&doc),
            video_url: if self.capabilities.video {
                self.video_url(&doc, markup)
            } else {
                None
            },
            image_url: if self.capabilities.image {
                self.image_url(&doc, markup)
            } else {
                None
            },
        }
    }

    fn resource_name(&self, doc: &Html) -> Option<String> {
        for p in doc.select(&self.selectors.paragraph) {
            let text = element_text(p);
            if NAME_MARKERS.iter().any(|marker| text.contains(marker)) {
                let name = self.patterns.name_marker.replace(&text, "");
                let name = name.trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }

        if let Some(title) = doc.select(&self.selectors.video_title).next() {
            let text = element_text(title);
            if !text.is_empty() {
                return Some(text);
            }
        }

        doc.select(&self.selectors.title)
            .next()
            .map(element_text)
            .filter(|text| !text.is_empty() && text != PLACEHOLDER_TITLE)
    }

    fn video_url(&self, doc: &Html, raw: &str) -> Option<String> {
        // Only the first <video> and the first <source> are considered
        for tag in [&self.selectors.video, &self.selectors.source] {
            if let Some(url) = doc
                .select(tag)
                .next()
                .and_then(|el| normalize_url(el.value().attr("src")))
            {
                return Some(url);
            }
        }

        for script in [&self.patterns.js_source, &self.patterns.js_src_or_url] {
            if let Some(url) = script
                .captures(raw)
                .and_then(|caps| normalize_url(caps.get(1).map(|m| m.as_str())))
            {
                return Some(url);
            }
        }

        for text in [&self.patterns.escaped_video, &self.patterns.plain_video] {
            if let Some(url) = text.find(raw).and_then(|m| normalize_url(Some(m.as_str()))) {
                return Some(url);
            }
        }

        None
    }

    fn image_url(&self, doc: &Html, raw: &str) -> Option<String> {
        if let Some(img) = doc.select(&self.selectors.image_by_id).next()
            && let Some(url) = normalize_url(first_attr(img, &["src", "data-original"]))
            && image_extension(&url).is_some()
        {
            return Some(url);
        }

        for img in doc.select(&self.selectors.image) {
            let Some(url) = normalize_url(first_attr(img, &["src", "data-original", "data-src"]))
            else {
                continue;
            };
            if image_extension(&url).is_some() && !is_decorative(&url) {
                return Some(url);
            }
        }

        self.patterns
            .escaped_image
            .find(raw)
            .and_then(|m| normalize_url(Some(m.as_str())))
    }
}

/// Trimmed concatenated text of an element
fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// First non-empty attribute among `names`
fn first_attr<'a>(el: ElementRef<'a>, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .filter_map(|name| el.value().attr(name))
        .find(|value| !value.is_empty())
}

fn is_decorative(url: &str) -> bool {
    let lower = url.to_lowercase();
    DECORATIVE_MARKERS.iter().any(|marker| lower.contains(marker))
}
