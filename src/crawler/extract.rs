//! HTML signal extraction
//!
//! This module parses one HTML document and extracts:
//! - Title, meta description, first H1 and per-level heading counts
//! - Canonical link and meta-robots directives
//! - Images with alt presence
//! - Internal and external links with their anchor text
//! - Rendered text word count and content fingerprint

use crate::url::is_same_site;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use url::Url;

/// Elements whose text is never rendered
const NON_RENDERED: &[&str] = &["script", "style", "noscript", "template"];

/// Number of headings per level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeadingCounts {
    pub h1: usize,
    pub h2: usize,
    pub h3: usize,
    pub h4: usize,
    pub h5: usize,
    pub h6: usize,
}

impl HeadingCounts {
    fn set(&mut self, level: usize, count: usize) {
        match level {
            1 => self.h1 = count,
            2 => self.h2 = count,
            3 => self.h3 = count,
            4 => self.h4 = count,
            5 => self.h5 = count,
            _ => self.h6 = count,
        }
    }

    pub fn total(&self) -> usize {
        self.h1 + self.h2 + self.h3 + self.h4 + self.h5 + self.h6
    }
}

/// An `<img>` element
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub src: String,
    /// The `alt` attribute is present (an empty alt marks a decorative image)
    pub has_alt: bool,
}

/// An `<a href>` resolved to an absolute URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub url: String,
    pub anchor_text: String,
    pub nofollow: bool,
}

/// Signals extracted from one HTML document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub canonical_url: Option<String>,
    pub meta_robots: BTreeSet<String>,
    pub heading_counts: HeadingCounts,
    pub word_count: usize,
    pub content_fingerprint: String,
    pub images: Vec<ImageInfo>,
    pub internal_links: Vec<PageLink>,
    pub external_links: Vec<PageLink>,
}

/// Parses HTML content and extracts SEO signals
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `base_url` - The URL the document was served from (resolves relative links)
/// * `site_root` - The audited root; links on the same site are internal
///
/// # Example
///
/// ```
/// use sumi_audit::crawler::extract_page;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><h1>Hi</h1><a href="/page">Link</a></body></html>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let page = extract_page(html, &base, &base);
/// assert_eq!(page.title.as_deref(), Some("Test"));
/// assert_eq!(page.internal_links[0].url, "https://example.com/page");
/// ```
pub fn extract_page(html: &str, base_url: &Url, site_root: &Url) -> ExtractedPage {
    let document = Html::parse_document(html);

    let text = rendered_text(&document);
    let (internal_links, external_links) = extract_links(&document, base_url, site_root);

    ExtractedPage {
        title: first_text(&document, "title"),
        meta_description: meta_content(&document, "description"),
        h1: first_text(&document, "h1"),
        canonical_url: extract_canonical(&document, base_url),
        meta_robots: meta_content(&document, "robots")
            .map(|content| parse_robots_directives(&content))
            .unwrap_or_default(),
        heading_counts: count_headings(&document),
        word_count: text.split_whitespace().count(),
        content_fingerprint: content_fingerprint(&text),
        images: extract_images(&document, base_url),
        internal_links,
        external_links,
    }
}

/// Lowercases, collapses whitespace, then strips punctuation
///
/// The order matters and is part of the fingerprint contract: punctuation
/// removed after collapsing can leave adjacent spaces behind
/// (`"a - b"` becomes `"a  b"`). Anything that is neither alphanumeric nor
/// whitespace counts as punctuation.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// SHA-256 (hex) of the normalized text
pub fn content_fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_text(text).as_bytes());
    hex::encode(hasher.finalize())
}

/// Splits a robots meta/header value into lower-cased directives
pub fn parse_robots_directives(content: &str) -> BTreeSet<String> {
    content
        .split(',')
        .map(|d| d.trim().to_lowercase())
        .filter(|d| !d.is_empty())
        .collect()
}

fn select_all<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Collapsed text of the first element matching `css`, if non-empty
fn first_text(document: &Html, css: &str) -> Option<String> {
    select_all(document, css)
        .into_iter()
        .next()
        .map(|element| collapse(&element.text().collect::<Vec<_>>().join(" ")))
        .filter(|s| !s.is_empty())
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content of the first `<meta name=...>` whose name matches case-insensitively
fn meta_content(document: &Html, name: &str) -> Option<String> {
    select_all(document, "meta[name][content]")
        .into_iter()
        .find(|m| {
            m.value()
                .attr("name")
                .is_some_and(|n| n.trim().eq_ignore_ascii_case(name))
        })
        .and_then(|m| m.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn extract_canonical(document: &Html, base_url: &Url) -> Option<String> {
    select_all(document, "link[rel][href]")
        .into_iter()
        .find(|link| {
            link.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|token| token.eq_ignore_ascii_case("canonical"))
            })
        })
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| base_url.join(href.trim()).ok())
        .map(|url| url.to_string())
}

fn count_headings(document: &Html) -> HeadingCounts {
    let mut counts = HeadingCounts::default();
    for level in 1..=6 {
        counts.set(level, select_all(document, &format!("h{}", level)).len());
    }
    counts
}

fn extract_images(document: &Html, base_url: &Url) -> Vec<ImageInfo> {
    select_all(document, "img")
        .into_iter()
        .map(|img| {
            let raw = img.value().attr("src").unwrap_or_default().trim();
            let src = base_url
                .join(raw)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| raw.to_string());
            ImageInfo {
                src,
                has_alt: img.value().attr("alt").is_some(),
            }
        })
        .collect()
}

/// Text of every text node outside non-rendered elements, space separated
fn rendered_text(document: &Html) -> String {
    let root = select_all(document, "body")
        .into_iter()
        .next()
        .unwrap_or_else(|| document.root_element());

    let mut parts: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| NON_RENDERED.contains(&e.name()))
        });
        if !hidden {
            parts.push(&**text);
        }
    }
    parts.join(" ")
}

/// Extracts links, split into (internal, external)
fn extract_links(
    document: &Html,
    base_url: &Url,
    site_root: &Url,
) -> (Vec<PageLink>, Vec<PageLink>) {
    let mut internal = Vec::new();
    let mut external = Vec::new();

    for element in select_all(document, "a[href]") {
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(target) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        else {
            continue;
        };

        let nofollow = element.value().attr("rel").is_some_and(|rel| {
            rel.split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("nofollow"))
        });

        let link = PageLink {
            url: target.to_string(),
            anchor_text: anchor_text(&element),
            nofollow,
        };

        if is_same_site(site_root, &target) {
            internal.push(link);
        } else {
            external.push(link);
        }
    }

    (internal, external)
}

/// Visible anchor text, falling back to the alt text of a linked image
fn anchor_text(element: &ElementRef) -> String {
    let text = collapse(&element.text().collect::<Vec<_>>().join(" "));
    if !text.is_empty() {
        return text;
    }

    match Selector::parse("img[alt]") {
        Ok(selector) => element
            .select(&selector)
            .filter_map(|img| img.value().attr("alt"))
            .map(collapse)
            .find(|alt| !alt.is_empty())
            .unwrap_or_default(),
        Err(_) => String::new(),
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }
    absolute_url.set_fragment(None);
    Some(absolute_url)
}
