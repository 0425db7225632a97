//! Sitemap XML inspection
//!
//! Counts entries with a quick-xml event reader. This is intentionally not a
//! validating parser: structural problems are recorded as soft errors and the
//! counts gathered so far are kept.

use quick_xml::events::Event;
use quick_xml::Reader;

/// Root element of a sitemap document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    UrlSet,
    Index,
    Unknown,
}

/// Counts gathered from one sitemap document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SitemapCounts {
    pub kind: Option<SitemapKind>,
    pub url_count: usize,
    pub sitemap_count: usize,
    pub image_count: usize,
    pub video_count: usize,
    pub last_modified: Option<String>,
    pub parse_errors: Vec<String>,
}

impl SitemapCounts {
    pub fn is_index(&self) -> bool {
        self.kind == Some(SitemapKind::Index)
    }
}

/// Strips a namespace prefix: `image:image` -> `image`
fn local(name: &[u8]) -> &[u8] {
    match name.iter().position(|b| *b == b':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Inspects a sitemap document
///
/// # Arguments
///
/// * `xml` - Raw document body
///
/// # Returns
///
/// Entry counts plus soft parse errors (missing declaration, missing
/// namespace, unknown root, malformed XML).
pub fn inspect_sitemap(xml: &str) -> SitemapCounts {
    let mut counts = SitemapCounts::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut saw_declaration = false;
    let mut in_lastmod = false;

    loop {
        let (name, is_start, namespaced) = match reader.read_event() {
            Ok(Event::Decl(_)) => {
                saw_declaration = true;
                continue;
            }
            Ok(Event::Start(e)) => {
                let namespaced = e
                    .attributes()
                    .flatten()
                    .any(|a| a.key.as_ref() == b"xmlns");
                (e.name().as_ref().to_vec(), true, namespaced)
            }
            Ok(Event::Empty(e)) => {
                let namespaced = e
                    .attributes()
                    .flatten()
                    .any(|a| a.key.as_ref() == b"xmlns");
                (e.name().as_ref().to_vec(), false, namespaced)
            }
            Ok(Event::Text(t)) => {
                if in_lastmod {
                    let value = String::from_utf8_lossy(&t).trim().to_string();
                    if !value.is_empty()
                        && counts
                            .last_modified
                            .as_ref()
                            .map_or(true, |current| value > *current)
                    {
                        counts.last_modified = Some(value);
                    }
                }
                continue;
            }
            Ok(Event::End(e)) => {
                if local(e.name().as_ref()) == b"lastmod" {
                    in_lastmod = false;
                }
                continue;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                counts.parse_errors.push(format!(
                    "Malformed XML at byte {}: {}",
                    reader.error_position(),
                    e
                ));
                break;
            }
            Ok(_) => continue,
        };

        if counts.kind.is_none() {
            counts.kind = Some(match local(&name) {
                b"urlset" => SitemapKind::UrlSet,
                b"sitemapindex" => SitemapKind::Index,
                other => {
                    counts.parse_errors.push(format!(
                        "Unexpected root element <{}>",
                        String::from_utf8_lossy(other)
                    ));
                    SitemapKind::Unknown
                }
            });
            if !namespaced {
                counts
                    .parse_errors
                    .push("Root element is missing the sitemap xmlns namespace".to_string());
            }
            continue;
        }

        match name.as_slice() {
            b"url" => counts.url_count += 1,
            b"sitemap" => counts.sitemap_count += 1,
            b"image:image" => counts.image_count += 1,
            b"video:video" => counts.video_count += 1,
            _ => {
                if is_start && local(&name) == b"lastmod" {
                    in_lastmod = true;
                }
            }
        }
    }

    if counts.kind.is_none() {
        counts
            .parse_errors
            .push("Document has no root element".to_string());
    }

    if !saw_declaration {
        counts
            .parse_errors
            .insert(0, "Missing XML declaration".to_string());
    }

    counts
}
