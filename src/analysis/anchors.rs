//! Internal anchor text classification

use crate::analysis::{Issue, IssueKind};
use crate::crawler::CrawledPage;
use crate::url::brand_label;
use serde::Serialize;
use url::Url;

/// Exact-match fraction above which anchors count as over-optimized
pub const OVER_OPTIMIZATION_RATIO: f64 = 0.6;

/// Anchor texts that say nothing about the target
const GENERIC_PHRASES: &[&str] = &[
    "click here",
    "read more",
    "learn more",
    "find out more",
    "more info",
    "more information",
    "see more",
    "view more",
    "continue reading",
    "this page",
    "this link",
    "go to",
    "here",
    "more",
    "link",
    "details",
];

/// Minimum length of a slug word used as a keyword
const MIN_KEYWORD_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorBucket {
    Generic,
    NakedUrl,
    Branded,
    ExactMatch,
    PartialMatch,
    Other,
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnchorCounts {
    pub generic: usize,
    pub naked_url: usize,
    pub branded: usize,
    pub exact_match: usize,
    pub partial_match: usize,
    pub other: usize,
    pub empty: usize,
}

impl AnchorCounts {
    fn add(&mut self, bucket: AnchorBucket) {
        let slot = match bucket {
            AnchorBucket::Generic => &mut self.generic,
            AnchorBucket::NakedUrl => &mut self.naked_url,
            AnchorBucket::Branded => &mut self.branded,
            AnchorBucket::ExactMatch => &mut self.exact_match,
            AnchorBucket::PartialMatch => &mut self.partial_match,
            AnchorBucket::Other => &mut self.other,
            AnchorBucket::Empty => &mut self.empty,
        };
        *slot += 1;
    }
}

/// Internal anchor text distribution
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnchorAnalysis {
    pub counts: AnchorCounts,
    pub total: usize,
    /// Anchors with non-empty text
    pub analyzed: usize,
    pub exact_match_ratio: f64,
    pub over_optimized: bool,
    pub issues: Vec<Issue>,
}

fn normalize_phrase(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn looks_like_url(text: &str) -> bool {
    let lowered = text.trim().to_lowercase();
    if lowered.starts_with("http://") || lowered.starts_with("https://") || lowered.starts_with("www.")
    {
        return true;
    }
    !lowered.contains(char::is_whitespace)
        && lowered.contains('.')
        && Url::parse(&format!("http://{}", lowered))
            .ok()
            .and_then(|u| u.host_str().map(|h| h.contains('.')))
            .unwrap_or(false)
}

/// Keyword phrases derived from the last path segment of a link target
///
/// `/blog/seo-audit-guide` yields `["seo audit guide"]`.
pub fn slug_keywords(target: &str) -> Vec<String> {
    let Ok(url) = Url::parse(target) else {
        return Vec::new();
    };
    url.path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(|segment| {
            let stem = segment.split('.').next().unwrap_or(segment);
            normalize_phrase(stem)
        })
        .filter(|phrase| !phrase.is_empty())
        .into_iter()
        .collect()
}

/// Buckets one anchor text
///
/// Checks run in order: empty, naked URL, generic phrase, brand, exact
/// keyword, partial keyword.
pub fn classify_anchor(text: &str, brand: &str, keywords: &[String]) -> AnchorBucket {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return AnchorBucket::Empty;
    }
    if looks_like_url(trimmed) {
        return AnchorBucket::NakedUrl;
    }

    let phrase = normalize_phrase(trimmed);
    let padded = format!(" {} ", phrase);

    if GENERIC_PHRASES
        .iter()
        .any(|generic| phrase == *generic || (generic.contains(' ') && padded.contains(&format!(" {} ", generic))))
    {
        return AnchorBucket::Generic;
    }

    let brand = normalize_phrase(brand);
    if !brand.is_empty() && padded.contains(&format!(" {} ", brand)) {
        return AnchorBucket::Branded;
    }

    let keywords: Vec<String> = keywords.iter().map(|k| normalize_phrase(k)).collect();
    if keywords.iter().any(|k| !k.is_empty() && *k == phrase) {
        return AnchorBucket::ExactMatch;
    }

    let partial = keywords.iter().any(|keyword| {
        (!keyword.is_empty() && padded.contains(&format!(" {} ", keyword)))
            || keyword
                .split(' ')
                .filter(|w| w.len() >= MIN_KEYWORD_LEN)
                .any(|w| padded.contains(&format!(" {} ", w)))
    });
    if partial {
        return AnchorBucket::PartialMatch;
    }

    AnchorBucket::Other
}

/// Classifies every internal anchor on the crawled pages
///
/// # Arguments
///
/// * `pages` - Crawled pages
/// * `root` - The audited root; its first host label is the brand
/// * `target_keywords` - Configured keywords; when empty each link's slug is
///   used, and a slug match counts as partial at most
pub fn analyze_anchors(
    pages: &[CrawledPage],
    root: &Url,
    target_keywords: &[String],
) -> AnchorAnalysis {
    let brand = root.host_str().map(brand_label).unwrap_or_default();
    let mut analysis = AnchorAnalysis::default();

    for page in pages.iter().filter(|p| p.was_extracted()) {
        for link in &page.signals.internal_links {
            let bucket = if target_keywords.is_empty() {
                // Navigation text naturally equals its own slug
                match classify_anchor(&link.anchor_text, &brand, &slug_keywords(&link.url)) {
                    AnchorBucket::ExactMatch => AnchorBucket::PartialMatch,
                    bucket => bucket,
                }
            } else {
                classify_anchor(&link.anchor_text, &brand, target_keywords)
            };
            analysis.counts.add(bucket);
            analysis.total += 1;
        }
    }

    analysis.analyzed = analysis.total - analysis.counts.empty;
    if analysis.analyzed > 0 {
        analysis.exact_match_ratio = analysis.counts.exact_match as f64 / analysis.analyzed as f64;
    }
    analysis.over_optimized = analysis.exact_match_ratio > OVER_OPTIMIZATION_RATIO;

    if analysis.counts.empty > 0 {
        analysis.issues.push(Issue::new(
            IssueKind::EmptyAnchorText,
            format!("{} internal links have no anchor text", analysis.counts.empty),
            "Give every link descriptive text or an image alt attribute",
            analysis.counts.empty,
        ));
    }

    if analysis.over_optimized {
        analysis.issues.push(Issue::new(
            IssueKind::AnchorOverOptimization,
            format!(
                "{:.0}% of internal anchors are exact keyword matches",
                analysis.exact_match_ratio * 100.0
            ),
            "Vary internal anchor text with branded and descriptive phrases",
            analysis.counts.exact_match,
        ));
    }

    analysis
}
