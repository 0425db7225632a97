//! Sitemap discovery and summary
//!
//! Candidates are tried in order (robots.txt `Sitemap:` URLs, then the
//! conventional `/sitemap.xml`); the first candidate answering 2xx is
//! inspected and the rest are ignored.

mod parser;

pub use parser::{inspect_sitemap, SitemapCounts, SitemapKind};

use crate::analysis::{Issue, IssueKind};
use crate::fetch::{fetch_following, FetchGateway, Method, DEFAULT_FOLLOW_LIMIT};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Sitemap findings for one analysis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SitemapSummary {
    pub exists: bool,
    pub url: Option<String>,
    pub is_index: bool,
    pub url_count: usize,
    pub sitemap_count: usize,
    pub image_count: usize,
    pub video_count: usize,
    pub last_modified: Option<String>,
    pub parse_errors: Vec<String>,
    /// Every candidate tried, in order
    pub candidates: Vec<String>,
    pub issues: Vec<Issue>,
}

impl SitemapSummary {
    fn found(url: &str, counts: SitemapCounts, candidates: Vec<String>) -> Self {
        let mut issues = Vec::new();

        let entries = if counts.is_index() {
            counts.sitemap_count
        } else {
            counts.url_count
        };
        if entries == 0 {
            issues.push(Issue::new(
                IssueKind::EmptySitemap,
                format!("Sitemap at {} lists no entries", url),
                "Populate the sitemap with the canonical URLs you want indexed",
                1,
            ));
        }

        if !counts.parse_errors.is_empty() {
            issues.push(Issue::new(
                IssueKind::SitemapParseErrors,
                format!(
                    "Sitemap has {} structural problem(s): {}",
                    counts.parse_errors.len(),
                    counts.parse_errors.join("; ")
                ),
                "Serve the sitemap as well-formed XML with a declaration and the sitemaps.org namespace",
                counts.parse_errors.len(),
            ));
        }

        Self {
            exists: true,
            url: Some(url.to_string()),
            is_index: counts.is_index(),
            url_count: counts.url_count,
            sitemap_count: counts.sitemap_count,
            image_count: counts.image_count,
            video_count: counts.video_count,
            last_modified: counts.last_modified,
            parse_errors: counts.parse_errors,
            candidates,
            issues,
        }
    }

    fn missing(candidates: Vec<String>) -> Self {
        let description = format!(
            "No sitemap found (tried {})",
            if candidates.is_empty() {
                "no candidates".to_string()
            } else {
                candidates.join(", ")
            }
        );
        Self {
            candidates,
            issues: vec![Issue::new(
                IssueKind::MissingSitemap,
                description,
                "Create sitemap.xml listing your indexable pages and declare it in robots.txt",
                1,
            )],
            ..Default::default()
        }
    }
}

/// Lists sitemap candidates: declared URLs first, then `/sitemap.xml`
pub fn sitemap_candidates(root: &Url, declared: &[String]) -> Vec<String> {
    let mut candidates: Vec<String> = Vec::new();

    for raw in declared {
        if let Ok(url) = root.join(raw.trim()) {
            let url = url.to_string();
            if !candidates.contains(&url) {
                candidates.push(url);
            }
        }
    }

    if let Ok(conventional) = root.join("/sitemap.xml") {
        let conventional = conventional.to_string();
        if !candidates.contains(&conventional) {
            candidates.push(conventional);
        }
    }

    candidates
}

/// Resolves and summarizes the site's sitemap
///
/// # Arguments
///
/// * `gateway` - The gateway used for requests
/// * `root` - The audited root URL
/// * `declared` - `Sitemap:` URLs from robots.txt
/// * `timeout` - Per-request timeout
pub async fn resolve_sitemap<G: FetchGateway + ?Sized>(
    gateway: &G,
    root: &Url,
    declared: &[String],
    timeout: Duration,
) -> SitemapSummary {
    let candidates = sitemap_candidates(root, declared);

    for candidate in &candidates {
        tracing::debug!("Trying sitemap candidate: {}", candidate);

        match fetch_following(gateway, candidate, Method::Get, timeout, DEFAULT_FOLLOW_LIMIT).await
        {
            Ok(followed) if followed.response.is_success() => {
                let counts = inspect_sitemap(&followed.response.body);
                tracing::info!(
                    "Sitemap found at {} ({}, {} urls, {} child sitemaps)",
                    candidate,
                    if counts.is_index() { "index" } else { "urlset" },
                    counts.url_count,
                    counts.sitemap_count
                );
                return SitemapSummary::found(candidate, counts, candidates.clone());
            }
            Ok(followed) => {
                tracing::debug!(
                    "Sitemap candidate {} returned HTTP {}",
                    candidate,
                    followed.response.status_code
                );
            }
            Err(failure) => {
                tracing::warn!("Sitemap candidate unavailable: {}", failure);
            }
        }
    }

    tracing::info!("No sitemap found for {}", root);
    SitemapSummary::missing(candidates)
}
