//! Robots.txt handling module
//!
//! This module fetches and parses a site's robots.txt into a [`RobotsPolicy`]
//! and derives the robots-related issues. Fetching never fails: an
//! unreachable or non-2xx robots.txt yields `exists = false`.

mod parser;

pub use parser::{Directive, ParsedRobots, RobotsRule};

use crate::analysis::{Issue, IssueKind};
use crate::fetch::{fetch_following, FetchGateway, Method, DEFAULT_FOLLOW_LIMIT};
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Size above which robots.txt is flagged (Google stops reading at 500 KiB)
pub const MAX_ROBOTS_BYTES: usize = 500 * 1024;

/// Crawl-delay above which the site is considered to throttle crawlers
pub const HIGH_CRAWL_DELAY_SECS: f64 = 10.0;

/// Robots.txt findings for one analysis run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RobotsPolicy {
    pub url: String,
    pub exists: bool,
    pub size_bytes: usize,
    #[serde(flatten)]
    pub parsed: ParsedRobots,
    pub issues: Vec<Issue>,
}

impl RobotsPolicy {
    /// Builds a policy from fetched content and derives its issues
    pub fn from_content(url: &str, content: &str) -> Self {
        let parsed = ParsedRobots::from_content(content);
        let mut issues = Vec::new();

        if parsed.blocks_all() {
            issues.push(Issue::new(
                IssueKind::RobotsBlocksAll,
                "robots.txt disallows the whole site for all user agents (Disallow: / under User-agent: *)",
                "Remove the site-wide Disallow: / rule unless the site must stay out of search results",
                1,
            ));
        }

        if content.len() > MAX_ROBOTS_BYTES {
            issues.push(Issue::new(
                IssueKind::RobotsTxtOversized,
                format!(
                    "robots.txt is {} KB, above the {} KB crawlers read",
                    content.len() / 1024,
                    MAX_ROBOTS_BYTES / 1024
                ),
                "Consolidate robots.txt rules so the file stays under 500 KB",
                1,
            ));
        }

        if let Some(delay) = parsed.crawl_delay_seconds {
            if delay > HIGH_CRAWL_DELAY_SECS {
                issues.push(Issue::new(
                    IssueKind::HighCrawlDelay,
                    format!("robots.txt sets a crawl-delay of {} seconds", delay),
                    "Lower or remove the Crawl-delay directive so crawlers can cover the site",
                    1,
                ));
            }
        }

        Self {
            url: url.to_string(),
            exists: true,
            size_bytes: content.len(),
            parsed,
            issues,
        }
    }

    /// Policy for a site without a reachable robots.txt
    pub fn missing(url: &str, reason: &str) -> Self {
        Self {
            url: url.to_string(),
            exists: false,
            size_bytes: 0,
            parsed: ParsedRobots::default(),
            issues: vec![Issue::new(
                IssueKind::MissingRobotsTxt,
                format!("No robots.txt found at {} ({})", url, reason),
                "Create robots.txt at the site root and reference the sitemap from it",
                1,
            )],
        }
    }

    pub fn sitemap_urls(&self) -> &[String] {
        &self.parsed.sitemap_urls
    }

    pub fn crawl_delay_seconds(&self) -> Option<f64> {
        self.parsed.crawl_delay_seconds
    }

    /// Missing robots.txt allows everything
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        !self.exists || self.parsed.is_allowed(url, user_agent)
    }
}

/// Returns the conventional robots.txt location for a site
pub fn robots_url(root: &Url) -> String {
    root.join("/robots.txt")
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}robots.txt", root))
}

/// Fetches robots.txt for the root's site
///
/// # Arguments
///
/// * `gateway` - The gateway used for the request
/// * `root` - The audited root URL
/// * `timeout` - Per-request timeout
pub async fn fetch_robots_policy<G: FetchGateway + ?Sized>(
    gateway: &G,
    root: &Url,
    timeout: Duration,
) -> RobotsPolicy {
    let url = robots_url(root);
    tracing::debug!("Fetching robots.txt: {}", url);

    match fetch_following(gateway, &url, Method::Get, timeout, DEFAULT_FOLLOW_LIMIT).await {
        Ok(followed) if followed.response.is_success() => {
            let policy = RobotsPolicy::from_content(&url, &followed.response.body);
            tracing::info!(
                "robots.txt found ({} bytes, {} agent groups, {} sitemaps)",
                policy.size_bytes,
                policy.parsed.rules_by_agent.len(),
                policy.sitemap_urls().len()
            );
            policy
        }
        Ok(followed) => {
            tracing::info!("robots.txt returned HTTP {}", followed.response.status_code);
            RobotsPolicy::missing(&url, &format!("HTTP {}", followed.response.status_code))
        }
        Err(failure) => {
            tracing::warn!("Could not fetch robots.txt: {}", failure);
            RobotsPolicy::missing(&url, &failure.to_string())
        }
    }
}
