//! Single page retrieval
//!
//! [`PageFetcher`] fetches one URL (following redirects), measures load time
//! and size, and runs extraction on successful HTML responses.

use crate::crawler::extract::{extract_page, parse_robots_directives, ExtractedPage};
use crate::fetch::{
    fetch_following_unseen, FetchFailure, FetchGateway, Method, DEFAULT_FOLLOW_LIMIT,
};
use serde::Serialize;
use std::time::{Duration, Instant};
use url::Url;

/// One page visited during a crawl
///
/// Created once per unique URL and never modified afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CrawledPage {
    /// URL that was requested
    pub url: String,

    /// URL that produced the final response after redirects
    pub final_url: String,

    /// URLs that answered with a redirect on the way to `final_url`
    pub redirected_from: Vec<String>,

    pub depth: u32,
    pub http_status: u16,
    pub content_type: Option<String>,
    pub load_time_ms: u64,
    pub content_length: usize,

    /// Extracted signals; empty for non-2xx or non-HTML responses
    #[serde(flatten)]
    pub signals: ExtractedPage,

    pub is_indexable: bool,
}

impl CrawledPage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.http_status)
    }

    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map_or(true, is_html_content_type)
    }

    pub fn has_noindex(&self) -> bool {
        self.signals.meta_robots.contains("noindex")
    }

    /// True when the page was parsed and its signals can be analyzed
    pub fn was_extracted(&self) -> bool {
        self.is_success() && self.is_html()
    }
}

/// Returns true for HTML or XHTML content types
pub fn is_html_content_type(content_type: &str) -> bool {
    let lowered = content_type.to_ascii_lowercase();
    lowered.contains("text/html") || lowered.contains("application/xhtml")
}

/// Result of one page retrieval
#[derive(Debug)]
pub enum PageFetch {
    /// A new page was retrieved (any status)
    Page(CrawledPage),

    /// The URL redirects to a page that was already crawled
    AlreadyCrawled {
        /// URLs that answered with a redirect, including the requested one
        redirected_from: Vec<String>,
        target: String,
    },
}

/// Fetches pages for the crawler
pub struct PageFetcher<'a, G: FetchGateway + ?Sized> {
    gateway: &'a G,
    site_root: Url,
    timeout: Duration,
}

impl<'a, G: FetchGateway + ?Sized> PageFetcher<'a, G> {
    /// Creates a fetcher for pages of `site_root`'s site
    pub fn new(gateway: &'a G, site_root: Url, timeout: Duration) -> Self {
        Self {
            gateway,
            site_root,
            timeout,
        }
    }

    /// Fetches and analyzes one page
    ///
    /// Redirect targets for which `crawled` returns true are not requested.
    ///
    /// # Returns
    ///
    /// * `Ok(PageFetch::Page)` - A response was received (any status)
    /// * `Ok(PageFetch::AlreadyCrawled)` - A redirect led to a crawled page
    /// * `Err(FetchFailure)` - No response at all (network error or timeout)
    pub async fn fetch<F>(
        &self,
        url: &str,
        depth: u32,
        crawled: F,
    ) -> Result<PageFetch, FetchFailure>
    where
        F: Fn(&str) -> bool,
    {
        let started = Instant::now();
        let followed = fetch_following_unseen(
            self.gateway,
            url,
            Method::Get,
            self.timeout,
            DEFAULT_FOLLOW_LIMIT,
            crawled,
        )
        .await?;
        let load_time_ms = started.elapsed().as_millis() as u64;

        if let Some(target) = followed.already_seen {
            let mut redirected_from = followed.redirects;
            redirected_from.push(followed.final_url);
            return Ok(PageFetch::AlreadyCrawled {
                redirected_from,
                target,
            });
        }

        let response = &followed.response;
        let content_type = response.header("content-type").map(str::to_string);
        let content_length = if response.body.is_empty() {
            response
                .header("content-length")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(0)
        } else {
            response.body.len()
        };

        let is_html = content_type.as_deref().map_or(true, is_html_content_type);

        let mut signals = if response.is_success() && is_html {
            match Url::parse(&followed.final_url) {
                Ok(base) => extract_page(&response.body, &base, &self.site_root),
                Err(e) => {
                    tracing::warn!("Cannot parse final URL {}: {}", followed.final_url, e);
                    ExtractedPage::default()
                }
            }
        } else {
            if response.is_success() {
                tracing::debug!(
                    "Skipping extraction for non-HTML content at {} ({})",
                    followed.final_url,
                    content_type.as_deref().unwrap_or("unknown")
                );
            }
            ExtractedPage::default()
        };

        if let Some(header) = response.header("x-robots-tag") {
            signals.meta_robots.extend(parse_robots_directives(header));
        }

        let is_indexable = response.status_code == 200 && !signals.meta_robots.contains("noindex");

        tracing::debug!(
            "Fetched {} -> HTTP {} in {} ms ({} bytes)",
            url,
            response.status_code,
            load_time_ms,
            content_length
        );

        Ok(PageFetch::Page(CrawledPage {
            url: url.to_string(),
            final_url: followed.final_url.clone(),
            redirected_from: followed.redirects,
            depth,
            http_status: response.status_code,
            content_type,
            load_time_ms,
            content_length,
            signals,
            is_indexable,
        }))
    }
}
