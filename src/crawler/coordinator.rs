//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the breadth-first crawl loop, which:
//! - Drives the [`Frontier`] from the root URL
//! - Fetches each page once through [`PageFetcher`]
//! - Queues same-site links one level deeper
//! - Applies robots.txt, pacing and the optional deadline

use crate::config::CrawlerConfig;
use crate::crawler::frontier::{effective_delay, Frontier, QueuedUrl};
use crate::crawler::page::{CrawledPage, PageFetch, PageFetcher};
use crate::fetch::{FetchFailure, FetchFailureKind, FetchGateway};
use crate::robots::RobotsPolicy;
use crate::url::{is_same_site, normalize_key, normalize_url};
use serde::Serialize;
use std::time::{Duration, Instant};
use url::Url;

/// A URL that produced no response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnreachablePage {
    pub url: String,
    pub depth: u32,
    pub kind: FetchFailureKind,
    pub reason: String,
}

/// Everything one crawl produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlResult {
    /// Pages in fetch order
    pub pages: Vec<CrawledPage>,
    pub unreachable: Vec<UnreachablePage>,
    /// URLs skipped because robots.txt disallows them
    pub blocked: Vec<String>,
    /// True if the crawl stopped on its deadline
    pub deadline_reached: bool,
    pub duration_ms: u64,
}

impl CrawlResult {
    /// The root page (first page fetched), if it answered at all
    pub fn root_page(&self) -> Option<&CrawledPage> {
        self.pages.first().filter(|page| page.depth == 0)
    }
}

/// Breadth-first crawler over one site
pub struct SiteCrawler<'a, G: FetchGateway + ?Sized> {
    gateway: &'a G,
    config: CrawlerConfig,
    robots: Option<&'a RobotsPolicy>,
    user_agent: String,
}

impl<'a, G: FetchGateway + ?Sized> SiteCrawler<'a, G> {
    /// Creates a crawler
    ///
    /// # Arguments
    ///
    /// * `gateway` - The gateway used for page requests
    /// * `config` - Crawl limits and pacing
    /// * `user_agent` - Agent token checked against robots.txt
    pub fn new(gateway: &'a G, config: CrawlerConfig, user_agent: impl Into<String>) -> Self {
        Self {
            gateway,
            config,
            robots: None,
            user_agent: user_agent.into(),
        }
    }

    /// Uses the site's robots.txt for blocking and crawl-delay
    pub fn with_robots(mut self, robots: &'a RobotsPolicy) -> Self {
        self.robots = Some(robots);
        self
    }

    /// Runs the crawl from `root`
    ///
    /// Never fails: unreachable pages are recorded in the result. The loop
    /// ends when the frontier empties, `max_pages` pages were fetched or the
    /// deadline passed.
    pub async fn crawl(&self, root: &Url) -> CrawlResult {
        let started = Instant::now();
        let mut result = CrawlResult::default();

        let root = normalize_url(root.as_str()).unwrap_or_else(|_| root.clone());
        let root_key = normalize_key(root.as_str());
        let mut frontier = Frontier::new(root.clone(), root_key, self.config.max_pages);

        let fetcher = PageFetcher::new(
            self.gateway,
            root.clone(),
            Duration::from_millis(self.config.page_timeout_ms),
        );
        let delay = effective_delay(&self.config, self.robots);
        let deadline = self.config.deadline_secs.map(Duration::from_secs);

        tracing::info!(
            "Starting crawl of {} (max depth {}, max pages {})",
            root,
            self.config.max_depth,
            self.config.max_pages
        );

        while frontier.fetched_count() < self.config.max_pages {
            if deadline.is_some_and(|limit| started.elapsed() >= limit) {
                tracing::warn!(
                    "Crawl deadline reached after {} pages, {} still queued",
                    frontier.fetched_count(),
                    frontier.len()
                );
                result.deadline_reached = true;
                break;
            }

            let Some(queued) = frontier.pop() else {
                tracing::info!("Frontier is empty, crawl complete");
                break;
            };

            if frontier.is_visited(&queued.key) || queued.depth > self.config.max_depth {
                continue;
            }

            if self.is_blocked(&queued.url) {
                tracing::info!("URL {} disallowed by robots.txt", queued.url);
                if let Err(e) = frontier.skip(&queued.key) {
                    tracing::error!("Frontier error for {}: {}", queued.url, e);
                }
                result.blocked.push(queued.url.to_string());
                continue;
            }

            if frontier.fetched_count() > 0 && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            if let Err(e) = frontier.begin_fetch(&queued.key) {
                tracing::error!("Frontier error for {}: {}", queued.url, e);
                continue;
            }

            let outcome = fetcher
                .fetch(queued.url.as_str(), queued.depth, |hop| {
                    frontier.is_visited(&normalize_key(hop))
                })
                .await;

            if let Err(e) = frontier.finish_fetch(&queued.key) {
                tracing::error!("Frontier error for {}: {}", queued.url, e);
            }

            match outcome {
                Ok(PageFetch::Page(page)) => {
                    self.handle_page(&mut frontier, &queued, &page);
                    result.pages.push(page);
                }
                Ok(PageFetch::AlreadyCrawled {
                    redirected_from,
                    target,
                }) => {
                    tracing::debug!("{} redirects to already crawled {}", queued.url, target);
                    mark_redirects(&mut frontier, &queued, &redirected_from);
                }
                Err(failure) => {
                    tracing::warn!("Unreachable: {}", failure);
                    result.unreachable.push(unreachable(&queued, failure));
                }
            }
        }

        result.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Crawl completed: {} pages, {} unreachable, {} blocked in {:?}",
            result.pages.len(),
            result.unreachable.len(),
            result.blocked.len(),
            started.elapsed()
        );

        result
    }

    fn is_blocked(&self, url: &Url) -> bool {
        self.config.respect_robots_txt
            && self
                .robots
                .is_some_and(|robots| !robots.is_allowed(url.as_str(), &self.user_agent))
    }

    /// Marks redirect targets visited and queues same-site links
    fn handle_page(&self, frontier: &mut Frontier, queued: &QueuedUrl, page: &CrawledPage) {
        mark_redirects(frontier, queued, &page.redirected_from);
        mark_redirects(frontier, queued, std::slice::from_ref(&page.final_url));

        if !page.was_extracted() {
            return;
        }

        let next_depth = queued.depth + 1;
        if next_depth > self.config.max_depth {
            return;
        }

        let mut added = 0;
        for link in &page.signals.internal_links {
            if !frontier.has_room() {
                break;
            }

            let normalized = match normalize_url(&link.url) {
                Ok(n) => n,
                Err(e) => {
                    tracing::debug!("Failed to normalize URL {}: {}", link.url, e);
                    continue;
                }
            };

            if !is_same_site(&queued.url, &normalized) {
                continue;
            }

            let key = normalize_key(normalized.as_str());
            if frontier.enqueue(normalized, key, next_depth) {
                added += 1;
            }
        }

        tracing::debug!(
            "Queued {} new links from {} (frontier size {})",
            added,
            page.url,
            frontier.len()
        );
    }
}

/// Marks every hop other than the queued URL itself as visited
fn mark_redirects(frontier: &mut Frontier, queued: &QueuedUrl, hops: &[String]) {
    for hop in hops {
        let key = normalize_key(hop);
        if key != queued.key {
            frontier.mark_redirect_target(key);
        }
    }
}

fn unreachable(queued: &QueuedUrl, failure: FetchFailure) -> UnreachablePage {
    UnreachablePage {
        url: queued.url.to_string(),
        depth: queued.depth,
        kind: failure.kind,
        reason: failure.to_string(),
    }
}
