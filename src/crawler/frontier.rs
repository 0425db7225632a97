//! Crawl frontier and pacing
//!
//! This module handles:
//! - The FIFO queue of URLs waiting to be fetched
//! - Per-URL state tracking (`Queued -> Fetching -> Visited`)
//! - Enforcing the page budget on the frontier itself
//! - The delay between consecutive fetches

use crate::config::CrawlerConfig;
use crate::robots::RobotsPolicy;
use crate::state::UrlState;
use crate::AuditError;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use url::Url;

/// A URL waiting in the frontier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedUrl {
    /// The URL to fetch
    pub url: Url,

    /// Normalized key used for the visited set
    pub key: String,

    /// Link distance from the root
    pub depth: u32,
}

/// Breadth-first frontier with a visited set
///
/// Every URL is tracked by its normalized key. The number of fetched plus
/// queued URLs never exceeds `max_pages`.
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
    states: HashMap<String, UrlState>,
    fetched: usize,
    max_pages: usize,
}

impl Frontier {
    /// Creates a frontier seeded with the root at depth 0
    pub fn new(root: Url, key: String, max_pages: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            states: HashMap::new(),
            fetched: 0,
            max_pages,
        };
        if max_pages > 0 {
            frontier.states.insert(key.clone(), UrlState::Queued);
            frontier.queue.push_back(QueuedUrl {
                url: root,
                key,
                depth: 0,
            });
        }
        frontier
    }

    /// Pops the oldest queued URL
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        self.queue.pop_front()
    }

    /// Adds a URL unless it is already known or the page budget is used up
    ///
    /// Returns true if the URL was queued.
    pub fn enqueue(&mut self, url: Url, key: String, depth: u32) -> bool {
        if self.states.contains_key(&key) || !self.has_room() {
            return false;
        }
        self.states.insert(key.clone(), UrlState::Queued);
        self.queue.push_back(QueuedUrl { url, key, depth });
        true
    }

    /// True while fetched + queued URLs stay under the page budget
    pub fn has_room(&self) -> bool {
        self.fetched + self.queue.len() < self.max_pages
    }

    fn transition(&mut self, key: &str, next: UrlState) -> Result<(), AuditError> {
        let current = self.states.get(key).copied().unwrap_or(UrlState::Queued);
        if !current.can_transition_to(next) {
            return Err(AuditError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.states.insert(key.to_string(), next);
        Ok(())
    }

    /// Marks a popped URL as being fetched and counts it against the budget
    pub fn begin_fetch(&mut self, key: &str) -> Result<(), AuditError> {
        self.transition(key, UrlState::Fetching)?;
        self.fetched += 1;
        Ok(())
    }

    /// Marks a fetched URL as visited
    pub fn finish_fetch(&mut self, key: &str) -> Result<(), AuditError> {
        self.transition(key, UrlState::Visited)
    }

    /// Retires a popped URL without fetching it
    pub fn skip(&mut self, key: &str) -> Result<(), AuditError> {
        self.transition(key, UrlState::Fetching)?;
        self.transition(key, UrlState::Visited)
    }

    /// Records a redirect target so it is never fetched separately
    pub fn mark_redirect_target(&mut self, key: String) {
        self.states.insert(key, UrlState::Visited);
    }

    pub fn is_visited(&self, key: &str) -> bool {
        self.state(key).is_some_and(|s| s.is_terminal())
    }

    pub fn state(&self, key: &str) -> Option<UrlState> {
        self.states.get(key).copied()
    }

    /// Number of URLs fetched so far
    pub fn fetched_count(&self) -> usize {
        self.fetched
    }

    /// Returns the number of URLs in the frontier
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Calculates the delay between consecutive page fetches
///
/// This takes the maximum of:
/// - The configured minimum request interval
/// - The robots.txt crawl delay, capped by `max_crawl_delay_ms` (only when
///   robots.txt is respected)
pub fn effective_delay(config: &CrawlerConfig, robots: Option<&RobotsPolicy>) -> Duration {
    let config_delay = Duration::from_millis(config.min_request_interval_ms);

    if !config.respect_robots_txt {
        return config_delay;
    }

    let robots_delay = robots
        .and_then(|policy| policy.crawl_delay_seconds())
        .map(|seconds| {
            let capped_ms = (seconds * 1000.0).min(config.max_crawl_delay_ms as f64);
            Duration::from_millis(capped_ms.max(0.0) as u64)
        })
        .unwrap_or(Duration::ZERO);

    std::cmp::max(config_delay, robots_delay)
}
