//! Crawler module for page fetching and site traversal
//!
//! This module contains the core crawling logic, including:
//! - HTML parsing and signal extraction
//! - Single-page fetching with redirect following
//! - The breadth-first frontier and pacing
//! - Overall crawl coordination

mod coordinator;
mod extract;
mod frontier;
mod page;

pub use coordinator::{CrawlResult, SiteCrawler, UnreachablePage};
pub use extract::{
    content_fingerprint, extract_page, normalize_text, parse_robots_directives, ExtractedPage,
    HeadingCounts, ImageInfo, PageLink,
};
pub use frontier::{effective_delay, Frontier, QueuedUrl};
pub use page::{is_html_content_type, CrawledPage, PageFetch, PageFetcher};
