//! Crawl budget heuristic
//!
//! A coarse health score for how freely a search engine would crawl the
//! site. It is not a prediction of real crawler behavior.

use serde::Serialize;

/// Pages a perfectly healthy site is assumed to get crawled per cycle
pub const BASELINE_BUDGET: u64 = 1000;

/// Floor for the estimated budget
pub const MIN_BUDGET: u64 = 100;

/// Root load time above which crawling slows down
pub const SLOW_LOAD_MS: u64 = 3000;

/// Root page size above which crawling slows down
pub const LARGE_PAGE_BYTES: usize = 2 * 1024 * 1024;

/// Signals the estimator looks at
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BudgetInputs {
    pub root_load_time_ms: Option<u64>,
    pub root_size_bytes: Option<usize>,
    pub robots_exists: bool,
    pub sitemap_exists: bool,
    pub root_noindex: bool,
}

/// One deduction applied to the budget score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetFactor {
    pub name: String,
    pub penalty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlBudget {
    pub score: u32,
    pub estimated_budget: u64,
    pub factors: Vec<BudgetFactor>,
    pub recommendations: Vec<String>,
}

impl Default for CrawlBudget {
    fn default() -> Self {
        estimate_crawl_budget(&BudgetInputs {
            robots_exists: true,
            sitemap_exists: true,
            ..Default::default()
        })
    }
}

/// Estimates the crawl budget
///
/// Starts at 100 and deducts a fixed penalty per problem, never below 0.
/// `estimated_budget = max(100, round(1000 * score / 100))`.
pub fn estimate_crawl_budget(inputs: &BudgetInputs) -> CrawlBudget {
    let mut deductions: Vec<(&str, u32, &str)> = Vec::new();

    if inputs.root_load_time_ms.is_some_and(|ms| ms > SLOW_LOAD_MS) {
        deductions.push((
            "slow_root_load",
            20,
            "Reduce server response and page load time below 3 seconds so crawlers fetch more pages per visit",
        ));
    }
    if inputs.root_size_bytes.is_some_and(|bytes| bytes > LARGE_PAGE_BYTES) {
        deductions.push((
            "oversized_root_page",
            15,
            "Trim the root page below 2 MB by deferring heavy scripts and inline assets",
        ));
    }
    if !inputs.robots_exists {
        deductions.push((
            "missing_robots_txt",
            10,
            "Publish robots.txt so crawlers can skip low-value URLs",
        ));
    }
    if !inputs.sitemap_exists {
        deductions.push((
            "missing_sitemap",
            15,
            "Publish a sitemap so crawlers discover pages without following every link",
        ));
    }
    if inputs.root_noindex {
        deductions.push((
            "noindex_root",
            30,
            "Remove noindex from the root page so the crawl budget is spent on indexable content",
        ));
    }

    let total: u32 = deductions.iter().map(|(_, penalty, _)| penalty).sum();
    let score = 100u32.saturating_sub(total);
    let estimated_budget = MIN_BUDGET.max((BASELINE_BUDGET as f64 * score as f64 / 100.0).round() as u64);

    CrawlBudget {
        score,
        estimated_budget,
        factors: deductions
            .iter()
            .map(|(name, penalty, _)| BudgetFactor {
                name: name.to_string(),
                penalty: *penalty,
            })
            .collect(),
        recommendations: deductions
            .into_iter()
            .map(|(_, _, recommendation)| recommendation.to_string())
            .collect(),
    }
}
