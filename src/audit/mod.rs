//! Audit orchestration
//!
//! [`Auditor::analyze`] runs one audit end to end:
//! 1. robots.txt is fetched (its `Sitemap:` lines feed the resolver)
//! 2. the sitemap is resolved while the site is crawled
//! 3. the analyzers run over the crawled pages
//! 4. issues are scored and turned into recommendations
//!
//! Only an invalid root URL is an error. A panic anywhere in the pipeline
//! yields a minimal failed report instead of propagating.

use crate::analysis::{
    analyze_anchors, analyze_duplicates, build_recommendations, check_link_integrity,
    compute_score, error_pages, estimate_crawl_budget, technical_issues, AnalysisReport,
    BudgetInputs, CanonicalStatus, Issue, IssueKind, ScoreBonuses, TechnicalFactors,
};
use crate::config::{validate, Config};
use crate::crawler::{CrawlResult, SiteCrawler};
use crate::fetch::{FetchGateway, HttpGateway};
use crate::robots::{fetch_robots_policy, robots_url, RobotsPolicy};
use crate::sitemap::{resolve_sitemap, SitemapSummary};
use crate::url::{extract_domain, validate_root_url};
use crate::AuditError;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use url::Url;

/// Parameters of one audit
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub root_url: String,
    pub max_depth: u32,
    pub max_pages: usize,
    pub check_similarity: bool,
    pub similarity_threshold: f64,
    pub check_redirects: bool,
    pub check_broken_links: bool,
}

impl AnalysisRequest {
    /// Request with the default limits (depth 2, 50 pages, every check on)
    pub fn new(root_url: impl Into<String>) -> Self {
        Self::from_config(root_url, &Config::default())
    }

    /// Request whose limits and switches come from a configuration
    pub fn from_config(root_url: impl Into<String>, config: &Config) -> Self {
        Self {
            root_url: root_url.into(),
            max_depth: config.crawler.max_depth,
            max_pages: config.crawler.max_pages,
            check_similarity: config.content.check_similarity,
            similarity_threshold: config.content.similarity_threshold,
            check_redirects: config.links.check_redirects,
            check_broken_links: config.links.check_broken_links,
        }
    }
}

/// Runs audits against one gateway
pub struct Auditor<G: FetchGateway = HttpGateway> {
    config: Config,
    gateway: G,
}

impl Auditor<HttpGateway> {
    /// Creates an auditor over a reqwest client carrying the configured identity
    ///
    /// The configuration is validated first.
    pub fn from_config(config: Config) -> Result<Self, AuditError> {
        validate(&config)?;
        let gateway = HttpGateway::new(&config.user_agent)?;
        Ok(Self::new(config, gateway))
    }
}

impl<G: FetchGateway> Auditor<G> {
    pub fn new(config: Config, gateway: G) -> Self {
        Self { config, gateway }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Audits the site at `request.root_url`
    ///
    /// # Returns
    ///
    /// * `Ok(AnalysisReport)` - The report, possibly a failed one if the pipeline panicked
    /// * `Err(AuditError::InvalidRootUrl)` - The root URL is unparseable, not http(s) or has no host
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AuditError> {
        let root = validate_root_url(&request.root_url).map_err(|e| AuditError::InvalidRootUrl {
            url: request.root_url.clone(),
            reason: e.to_string(),
        })?;

        match AssertUnwindSafe(self.run(&root, request)).catch_unwind().await {
            Ok(report) => Ok(report),
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Analysis of {} aborted: {}", root, reason);
                Ok(failed_report(&root, &reason))
            }
        }
    }

    async fn run(&self, root: &Url, request: &AnalysisRequest) -> AnalysisReport {
        let timeout = Duration::from_millis(self.config.crawler.page_timeout_ms);
        let agent = self.config.user_agent.crawler_name.as_str();
        tracing::info!(
            "Auditing {} (max depth {}, max pages {})",
            root,
            request.max_depth,
            request.max_pages
        );

        let robots = fetch_robots_policy(&self.gateway, root, timeout).await;

        let mut crawler_config = self.config.crawler.clone();
        crawler_config.max_depth = request.max_depth;
        crawler_config.max_pages = request.max_pages;
        let crawler = SiteCrawler::new(&self.gateway, crawler_config, agent).with_robots(&robots);

        let (sitemap, crawl) = tokio::join!(
            resolve_sitemap(&self.gateway, root, robots.sitemap_urls(), timeout),
            crawler.crawl(root)
        );
        tracing::info!(
            "Crawl finished: {} pages, {} unreachable in {} ms",
            crawl.pages.len(),
            crawl.unreachable.len(),
            crawl.duration_ms
        );

        let duplicate_content = analyze_duplicates(
            &crawl.pages,
            request.check_similarity,
            request.similarity_threshold,
        );
        let link_integrity = check_link_integrity(
            &self.gateway,
            &crawl.pages,
            &self.config.links,
            request.check_broken_links,
            request.check_redirects,
        )
        .await;
        let anchors = analyze_anchors(&crawl.pages, root, &self.config.content.target_keywords);

        let root_page = crawl.root_page();
        let technical_factors = TechnicalFactors::from_root(root, root_page);
        let technical = technical_issues(root, &crawl, &technical_factors, &robots, agent);

        let crawl_budget = estimate_crawl_budget(&BudgetInputs {
            root_load_time_ms: technical_factors.load_time_ms,
            root_size_bytes: technical_factors.page_size_bytes,
            robots_exists: robots.exists,
            sitemap_exists: sitemap.exists,
            root_noindex: root_page.is_some_and(|p| p.has_noindex()),
        });

        let issues: Vec<Issue> = robots
            .issues
            .iter()
            .chain(&sitemap.issues)
            .chain(&technical)
            .chain(&duplicate_content.issues)
            .chain(&link_integrity.issues)
            .chain(&anchors.issues)
            .cloned()
            .collect();

        let bonuses = ScoreBonuses {
            robots_present: robots.exists,
            sitemap_present: sitemap.exists,
            self_canonical_root: technical_factors.canonical_status
                == CanonicalStatus::SelfReferencing,
            single_root_h1: technical_factors.h1_count == 1,
        };
        let score = compute_score(&issues, bonuses, &self.config.scoring);
        let recommendations = build_recommendations(&issues, &crawl_budget);

        tracing::info!("Audit of {} scored {} with {} issues", root, score, issues.len());

        AnalysisReport {
            root_url: root.to_string(),
            domain: extract_domain(root).unwrap_or_default(),
            timestamp: chrono::Utc::now(),
            error_pages: error_pages(&crawl.pages),
            robots,
            sitemap,
            crawl,
            duplicate_content,
            link_integrity,
            anchors,
            technical_factors,
            crawl_budget,
            issues,
            score,
            recommendations,
        }
    }
}

/// Minimal report for a run that could not complete
fn failed_report(root: &Url, reason: &str) -> AnalysisReport {
    let issues = vec![Issue::new(
        IssueKind::AnalysisFailed,
        format!("The analysis stopped unexpectedly: {}", reason),
        "Retry the analysis; report the error if it persists",
        1,
    )];
    let crawl_budget = estimate_crawl_budget(&BudgetInputs::default());
    let recommendations = build_recommendations(&issues, &crawl_budget);

    AnalysisReport {
        root_url: root.to_string(),
        domain: extract_domain(root).unwrap_or_default(),
        timestamp: chrono::Utc::now(),
        robots: RobotsPolicy {
            url: robots_url(root),
            ..Default::default()
        },
        sitemap: SitemapSummary::default(),
        crawl: CrawlResult::default(),
        duplicate_content: Default::default(),
        error_pages: Vec::new(),
        link_integrity: Default::default(),
        anchors: Default::default(),
        technical_factors: TechnicalFactors::from_root(root, None),
        crawl_budget,
        issues,
        score: 0,
        recommendations,
    }
}
