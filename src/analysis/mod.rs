//! Analyzers and the aggregated report
//!
//! Every analyzer is total: it turns crawl output into typed [`Issue`]s and
//! never fails the run. The [`AnalysisReport`] collects their results once,
//! after which it is only read.

pub mod anchors;
pub mod budget;
pub mod duplicates;
pub mod issues;
pub mod links;
pub mod redirects;
pub mod scoring;
pub mod technical;

pub use anchors::{analyze_anchors, classify_anchor, AnchorAnalysis, AnchorBucket, AnchorCounts};
pub use budget::{estimate_crawl_budget, BudgetFactor, BudgetInputs, CrawlBudget};
pub use duplicates::{
    analyze_duplicates, CanonicalAudit, DuplicateContentReport, DuplicateGroup, DuplicateKey,
    SimilarPagePair,
};
pub use issues::{Issue, IssueKind, Priority, Severity};
pub use links::{check_link_integrity, LinkClassification, LinkIntegrityReport, LinkRecord, LinkStatus};
pub use redirects::{RedirectChain, RedirectHop, RedirectSummary, RedirectType};
pub use scoring::{build_recommendations, compute_score, Recommendation, ScoreBonuses};
pub use technical::{error_pages, technical_issues, CanonicalStatus, ErrorPage, TechnicalFactors};

use crate::crawler::CrawlResult;
use crate::robots::RobotsPolicy;
use crate::sitemap::SitemapSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The complete result of one audit
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub root_url: String,
    pub domain: String,
    pub timestamp: DateTime<Utc>,
    pub robots: RobotsPolicy,
    pub sitemap: SitemapSummary,
    pub crawl: CrawlResult,
    pub duplicate_content: DuplicateContentReport,
    pub error_pages: Vec<ErrorPage>,
    pub link_integrity: LinkIntegrityReport,
    pub anchors: AnchorAnalysis,
    pub technical_factors: TechnicalFactors,
    pub crawl_budget: CrawlBudget,
    /// Every issue raised, in analyzer order
    pub issues: Vec<Issue>,
    pub score: u8,
    pub recommendations: Vec<Recommendation>,
}

impl AnalysisReport {
    pub fn issues_of(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |i| i.severity == severity)
    }

    pub fn has_issue(&self, kind: IssueKind) -> bool {
        self.issues.iter().any(|i| i.kind == kind)
    }
}
