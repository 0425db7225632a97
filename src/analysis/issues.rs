//! Typed, severity-tagged findings shared by every analyzer

use serde::Serialize;
use std::fmt;

/// How much an issue matters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Minor,
}

impl Severity {
    /// Recommendation priority derived from severity
    pub fn priority(&self) -> Priority {
        match self {
            Severity::Critical => Priority::High,
            Severity::Warning => Priority::Medium,
            Severity::Minor => Priority::Low,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Minor => write!(f, "minor"),
        }
    }
}

/// Ordering key for recommendations (`High` sorts first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Every issue type the auditor can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    // Blocking: the site cannot be indexed at all
    AnalysisFailed,
    RootUnreachable,
    RobotsBlocksAll,
    RootNoindex,

    // Critical
    RootHttpError,
    MissingSitemap,
    BrokenInternalLinks,

    // Warnings
    MissingRobotsTxt,
    RobotsTxtOversized,
    EmptySitemap,
    InsecureRoot,
    SlowRootPage,
    LargeRootPage,
    ErrorPages,
    UnreachablePages,
    MissingTitles,
    MissingMetaDescriptions,
    MissingH1,
    DuplicateTitles,
    DuplicateMetaDescriptions,
    DuplicateH1,
    MissingCanonical,
    SimilarContent,
    BrokenExternalLinks,
    LongRedirectChains,
    RedirectLoops,
    ImagesMissingAlt,
    EmptyAnchorText,
    AnchorOverOptimization,

    // Minor
    MultipleH1,
    CrossCanonical,
    TemporaryRedirects,
    SitemapParseErrors,
    HighCrawlDelay,
    BlockedByRobots,
}

impl IssueKind {
    /// Stable snake_case identifier, also used as the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::AnalysisFailed => "analysis_failed",
            IssueKind::RootUnreachable => "root_unreachable",
            IssueKind::RobotsBlocksAll => "robots_blocks_all",
            IssueKind::RootNoindex => "root_noindex",
            IssueKind::RootHttpError => "root_http_error",
            IssueKind::MissingSitemap => "missing_sitemap",
            IssueKind::BrokenInternalLinks => "broken_internal_links",
            IssueKind::MissingRobotsTxt => "missing_robots_txt",
            IssueKind::RobotsTxtOversized => "robots_txt_oversized",
            IssueKind::EmptySitemap => "empty_sitemap",
            IssueKind::InsecureRoot => "insecure_root",
            IssueKind::SlowRootPage => "slow_root_page",
            IssueKind::LargeRootPage => "large_root_page",
            IssueKind::ErrorPages => "error_pages",
            IssueKind::UnreachablePages => "unreachable_pages",
            IssueKind::MissingTitles => "missing_titles",
            IssueKind::MissingMetaDescriptions => "missing_meta_descriptions",
            IssueKind::MissingH1 => "missing_h1",
            IssueKind::DuplicateTitles => "duplicate_titles",
            IssueKind::DuplicateMetaDescriptions => "duplicate_meta_descriptions",
            IssueKind::DuplicateH1 => "duplicate_h1",
            IssueKind::MissingCanonical => "missing_canonical",
            IssueKind::SimilarContent => "similar_content",
            IssueKind::BrokenExternalLinks => "broken_external_links",
            IssueKind::LongRedirectChains => "long_redirect_chains",
            IssueKind::RedirectLoops => "redirect_loops",
            IssueKind::ImagesMissingAlt => "images_missing_alt",
            IssueKind::EmptyAnchorText => "empty_anchor_text",
            IssueKind::AnchorOverOptimization => "anchor_over_optimization",
            IssueKind::MultipleH1 => "multiple_h1",
            IssueKind::CrossCanonical => "cross_canonical",
            IssueKind::TemporaryRedirects => "temporary_redirects",
            IssueKind::SitemapParseErrors => "sitemap_parse_errors",
            IssueKind::HighCrawlDelay => "high_crawl_delay",
            IssueKind::BlockedByRobots => "blocked_by_robots",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::AnalysisFailed
            | IssueKind::RootUnreachable
            | IssueKind::RobotsBlocksAll
            | IssueKind::RootNoindex
            | IssueKind::RootHttpError
            | IssueKind::MissingSitemap
            | IssueKind::BrokenInternalLinks => Severity::Critical,

            IssueKind::MultipleH1
            | IssueKind::CrossCanonical
            | IssueKind::TemporaryRedirects
            | IssueKind::SitemapParseErrors
            | IssueKind::HighCrawlDelay
            | IssueKind::BlockedByRobots => Severity::Minor,

            _ => Severity::Warning,
        }
    }

    /// Critical issues that keep the entire site out of search results
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            IssueKind::AnalysisFailed
                | IssueKind::RootUnreachable
                | IssueKind::RobotsBlocksAll
                | IssueKind::RootNoindex
        )
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single finding contributed by an analyzer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub severity: Severity,
    pub description: String,
    pub recommendation: String,
    pub affected_count: usize,
}

impl Issue {
    /// Creates an issue whose severity follows from its kind
    pub fn new(
        kind: IssueKind,
        description: impl Into<String>,
        recommendation: impl Into<String>,
        affected_count: usize,
    ) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            description: description.into(),
            recommendation: recommendation.into(),
            affected_count,
        }
    }
}
