use serde::Deserialize;

/// Main configuration structure for Sumi-Audit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub links: LinkCheckConfig,
    pub content: ContentConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the root URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of distinct pages fetched in one run
    #[serde(rename = "max-pages")]
    pub max_pages: usize,

    /// Skip URLs that robots.txt disallows for our crawler name
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,

    /// Minimum time between page fetches (milliseconds)
    #[serde(rename = "min-request-interval-ms")]
    pub min_request_interval_ms: u64,

    /// Upper bound applied to a robots.txt Crawl-delay (milliseconds)
    #[serde(rename = "max-crawl-delay-ms")]
    pub max_crawl_delay_ms: u64,

    /// Stop crawling new pages once this many seconds have elapsed
    #[serde(rename = "deadline-secs")]
    pub deadline_secs: Option<u64>,

    /// Timeout for a single page, robots.txt or sitemap request (milliseconds)
    #[serde(rename = "page-timeout-ms")]
    pub page_timeout_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 50,
            respect_robots_txt: false,
            min_request_interval_ms: 0,
            max_crawl_delay_ms: 5_000,
            deadline_secs: None,
            page_timeout_ms: 15_000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the declared identity: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn user_agent_string(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SumiAudit".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/sumi-audit".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

/// Link integrity and redirect checking configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkCheckConfig {
    #[serde(rename = "check-broken-links")]
    pub check_broken_links: bool,

    #[serde(rename = "check-redirects")]
    pub check_redirects: bool,

    /// Concurrent HEAD requests per batch for same-site links
    #[serde(rename = "internal-batch-size")]
    pub internal_batch_size: usize,

    /// Concurrent HEAD requests per batch for off-site links
    #[serde(rename = "external-batch-size")]
    pub external_batch_size: usize,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Pause enforced between two batches (milliseconds)
    #[serde(rename = "batch-pause-ms")]
    pub batch_pause_ms: u64,

    /// Maximum redirect hops followed when resolving a chain
    #[serde(rename = "max-redirect-hops")]
    pub max_redirect_hops: usize,

    /// Maximum distinct internal targets probed
    #[serde(rename = "max-internal-links")]
    pub max_internal_links: usize,

    /// Maximum distinct external targets probed
    #[serde(rename = "max-external-links")]
    pub max_external_links: usize,
}

impl Default for LinkCheckConfig {
    fn default() -> Self {
        Self {
            check_broken_links: true,
            check_redirects: true,
            internal_batch_size: 10,
            external_batch_size: 5,
            request_timeout_ms: 10_000,
            batch_pause_ms: 1_000,
            max_redirect_hops: 5,
            max_internal_links: 200,
            max_external_links: 100,
        }
    }
}

/// Content and anchor analysis configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    #[serde(rename = "check-similarity")]
    pub check_similarity: bool,

    /// Pairs at or above this similarity are reported
    #[serde(rename = "similarity-threshold")]
    pub similarity_threshold: f64,

    /// Keywords used for exact/partial anchor matching; slug words when empty
    #[serde(rename = "target-keywords")]
    pub target_keywords: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            check_similarity: true,
            similarity_threshold: 0.8,
            target_keywords: Vec::new(),
        }
    }
}

/// Score deductions and bonuses
///
/// The magnitudes are tunable; only their ordering is meaningful
/// (blocking >= critical > warning > minor).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Critical issues that keep the whole site out of the index
    #[serde(rename = "blocking-penalty")]
    pub blocking_penalty: u32,

    #[serde(rename = "critical-penalty")]
    pub critical_penalty: u32,

    #[serde(rename = "warning-penalty")]
    pub warning_penalty: u32,

    #[serde(rename = "minor-penalty")]
    pub minor_penalty: u32,

    #[serde(rename = "robots-bonus")]
    pub robots_bonus: u32,

    #[serde(rename = "sitemap-bonus")]
    pub sitemap_bonus: u32,

    #[serde(rename = "canonical-bonus")]
    pub canonical_bonus: u32,

    #[serde(rename = "single-h1-bonus")]
    pub single_h1_bonus: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            blocking_penalty: 25,
            critical_penalty: 20,
            warning_penalty: 10,
            minor_penalty: 2,
            robots_bonus: 5,
            sitemap_bonus: 10,
            canonical_bonus: 5,
            single_h1_bonus: 5,
        }
    }
}

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Report destination; standard output when unset
    pub path: Option<String>,
}
