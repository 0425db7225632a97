//! Root-page technical factors and site-wide on-page issues

use crate::analysis::budget::{LARGE_PAGE_BYTES, SLOW_LOAD_MS};
use crate::analysis::{Issue, IssueKind};
use crate::crawler::{CrawlResult, CrawledPage};
use crate::robots::RobotsPolicy;
use crate::url::normalize_key;
use serde::Serialize;
use url::Url;

/// Number of example URLs quoted in issue descriptions
const EXAMPLE_URLS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalStatus {
    SelfReferencing,
    CrossCanonical,
    Missing,
    #[default]
    Unknown,
}

/// Signals measured on the root page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TechnicalFactors {
    pub https: bool,
    pub status_code: Option<u16>,
    pub load_time_ms: Option<u64>,
    pub page_size_bytes: Option<usize>,
    pub title_present: bool,
    pub meta_description_present: bool,
    pub h1_count: usize,
    pub canonical_status: CanonicalStatus,
    pub images_total: usize,
    pub images_missing_alt: usize,
    pub indexable: bool,
}

impl TechnicalFactors {
    /// Reads the factors off the root page; `None` means it never answered
    pub fn from_root(root: &Url, page: Option<&CrawledPage>) -> Self {
        let Some(page) = page else {
            return Self {
                https: root.scheme() == "https",
                ..Default::default()
            };
        };

        let https = Url::parse(&page.final_url)
            .map(|u| u.scheme() == "https")
            .unwrap_or(root.scheme() == "https");

        let canonical_status = if !page.was_extracted() {
            CanonicalStatus::Unknown
        } else {
            match &page.signals.canonical_url {
                None => CanonicalStatus::Missing,
                Some(c) if normalize_key(c) == normalize_key(&page.final_url) => {
                    CanonicalStatus::SelfReferencing
                }
                Some(_) => CanonicalStatus::CrossCanonical,
            }
        };

        Self {
            https,
            status_code: Some(page.http_status),
            load_time_ms: Some(page.load_time_ms),
            page_size_bytes: Some(page.content_length),
            title_present: page.signals.title.is_some(),
            meta_description_present: page.signals.meta_description.is_some(),
            h1_count: page.signals.heading_counts.h1,
            canonical_status,
            images_total: page.signals.images.len(),
            images_missing_alt: page.signals.images.iter().filter(|i| !i.has_alt).count(),
            indexable: page.is_indexable,
        }
    }
}

/// A crawled page that answered with an error status
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorPage {
    pub url: String,
    pub status_code: u16,
    pub depth: u32,
}

/// Pages answering 4xx or 5xx
pub fn error_pages(pages: &[CrawledPage]) -> Vec<ErrorPage> {
    pages
        .iter()
        .filter(|p| p.http_status >= 400)
        .map(|p| ErrorPage {
            url: p.url.clone(),
            status_code: p.http_status,
            depth: p.depth,
        })
        .collect()
}

fn examples<'a>(urls: impl Iterator<Item = &'a str>) -> String {
    urls.take(EXAMPLE_URLS).collect::<Vec<_>>().join(", ")
}

/// Issues about the root page itself
fn root_issues(factors: &TechnicalFactors, crawl: &CrawlResult, root: &Url) -> Vec<Issue> {
    let mut issues = Vec::new();

    let Some(page) = crawl.root_page() else {
        let root_key = normalize_key(root.as_str());
        let issue = if crawl.blocked.iter().any(|url| normalize_key(url) == root_key) {
            Issue::new(
                IssueKind::RootUnreachable,
                format!("The root URL {} was not fetched: robots.txt disallows it", root),
                "Allow crawlers to fetch the root URL in robots.txt",
                1,
            )
        } else {
            let reason = crawl
                .unreachable
                .first()
                .map(|u| u.reason.clone())
                .unwrap_or_else(|| "no response".to_string());
            Issue::new(
                IssueKind::RootUnreachable,
                format!("The root URL {} could not be fetched: {}", root, reason),
                "Make sure the site is online and reachable by crawlers",
                1,
            )
        };
        issues.push(issue);
        return issues;
    };

    if !page.is_success() {
        issues.push(Issue::new(
            IssueKind::RootHttpError,
            format!("The root URL answered HTTP {}", page.http_status),
            "Serve the home page with a 200 status",
            1,
        ));
    }

    if page.has_noindex() {
        issues.push(Issue::new(
            IssueKind::RootNoindex,
            "The root page carries a noindex directive (meta robots or X-Robots-Tag)",
            "Review noindex directive on the root page and remove it unless the site must stay out of search results",
            1,
        ));
    }

    if !factors.https {
        issues.push(Issue::new(
            IssueKind::InsecureRoot,
            format!("The root page is served over plain HTTP ({})", page.final_url),
            "Serve the site over HTTPS and redirect HTTP to it",
            1,
        ));
    }

    if factors.load_time_ms.is_some_and(|ms| ms > SLOW_LOAD_MS) {
        issues.push(Issue::new(
            IssueKind::SlowRootPage,
            format!(
                "The root page took {} ms to load",
                factors.load_time_ms.unwrap_or_default()
            ),
            "Reduce server response time and page weight to load in under 3 seconds",
            1,
        ));
    }

    if factors.page_size_bytes.is_some_and(|bytes| bytes > LARGE_PAGE_BYTES) {
        issues.push(Issue::new(
            IssueKind::LargeRootPage,
            format!(
                "The root page is {} KB",
                factors.page_size_bytes.unwrap_or_default() / 1024
            ),
            "Keep the root HTML under 2 MB",
            1,
        ));
    }

    issues
}

/// Adds a site-wide issue if any page matches `predicate`
fn page_issue(
    issues: &mut Vec<Issue>,
    pages: &[&CrawledPage],
    kind: IssueKind,
    what: &str,
    recommendation: &str,
    predicate: impl Fn(&CrawledPage) -> bool,
) {
    let matching: Vec<&CrawledPage> = pages.iter().copied().filter(|p| predicate(p)).collect();
    if matching.is_empty() {
        return;
    }
    issues.push(Issue::new(
        kind,
        format!(
            "{} pages {}: {}",
            matching.len(),
            what,
            examples(matching.iter().map(|p| p.final_url.as_str()))
        ),
        recommendation,
        matching.len(),
    ));
}

/// Collects root and site-wide technical issues
///
/// # Arguments
///
/// * `root` - The audited root URL
/// * `crawl` - Crawl output
/// * `factors` - Root-page factors
/// * `robots` - The site's robots policy
/// * `user_agent` - Agent token checked against robots.txt
pub fn technical_issues(
    root: &Url,
    crawl: &CrawlResult,
    factors: &TechnicalFactors,
    robots: &RobotsPolicy,
    user_agent: &str,
) -> Vec<Issue> {
    let mut issues = root_issues(factors, crawl, root);
    let extracted: Vec<&CrawledPage> = crawl.pages.iter().filter(|p| p.was_extracted()).collect();

    page_issue(
        &mut issues,
        &extracted,
        IssueKind::MissingTitles,
        "have no <title>",
        "Give every page a unique, descriptive title",
        |p| p.signals.title.is_none(),
    );
    page_issue(
        &mut issues,
        &extracted,
        IssueKind::MissingMetaDescriptions,
        "have no meta description",
        "Write a meta description of 120-160 characters for every page",
        |p| p.signals.meta_description.is_none(),
    );
    page_issue(
        &mut issues,
        &extracted,
        IssueKind::MissingH1,
        "have no H1 heading",
        "Add exactly one H1 heading describing each page",
        |p| p.signals.heading_counts.h1 == 0,
    );
    page_issue(
        &mut issues,
        &extracted,
        IssueKind::MultipleH1,
        "have more than one H1 heading",
        "Keep a single H1 per page and use H2-H6 for sections",
        |p| p.signals.heading_counts.h1 > 1,
    );

    let missing_alt: usize = extracted
        .iter()
        .map(|p| p.signals.images.iter().filter(|i| !i.has_alt).count())
        .sum();
    if missing_alt > 0 {
        issues.push(Issue::new(
            IssueKind::ImagesMissingAlt,
            format!("{} images have no alt attribute", missing_alt),
            "Add alt text to meaningful images and alt=\"\" to decorative ones",
            missing_alt,
        ));
    }

    let errors = error_pages(&crawl.pages);
    if !errors.is_empty() {
        issues.push(Issue::new(
            IssueKind::ErrorPages,
            format!(
                "{} crawled pages answered with an error status: {}",
                errors.len(),
                examples(errors.iter().map(|e| e.url.as_str()))
            ),
            "Fix or redirect pages returning 4xx/5xx and update links pointing to them",
            errors.len(),
        ));
    }

    let unreachable: Vec<&str> = crawl
        .unreachable
        .iter()
        .filter(|u| u.depth > 0)
        .map(|u| u.url.as_str())
        .collect();
    if !unreachable.is_empty() {
        issues.push(Issue::new(
            IssueKind::UnreachablePages,
            format!(
                "{} linked pages could not be fetched: {}",
                unreachable.len(),
                examples(unreachable.iter().copied())
            ),
            "Check server stability and remove links to hosts that do not respond",
            unreachable.len(),
        ));
    }

    let mut blocked: Vec<&str> = crawl.blocked.iter().map(String::as_str).collect();
    blocked.extend(
        crawl
            .pages
            .iter()
            .filter(|p| !robots.is_allowed(&p.url, user_agent))
            .map(|p| p.url.as_str()),
    );
    if !blocked.is_empty() && !robots.parsed.blocks_all() {
        issues.push(Issue::new(
            IssueKind::BlockedByRobots,
            format!(
                "{} linked pages are disallowed by robots.txt: {}",
                blocked.len(),
                examples(blocked.iter().copied())
            ),
            "Confirm that internally linked pages blocked by robots.txt are meant to be hidden",
            blocked.len(),
        ));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::duplicates::tests::page;
    use crate::crawler::{ImageInfo, UnreachablePage};
    use crate::fetch::FetchFailureKind;

    fn root() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    fn good_root() -> CrawledPage {
        let mut p = page("https://example.com/", Some("Home"), "welcome text");
        p.signals.meta_description = Some("About the site".to_string());
        p.signals.heading_counts.h1 = 1;
        p.signals.canonical_url = Some("https://example.com/".to_string());
        p
    }

    fn crawl(pages: Vec<CrawledPage>) -> CrawlResult {
        CrawlResult {
            pages,
            ..Default::default()
        }
    }

    fn robots() -> RobotsPolicy {
        RobotsPolicy::from_content("https://example.com/robots.txt", "User-agent: *\nAllow: /")
    }

    fn issues_for(result: &CrawlResult) -> Vec<Issue> {
        let factors = TechnicalFactors::from_root(&root(), result.root_page());
        technical_issues(&root(), result, &factors, &robots(), "SumiAudit")
    }

    #[test]
    fn test_healthy_root_has_no_issues() {
        let result = crawl(vec![good_root()]);
        let factors = TechnicalFactors::from_root(&root(), result.root_page());

        assert!(factors.https);
        assert_eq!(factors.status_code, Some(200));
        assert_eq!(factors.h1_count, 1);
        assert_eq!(factors.canonical_status, CanonicalStatus::SelfReferencing);
        assert!(factors.indexable);
        assert!(issues_for(&result).is_empty());
    }

    #[test]
    fn test_unreachable_root() {
        let result = CrawlResult {
            unreachable: vec![UnreachablePage {
                url: "https://example.com/".to_string(),
                depth: 0,
                kind: FetchFailureKind::Network,
                reason: "network error: refused".to_string(),
            }],
            ..Default::default()
        };

        let issues = issues_for(&result);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::RootUnreachable);
        assert!(issues[0].description.contains("refused"));
    }

    #[test]
    fn test_root_blocked_by_robots() {
        let result = CrawlResult {
            blocked: vec!["https://example.com/".to_string()],
            ..Default::default()
        };

        let issues = issues_for(&result);
        let root_issue = issues
            .iter()
            .find(|i| i.kind == IssueKind::RootUnreachable)
            .unwrap();
        assert!(root_issue.description.contains("robots.txt disallows it"));
        assert!(!root_issue.description.contains("no response"));
        assert!(root_issue.recommendation.contains("robots.txt"));
    }

    #[test]
    fn test_root_error_status_and_noindex() {
        let mut root_page = good_root();
        root_page.http_status = 503;
        root_page.signals.meta_robots.insert("noindex".to_string());

        let issues = issues_for(&crawl(vec![root_page]));
        assert!(issues.iter().any(|i| i.kind == IssueKind::RootHttpError));
        let noindex = issues.iter().find(|i| i.kind == IssueKind::RootNoindex).unwrap();
        assert!(noindex
            .recommendation
            .to_lowercase()
            .contains("review noindex directive"));
    }

    #[test]
    fn test_insecure_slow_and_large_root() {
        let mut root_page = good_root();
        root_page.final_url = "http://example.com/".to_string();
        root_page.signals.canonical_url = Some("http://example.com/".to_string());
        root_page.load_time_ms = 4500;
        root_page.content_length = 3 * 1024 * 1024;

        let issues = issues_for(&crawl(vec![root_page]));
        let kinds: Vec<IssueKind> = issues.iter().map(|i| i.kind).collect();
        assert!(kinds.contains(&IssueKind::InsecureRoot));
        assert!(kinds.contains(&IssueKind::SlowRootPage));
        assert!(kinds.contains(&IssueKind::LargeRootPage));
    }

    #[test]
    fn test_site_wide_on_page_issues() {
        let mut bare = page("https://example.com/bare", None, "x");
        bare.depth = 1;
        bare.signals.heading_counts.h1 = 2;
        bare.signals.images = vec![
            ImageInfo {
                src: "https://example.com/a.png".to_string(),
                has_alt: false,
            },
            ImageInfo {
                src: "https://example.com/b.png".to_string(),
                has_alt: true,
            },
        ];
        let mut missing = page("https://example.com/missing", None, "");
        missing.depth = 1;
        missing.http_status = 404;

        let issues = issues_for(&crawl(vec![good_root(), bare, missing]));
        let find = |kind| issues.iter().find(|i| i.kind == kind);

        assert_eq!(find(IssueKind::MissingTitles).unwrap().affected_count, 1);
        assert_eq!(find(IssueKind::MissingMetaDescriptions).unwrap().affected_count, 1);
        assert_eq!(find(IssueKind::MultipleH1).unwrap().affected_count, 1);
        assert!(find(IssueKind::MissingH1).is_none());
        assert_eq!(find(IssueKind::ImagesMissingAlt).unwrap().affected_count, 1);
        assert_eq!(find(IssueKind::ErrorPages).unwrap().affected_count, 1);
    }

    #[test]
    fn test_blocked_pages_reported() {
        let mut private = page("https://example.com/private/a", Some("P"), "x");
        private.depth = 1;
        let result = CrawlResult {
            pages: vec![good_root(), private],
            blocked: vec!["https://example.com/private/b".to_string()],
            ..Default::default()
        };
        let robots = RobotsPolicy::from_content(
            "https://example.com/robots.txt",
            "User-agent: *\nDisallow: /private",
        );
        let factors = TechnicalFactors::from_root(&root(), result.root_page());

        let issues = technical_issues(&root(), &result, &factors, &robots, "SumiAudit");
        let blocked = issues
            .iter()
            .find(|i| i.kind == IssueKind::BlockedByRobots)
            .unwrap();
        assert_eq!(blocked.affected_count, 2);
    }

    #[test]
    fn test_error_pages_listed() {
        let mut gone = page("https://example.com/gone", None, "");
        gone.http_status = 410;
        gone.depth = 2;

        let errors = error_pages(&[good_root(), gone]);
        assert_eq!(
            errors,
            vec![ErrorPage {
                url: "https://example.com/gone".to_string(),
                status_code: 410,
                depth: 2,
            }]
        );
    }
}
