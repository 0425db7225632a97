//! Link integrity checking
//!
//! This module handles:
//! - Building one [`LinkRecord`] per distinct link target
//! - Probing targets with HEAD (GET fallback) in fixed-size batches
//! - Resolving redirect chains for redirected links
//! - Aggregating broken-link issues

use crate::analysis::redirects::{resolve_chain, RedirectHop, RedirectSummary};
use crate::analysis::{Issue, IssueKind};
use crate::config::LinkCheckConfig;
use crate::crawler::CrawledPage;
use crate::fetch::{FetchFailure, FetchFailureKind, FetchGateway, HttpResponse, Method};
use crate::url::normalize_key;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

/// Number of example URLs quoted in issue descriptions
const EXAMPLE_URLS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkClassification {
    Internal,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Valid,
    Broken,
    Redirect,
    Unknown,
}

/// A link target and what probing it revealed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkRecord {
    pub source_url: String,
    pub target_url: String,
    pub anchor_text: String,
    pub classification: LinkClassification,
    pub status: LinkStatus,
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FetchFailureKind>,
    pub redirect_chain: Vec<RedirectHop>,
    pub issues: Vec<String>,
    #[serde(skip)]
    location: Option<String>,
}

impl LinkRecord {
    pub fn new(
        source_url: &str,
        target_url: &str,
        anchor_text: &str,
        classification: LinkClassification,
    ) -> Self {
        Self {
            source_url: source_url.to_string(),
            target_url: target_url.to_string(),
            anchor_text: anchor_text.to_string(),
            classification,
            status: LinkStatus::Unknown,
            status_code: None,
            failure: None,
            redirect_chain: Vec::new(),
            issues: Vec::new(),
            location: None,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.status == LinkStatus::Broken
    }

    /// Applies a probe outcome, moving the record out of `Unknown`
    fn classify(&mut self, outcome: Result<HttpResponse, FetchFailure>) {
        match outcome {
            Ok(response) => {
                let code = response.status_code;
                self.status_code = Some(code);
                if response.is_success() {
                    self.status = LinkStatus::Valid;
                } else if response.is_redirect() {
                    self.status = LinkStatus::Redirect;
                    self.location = response.location().map(str::to_string);
                    self.redirect_chain = vec![RedirectHop::new(&self.target_url, code)];
                } else {
                    self.status = LinkStatus::Broken;
                    self.issues.push(format!("HTTP {}", code));
                }
            }
            Err(failure) => {
                self.status = LinkStatus::Broken;
                self.failure = Some(failure.kind);
                self.issues.push(if failure.is_timeout() {
                    format!("timed out ({})", failure.message)
                } else {
                    failure.to_string()
                });
            }
        }
    }
}

/// Link integrity findings
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkIntegrityReport {
    pub records: Vec<LinkRecord>,
    pub internal_total: usize,
    pub external_total: usize,
    pub broken_internal: usize,
    pub broken_external: usize,
    pub redirected: usize,
    pub timeouts: usize,
    pub redirects: RedirectSummary,
    pub issues: Vec<Issue>,
}

impl LinkIntegrityReport {
    pub fn broken(&self, classification: LinkClassification) -> impl Iterator<Item = &LinkRecord> {
        self.records
            .iter()
            .filter(move |r| r.classification == classification && r.is_broken())
    }
}

/// Builds one record per distinct target, keeping the first source seen
///
/// Targets are capped per classification, in crawl order.
pub fn collect_links(
    pages: &[CrawledPage],
    max_internal: usize,
    max_external: usize,
) -> Vec<LinkRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::new();
    let (mut internal, mut external) = (0usize, 0usize);

    for page in pages.iter().filter(|p| p.was_extracted()) {
        let groups = [
            (LinkClassification::Internal, &page.signals.internal_links),
            (LinkClassification::External, &page.signals.external_links),
        ];
        for (classification, links) in groups {
            for link in links {
                let (count, cap) = match classification {
                    LinkClassification::Internal => (&mut internal, max_internal),
                    LinkClassification::External => (&mut external, max_external),
                };
                if *count >= cap || !seen.insert(normalize_key(&link.url)) {
                    continue;
                }
                *count += 1;
                records.push(LinkRecord::new(
                    &page.final_url,
                    &link.url,
                    &link.anchor_text,
                    classification,
                ));
            }
        }
    }

    records
}

/// Runs `task` over `items` in batches of `batch_size`
///
/// Each batch is awaited completely before the next starts, and `pause` is
/// slept between batches. At most `batch_size` tasks are ever in flight.
pub async fn in_batches<T, F, Fut>(
    items: Vec<T>,
    batch_size: usize,
    pause: Duration,
    task: F,
) -> Vec<Fut::Output>
where
    F: Fn(T) -> Fut,
    Fut: Future,
{
    let batch_size = batch_size.max(1);
    let mut results = Vec::with_capacity(items.len());
    let mut items = items.into_iter().peekable();
    let mut batch_number = 0;

    while items.peek().is_some() {
        if batch_number > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        batch_number += 1;

        let batch: Vec<Fut> = items.by_ref().take(batch_size).map(&task).collect();
        tracing::trace!("Running batch {} ({} tasks)", batch_number, batch.len());
        results.extend(join_all(batch).await);
    }

    results
}

/// Issues a request bounded by `tokio::time::timeout`
async fn request<G: FetchGateway + ?Sized>(
    gateway: &G,
    url: &str,
    method: Method,
    timeout: Duration,
) -> Result<HttpResponse, FetchFailure> {
    match tokio::time::timeout(timeout, gateway.fetch(url, method, timeout)).await {
        Ok(outcome) => outcome,
        Err(_) => Err(FetchFailure::timeout(url, timeout)),
    }
}

/// HEAD probe, retried once with GET when HEAD is not supported (405/501)
pub async fn probe<G: FetchGateway + ?Sized>(
    gateway: &G,
    url: &str,
    timeout: Duration,
) -> Result<HttpResponse, FetchFailure> {
    let response = request(gateway, url, Method::Head, timeout).await?;
    if matches!(response.status_code, 405 | 501) {
        tracing::debug!("HEAD not supported by {}, retrying with GET", url);
        return request(gateway, url, Method::Get, timeout).await;
    }
    Ok(response)
}

/// Probes every record and classifies it
///
/// Internal and external records are checked in their own batch sizes.
pub async fn check_links<G: FetchGateway + ?Sized>(
    gateway: &G,
    records: Vec<LinkRecord>,
    config: &LinkCheckConfig,
) -> Vec<LinkRecord> {
    let timeout = Duration::from_millis(config.request_timeout_ms);
    let pause = Duration::from_millis(config.batch_pause_ms);

    let (internal, external): (Vec<LinkRecord>, Vec<LinkRecord>) = records
        .into_iter()
        .partition(|r| r.classification == LinkClassification::Internal);

    let check = |mut record: LinkRecord| async move {
        let outcome = probe(gateway, &record.target_url, timeout).await;
        record.classify(outcome);
        tracing::debug!(
            "Link {} -> {:?} ({:?})",
            record.target_url,
            record.status,
            record.status_code
        );
        record
    };

    let mut checked = in_batches(internal, config.internal_batch_size, pause, check).await;
    checked.extend(in_batches(external, config.external_batch_size, pause, check).await);
    checked
}

/// Resolves the full chain of every redirect-classified record
///
/// Chains are resolved in batches like link probes. Returns the records
/// (redirected ones last) and the chain summary.
pub async fn resolve_redirects<G: FetchGateway + ?Sized>(
    gateway: &G,
    records: Vec<LinkRecord>,
    config: &LinkCheckConfig,
) -> (Vec<LinkRecord>, RedirectSummary) {
    let timeout = Duration::from_millis(config.request_timeout_ms);
    let pause = Duration::from_millis(config.batch_pause_ms);
    let max_hops = config.max_redirect_hops;

    let (redirected, mut records): (Vec<LinkRecord>, Vec<LinkRecord>) = records
        .into_iter()
        .partition(|r| r.status == LinkStatus::Redirect);

    let resolved = in_batches(
        redirected,
        config.internal_batch_size,
        pause,
        |mut record: LinkRecord| async move {
            let first = record
                .status_code
                .map(|code| (code, record.location.clone()));
            let chain = resolve_chain(gateway, &record.target_url, first, max_hops, timeout).await;

            if chain.is_loop() {
                record.issues.push("redirect loop".to_string());
            } else if chain.is_long() {
                record
                    .issues
                    .push(format!("long redirect chain ({} entries)", chain.len()));
            }
            if let Some(status) = chain.final_status().filter(|s| *s >= 400) {
                record
                    .issues
                    .push(format!("redirect ends in HTTP {}", status));
            }

            record.redirect_chain = chain.hops.clone();
            (record, chain)
        },
    )
    .await;

    let summary = RedirectSummary::from_chains(resolved.iter().map(|(_, chain)| chain));
    tracing::debug!("Resolved {} redirect chains", summary.chains);

    records.extend(resolved.into_iter().map(|(record, _)| record));
    (records, summary)
}

fn broken_issue(
    kind: IssueKind,
    label: &str,
    broken: &[&LinkRecord],
    recommendation: &str,
) -> Option<Issue> {
    if broken.is_empty() {
        return None;
    }

    let timeouts = broken
        .iter()
        .filter(|r| r.failure == Some(FetchFailureKind::Timeout))
        .count();
    let network = broken.iter().filter(|r| r.failure.is_some()).count() - timeouts;
    let examples: Vec<&str> = broken
        .iter()
        .take(EXAMPLE_URLS)
        .map(|r| r.target_url.as_str())
        .collect();

    let mut description = format!("{} broken {} links", broken.len(), label);
    if timeouts > 0 || network > 0 {
        description.push_str(&format!(
            " ({} timed out, {} network errors)",
            timeouts, network
        ));
    }
    description.push_str(&format!(": {}", examples.join(", ")));

    Some(Issue::new(kind, description, recommendation, broken.len()))
}

/// Builds the report from checked records
pub fn summarize_links(records: Vec<LinkRecord>, redirects: RedirectSummary) -> LinkIntegrityReport {
    let count = |c: LinkClassification| records.iter().filter(|r| r.classification == c).count();
    let internal_total = count(LinkClassification::Internal);
    let external_total = count(LinkClassification::External);

    let broken_internal: Vec<&LinkRecord> = records
        .iter()
        .filter(|r| r.classification == LinkClassification::Internal && r.is_broken())
        .collect();
    let broken_external: Vec<&LinkRecord> = records
        .iter()
        .filter(|r| r.classification == LinkClassification::External && r.is_broken())
        .collect();

    let mut issues = Vec::new();
    issues.extend(broken_issue(
        IssueKind::BrokenInternalLinks,
        "internal",
        &broken_internal,
        "Fix or remove internal links that point to missing pages",
    ));
    issues.extend(broken_issue(
        IssueKind::BrokenExternalLinks,
        "external",
        &broken_external,
        "Update or remove outbound links to unavailable pages",
    ));
    issues.extend(redirects.issues());

    LinkIntegrityReport {
        internal_total,
        external_total,
        broken_internal: broken_internal.len(),
        broken_external: broken_external.len(),
        redirected: records
            .iter()
            .filter(|r| r.status == LinkStatus::Redirect)
            .count(),
        timeouts: records
            .iter()
            .filter(|r| r.failure == Some(FetchFailureKind::Timeout))
            .count(),
        redirects,
        issues,
        records,
    }
}

/// Checks every link found on the crawled pages
///
/// # Arguments
///
/// * `gateway` - The gateway used for probes
/// * `pages` - Crawled pages
/// * `config` - Batch sizes, timeouts and caps
/// * `check_broken_links` - Report broken links
/// * `check_redirects` - Resolve redirect chains
pub async fn check_link_integrity<G: FetchGateway + ?Sized>(
    gateway: &G,
    pages: &[CrawledPage],
    config: &LinkCheckConfig,
    check_broken_links: bool,
    check_redirects: bool,
) -> LinkIntegrityReport {
    let mut records = collect_links(pages, config.max_internal_links, config.max_external_links);

    if !check_broken_links && !check_redirects {
        tracing::info!("Link checking disabled, {} links recorded", records.len());
        return summarize_links(records, RedirectSummary::default());
    }

    tracing::info!("Checking {} links", records.len());
    records = check_links(gateway, records, config).await;

    let mut redirects = RedirectSummary::default();
    if check_redirects {
        (records, redirects) = resolve_redirects(gateway, records, config).await;
    }

    let mut report = summarize_links(records, redirects);
    if !check_broken_links {
        report
            .issues
            .retain(|i| !matches!(i.kind, IssueKind::BrokenInternalLinks | IssueKind::BrokenExternalLinks));
    }

    tracing::info!(
        "Link check complete: {} broken internal, {} broken external, {} redirected",
        report.broken_internal,
        report.broken_external,
        report.redirected
    );

    report
}
