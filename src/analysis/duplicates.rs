//! Duplicate and near-duplicate content detection
//!
//! This module handles:
//! - Grouping pages by identical title, meta description and H1
//! - Auditing canonical links
//! - Pairwise content similarity from fingerprints and word counts

use crate::analysis::{Issue, IssueKind};
use crate::crawler::CrawledPage;
use crate::url::normalize_key;
use serde::Serialize;
use std::collections::HashMap;

/// Similarity reported for near-identical pages that are not byte-identical
const SATURATED_SIMILARITY: f64 = 0.95;

/// Which on-page field a duplicate group was keyed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKey {
    Title,
    MetaDescription,
    H1,
}

/// Pages sharing the same value for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub key_type: DuplicateKey,
    pub key_value: String,
    /// Always more than one URL, in crawl order
    pub member_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossCanonical {
    pub url: String,
    pub canonical: String,
}

/// Canonical link status of every analyzed page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalAudit {
    pub missing: Vec<String>,
    pub self_referencing: Vec<String>,
    pub cross_canonical: Vec<CrossCanonical>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarPagePair {
    pub url_a: String,
    pub url_b: String,
    pub similarity: f64,
}

/// Duplicate content findings
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateContentReport {
    pub groups: Vec<DuplicateGroup>,
    pub canonical: CanonicalAudit,
    pub similar_pairs: Vec<SimilarPagePair>,
    pub issues: Vec<Issue>,
}

impl DuplicateContentReport {
    pub fn groups_of(&self, key: DuplicateKey) -> impl Iterator<Item = &DuplicateGroup> {
        self.groups.iter().filter(move |g| g.key_type == key)
    }
}

/// Pages whose signals were extracted (2xx HTML)
fn analyzed(pages: &[CrawledPage]) -> impl Iterator<Item = &CrawledPage> {
    pages.iter().filter(|p| p.was_extracted())
}

/// Groups pages by exact value of one field, in order of first appearance
fn group_by(
    pages: &[CrawledPage],
    key_type: DuplicateKey,
    field: impl Fn(&CrawledPage) -> Option<&String>,
) -> Vec<DuplicateGroup> {
    let mut order: Vec<String> = Vec::new();
    let mut members: HashMap<String, Vec<String>> = HashMap::new();

    for page in analyzed(pages) {
        let Some(value) = field(page).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
            continue;
        };
        let entry = members.entry(value.to_string()).or_insert_with(|| {
            order.push(value.to_string());
            Vec::new()
        });
        entry.push(page.final_url.clone());
    }

    order
        .into_iter()
        .filter_map(|value| {
            let urls = members.remove(&value)?;
            (urls.len() > 1).then(|| DuplicateGroup {
                key_type,
                key_value: value,
                member_urls: urls,
            })
        })
        .collect()
}

/// Finds duplicate titles, meta descriptions and H1s
pub fn find_duplicate_groups(pages: &[CrawledPage]) -> Vec<DuplicateGroup> {
    let mut groups = group_by(pages, DuplicateKey::Title, |p| p.signals.title.as_ref());
    groups.extend(group_by(pages, DuplicateKey::MetaDescription, |p| {
        p.signals.meta_description.as_ref()
    }));
    groups.extend(group_by(pages, DuplicateKey::H1, |p| p.signals.h1.as_ref()));
    groups
}

/// Partitions pages into missing, self-referencing and cross canonicals
pub fn audit_canonicals(pages: &[CrawledPage]) -> CanonicalAudit {
    let mut audit = CanonicalAudit::default();

    for page in analyzed(pages) {
        match &page.signals.canonical_url {
            None => audit.missing.push(page.final_url.clone()),
            Some(canonical) if normalize_key(canonical) == normalize_key(&page.final_url) => {
                audit.self_referencing.push(page.final_url.clone())
            }
            Some(canonical) => audit.cross_canonical.push(CrossCanonical {
                url: page.final_url.clone(),
                canonical: canonical.clone(),
            }),
        }
    }

    audit
}

/// Content similarity of two pages in [0, 1]
///
/// Identical fingerprints give exactly 1.0. Otherwise the word-count ratio
/// `1 - |a - b| / max(a, b)` is used, reported as 0.95 when above 0.9.
pub fn similarity(a: &CrawledPage, b: &CrawledPage) -> f64 {
    if a.signals.content_fingerprint == b.signals.content_fingerprint {
        return 1.0;
    }

    let (wa, wb) = (a.signals.word_count as f64, b.signals.word_count as f64);
    let max = wa.max(wb);
    if max == 0.0 {
        return 0.0;
    }

    let score = 1.0 - (wa - wb).abs() / max;
    if score > 0.9 {
        SATURATED_SIMILARITY
    } else {
        score
    }
}

/// Every unordered pair of analyzed pages at or above `threshold`, most similar first
pub fn find_similar_pages(pages: &[CrawledPage], threshold: f64) -> Vec<SimilarPagePair> {
    let candidates: Vec<&CrawledPage> = analyzed(pages).collect();
    let mut pairs = Vec::new();

    for (i, a) in candidates.iter().enumerate() {
        for b in &candidates[i + 1..] {
            let score = similarity(a, b);
            if score >= threshold {
                pairs.push(SimilarPagePair {
                    url_a: a.final_url.clone(),
                    url_b: b.final_url.clone(),
                    similarity: score,
                });
            }
        }
    }

    pairs.sort_by(|x, y| y.similarity.total_cmp(&x.similarity));
    pairs
}

fn duplicate_issue(kind: IssueKind, label: &str, groups: &[&DuplicateGroup]) -> Option<Issue> {
    if groups.is_empty() {
        return None;
    }
    let pages: usize = groups.iter().map(|g| g.member_urls.len()).sum();
    Some(Issue::new(
        kind,
        format!(
            "{} {} shared by {} pages (e.g. \"{}\")",
            groups.len(),
            label,
            pages,
            groups[0].key_value
        ),
        format!("Write a unique {} for every page", label.trim_end_matches('s')),
        pages,
    ))
}

/// Runs every duplicate-content check over the crawled pages
///
/// # Arguments
///
/// * `pages` - Crawled pages; only 2xx HTML pages are analyzed
/// * `check_similarity` - Whether to compute pairwise similarity
/// * `threshold` - Minimum similarity for a reported pair
pub fn analyze_duplicates(
    pages: &[CrawledPage],
    check_similarity: bool,
    threshold: f64,
) -> DuplicateContentReport {
    let groups = find_duplicate_groups(pages);
    let canonical = audit_canonicals(pages);
    let similar_pairs = if check_similarity {
        find_similar_pages(pages, threshold)
    } else {
        Vec::new()
    };

    let mut issues = Vec::new();

    let select = |key: DuplicateKey| -> Vec<&DuplicateGroup> {
        groups.iter().filter(|g| g.key_type == key).collect()
    };
    issues.extend(duplicate_issue(
        IssueKind::DuplicateTitles,
        "titles",
        &select(DuplicateKey::Title),
    ));
    issues.extend(duplicate_issue(
        IssueKind::DuplicateMetaDescriptions,
        "meta descriptions",
        &select(DuplicateKey::MetaDescription),
    ));
    issues.extend(duplicate_issue(
        IssueKind::DuplicateH1,
        "H1 headings",
        &select(DuplicateKey::H1),
    ));

    if !canonical.missing.is_empty() {
        issues.push(Issue::new(
            IssueKind::MissingCanonical,
            format!("{} pages have no canonical link", canonical.missing.len()),
            "Add a self-referencing <link rel=\"canonical\"> to every indexable page",
            canonical.missing.len(),
        ));
    }

    if !canonical.cross_canonical.is_empty() {
        issues.push(Issue::new(
            IssueKind::CrossCanonical,
            format!(
                "{} pages declare a canonical pointing to another URL",
                canonical.cross_canonical.len()
            ),
            "Confirm that cross-canonical pages are intentional duplicates of their targets",
            canonical.cross_canonical.len(),
        ));
    }

    if !similar_pairs.is_empty() {
        issues.push(Issue::new(
            IssueKind::SimilarContent,
            format!(
                "{} page pairs are at least {:.0}% similar",
                similar_pairs.len(),
                threshold * 100.0
            ),
            "Consolidate near-duplicate pages or differentiate their content",
            similar_pairs.len(),
        ));
    }

    tracing::debug!(
        "Duplicate analysis: {} groups, {} similar pairs, {} missing canonicals",
        groups.len(),
        similar_pairs.len(),
        canonical.missing.len()
    );

    DuplicateContentReport {
        groups,
        canonical,
        similar_pairs,
        issues,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crawler::{content_fingerprint, ExtractedPage};

    /// Builds a 200 HTML page for analyzer tests
    pub(crate) fn page(url: &str, title: Option<&str>, text: &str) -> CrawledPage {
        CrawledPage {
            url: url.to_string(),
            final_url: url.to_string(),
            redirected_from: Vec::new(),
            depth: 0,
            http_status: 200,
            content_type: Some("text/html".to_string()),
            load_time_ms: 10,
            content_length: text.len(),
            signals: ExtractedPage {
                title: title.map(str::to_string),
                word_count: text.split_whitespace().count(),
                content_fingerprint: content_fingerprint(text),
                ..Default::default()
            },
            is_indexable: true,
        }
    }

    #[test]
    fn test_shared_title_forms_group() {
        let pages = vec![
            page("https://example.com/", Some("Home"), "one"),
            page("https://example.com/a", Some("Home"), "two"),
            page("https://example.com/b", Some("About"), "three"),
        ];

        let groups = find_duplicate_groups(&pages);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key_type, DuplicateKey::Title);
        assert_eq!(groups[0].key_value, "Home");
        assert_eq!(
            groups[0].member_urls,
            vec!["https://example.com/", "https://example.com/a"]
        );
    }

    #[test]
    fn test_empty_titles_not_grouped() {
        let pages = vec![
            page("https://example.com/", Some("  "), "one"),
            page("https://example.com/a", None, "two"),
            page("https://example.com/b", None, "three"),
        ];
        assert!(find_duplicate_groups(&pages).is_empty());
    }

    #[test]
    fn test_error_pages_excluded() {
        let mut missing = page("https://example.com/404", Some("Home"), "x");
        missing.http_status = 404;
        let pages = vec![page("https://example.com/", Some("Home"), "x"), missing];

        assert!(find_duplicate_groups(&pages).is_empty());
        assert!(find_similar_pages(&pages, 0.8).is_empty());
    }

    #[test]
    fn test_meta_and_h1_grouped_independently() {
        let mut a = page("https://example.com/a", Some("A"), "a");
        let mut b = page("https://example.com/b", Some("B"), "b");
        a.signals.meta_description = Some("Same".to_string());
        b.signals.meta_description = Some("Same".to_string());
        a.signals.h1 = Some("Welcome".to_string());
        b.signals.h1 = Some("Welcome".to_string());

        let report = analyze_duplicates(&[a, b], false, 0.8);
        assert_eq!(report.groups_of(DuplicateKey::MetaDescription).count(), 1);
        assert_eq!(report.groups_of(DuplicateKey::H1).count(), 1);
        assert_eq!(report.groups_of(DuplicateKey::Title).count(), 0);
        assert!(report
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::DuplicateMetaDescriptions));
        assert!(report.issues.iter().any(|i| i.kind == IssueKind::DuplicateH1));
    }

    #[test]
    fn test_identical_text_similarity_is_one() {
        let a = page("https://example.com/a", None, "Hello, World! Same words.");
        let b = page("https://example.com/b", None, "hello world same   words");
        assert_eq!(similarity(&a, &b), 1.0);

        let pairs = find_similar_pages(&[a, b], 0.8);
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].similarity, 1.0);
    }

    #[test]
    fn test_word_count_similarity_and_saturation() {
        let a = page("https://example.com/a", None, &"alpha ".repeat(100));
        let b = page("https://example.com/b", None, &"beta ".repeat(95));
        let c = page("https://example.com/c", None, &"gamma ".repeat(85));
        let d = page("https://example.com/d", None, &"delta ".repeat(10));

        assert_eq!(similarity(&a, &b), 0.95);
        assert!((similarity(&a, &c) - 0.85).abs() < 1e-9);
        assert!(similarity(&a, &d) < 0.8);
    }

    #[test]
    fn test_pairs_sorted_by_similarity() {
        let pages = vec![
            page("https://example.com/a", None, &"alpha ".repeat(100)),
            page("https://example.com/b", None, &"beta ".repeat(85)),
            page("https://example.com/c", None, &"alpha ".repeat(100)),
        ];

        let pairs = find_similar_pages(&pages, 0.8);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[0].similarity, 1.0);
        assert_eq!(pairs[0].url_a, "https://example.com/a");
        assert_eq!(pairs[0].url_b, "https://example.com/c");
        assert!(pairs.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_canonical_audit_buckets() {
        let mut self_ref = page("https://example.com/a", None, "a");
        self_ref.signals.canonical_url = Some("https://example.com/a/".to_string());
        let mut cross = page("https://example.com/b", None, "b");
        cross.signals.canonical_url = Some("https://example.com/a".to_string());
        let missing = page("https://example.com/c", None, "c");

        let audit = audit_canonicals(&[self_ref, cross, missing]);
        assert_eq!(audit.self_referencing, vec!["https://example.com/a"]);
        assert_eq!(audit.cross_canonical[0].url, "https://example.com/b");
        assert_eq!(audit.missing, vec!["https://example.com/c"]);
    }

    #[test]
    fn test_similarity_disabled() {
        let pages = vec![
            page("https://example.com/a", None, "same"),
            page("https://example.com/b", None, "same"),
        ];
        let report = analyze_duplicates(&pages, false, 0.8);
        assert!(report.similar_pairs.is_empty());
        assert!(!report.issues.iter().any(|i| i.kind == IssueKind::SimilarContent));
    }
}
