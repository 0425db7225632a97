//! Markdown report generation
//!
//! This module renders an [`AnalysisReport`] as a human-readable markdown
//! document: score, prioritized recommendations, issues, and one section per
//! analyzer.

use crate::analysis::{AnalysisReport, DuplicateKey, LinkStatus, Severity};

/// Maximum rows listed in per-URL tables
const MAX_ROWS: usize = 20;

/// Formats an analysis report as markdown
///
/// # Arguments
///
/// * `report` - The finished analysis report
///
/// # Returns
///
/// A formatted markdown string
pub fn render_markdown(report: &AnalysisReport) -> String {
    let mut md = String::new();

    // Title
    md.push_str(&format!("# SEO Audit: {}\n\n", report.domain));

    md.push_str(&format!("- **Root URL**: {}\n", report.root_url));
    md.push_str(&format!(
        "- **Generated**: {}\n",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("- **Score**: {}/100\n", report.score));
    md.push_str(&format!(
        "- **Pages Crawled**: {} ({} unreachable)\n",
        report.crawl.pages.len(),
        report.crawl.unreachable.len()
    ));
    if report.crawl.deadline_reached {
        md.push_str("- **Note**: the crawl stopped at its deadline\n");
    }
    md.push('\n');

    // Recommendations
    if !report.recommendations.is_empty() {
        md.push_str("## Recommendations\n\n");
        for (i, rec) in report.recommendations.iter().enumerate() {
            md.push_str(&format!("{}. **[{}]** {}\n", i + 1, rec.priority, rec.text));
        }
        md.push('\n');
    }

    // Issues by severity
    md.push_str("## Issues\n\n");
    if report.issues.is_empty() {
        md.push_str("No issues found.\n\n");
    } else {
        for severity in [Severity::Critical, Severity::Warning, Severity::Minor] {
            let issues: Vec<_> = report.issues_of(severity).collect();
            if issues.is_empty() {
                continue;
            }
            md.push_str(&format!("### {} ({})\n\n", capitalize(&severity.to_string()), issues.len()));
            md.push_str("| Type | Affected | Description |\n");
            md.push_str("|------|----------|-------------|\n");
            for issue in issues {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    issue.kind,
                    issue.affected_count,
                    escape_cell(&issue.description)
                ));
            }
            md.push('\n');
        }
    }

    // Technical factors
    let tf = &report.technical_factors;
    md.push_str("## Root Page\n\n");
    md.push_str("| Factor | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| HTTPS | {} |\n", yes_no(tf.https)));
    md.push_str(&format!("| Status | {} |\n", optional(tf.status_code)));
    md.push_str(&format!("| Load Time (ms) | {} |\n", optional(tf.load_time_ms)));
    md.push_str(&format!("| Size (bytes) | {} |\n", optional(tf.page_size_bytes)));
    md.push_str(&format!("| Title | {} |\n", yes_no(tf.title_present)));
    md.push_str(&format!(
        "| Meta Description | {} |\n",
        yes_no(tf.meta_description_present)
    ));
    md.push_str(&format!("| H1 Count | {} |\n", tf.h1_count));
    md.push_str(&format!("| Canonical | {:?} |\n", tf.canonical_status));
    md.push_str(&format!(
        "| Images Missing Alt | {} / {} |\n",
        tf.images_missing_alt, tf.images_total
    ));
    md.push_str(&format!("| Indexable | {} |\n\n", yes_no(tf.indexable)));

    // Robots and sitemap
    md.push_str("## Robots.txt & Sitemap\n\n");
    md.push_str(&format!(
        "- **robots.txt**: {} ({})\n",
        if report.robots.exists { "found" } else { "missing" },
        report.robots.url
    ));
    if let Some(delay) = report.robots.crawl_delay_seconds() {
        md.push_str(&format!("- **Crawl-delay**: {}s\n", delay));
    }
    match &report.sitemap.url {
        Some(url) if report.sitemap.exists => {
            md.push_str(&format!(
                "- **Sitemap**: {} ({}, {} URLs, {} child sitemaps)\n",
                url,
                if report.sitemap.is_index { "index" } else { "urlset" },
                report.sitemap.url_count,
                report.sitemap.sitemap_count
            ));
            if let Some(lastmod) = &report.sitemap.last_modified {
                md.push_str(&format!("- **Last Modified**: {}\n", lastmod));
            }
        }
        _ => md.push_str("- **Sitemap**: missing\n"),
    }
    md.push('\n');

    // Crawl budget
    md.push_str("## Crawl Budget\n\n");
    md.push_str(&format!(
        "- **Score**: {}/100\n- **Estimated Budget**: {} pages\n",
        report.crawl_budget.score, report.crawl_budget.estimated_budget
    ));
    for factor in &report.crawl_budget.factors {
        md.push_str(&format!("- {} (-{})\n", factor.name, factor.penalty));
    }
    md.push('\n');

    // Duplicate content
    let duplicates = &report.duplicate_content;
    if !duplicates.groups.is_empty() || !duplicates.similar_pairs.is_empty() {
        md.push_str("## Duplicate Content\n\n");
        for key in [DuplicateKey::Title, DuplicateKey::MetaDescription, DuplicateKey::H1] {
            for group in duplicates.groups_of(key) {
                md.push_str(&format!(
                    "- **{:?}** \"{}\": {}\n",
                    key,
                    group.key_value,
                    group.member_urls.join(", ")
                ));
            }
        }
        for pair in duplicates.similar_pairs.iter().take(MAX_ROWS) {
            md.push_str(&format!(
                "- {:.0}% similar: {} / {}\n",
                pair.similarity * 100.0,
                pair.url_a,
                pair.url_b
            ));
        }
        md.push('\n');
    }

    // Links
    let links = &report.link_integrity;
    md.push_str("## Links\n\n");
    md.push_str(&format!(
        "- **Internal**: {} ({} broken)\n- **External**: {} ({} broken)\n- **Redirected**: {}\n\n",
        links.internal_total,
        links.broken_internal,
        links.external_total,
        links.broken_external,
        links.redirected
    ));

    let broken: Vec<_> = links
        .records
        .iter()
        .filter(|r| r.status == LinkStatus::Broken)
        .collect();
    if !broken.is_empty() {
        md.push_str("| Target | Status | Found On |\n");
        md.push_str("|--------|--------|----------|\n");
        for record in broken.iter().take(MAX_ROWS) {
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                record.target_url,
                record
                    .status_code
                    .map(|c| c.to_string())
                    .or_else(|| record.failure.map(|f| format!("{:?}", f).to_lowercase()))
                    .unwrap_or_else(|| "-".to_string()),
                record.source_url
            ));
        }
        if broken.len() > MAX_ROWS {
            md.push_str(&format!("\n... and {} more\n", broken.len() - MAX_ROWS));
        }
        md.push('\n');
    }

    // Anchors
    let anchors = &report.anchors;
    if anchors.total > 0 {
        md.push_str("## Anchor Text\n\n");
        md.push_str("| Bucket | Count |\n");
        md.push_str("|--------|-------|\n");
        md.push_str(&format!("| Generic | {} |\n", anchors.counts.generic));
        md.push_str(&format!("| Naked URL | {} |\n", anchors.counts.naked_url));
        md.push_str(&format!("| Branded | {} |\n", anchors.counts.branded));
        md.push_str(&format!("| Exact Match | {} |\n", anchors.counts.exact_match));
        md.push_str(&format!("| Partial Match | {} |\n", anchors.counts.partial_match));
        md.push_str(&format!("| Other | {} |\n", anchors.counts.other));
        md.push_str(&format!("| Empty | {} |\n\n", anchors.counts.empty));
    }

    // Error pages
    if !report.error_pages.is_empty() {
        md.push_str("## Error Pages\n\n");
        md.push_str("| URL | Status | Depth |\n");
        md.push_str("|-----|--------|-------|\n");
        for page in report.error_pages.iter().take(MAX_ROWS) {
            md.push_str(&format!("| {} | {} | {} |\n", page.url, page.status_code, page.depth));
        }
        md.push('\n');
    }

    md.push_str("---\n\n");
    md.push_str(&format!(
        "*Generated by Sumi-Audit v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    md
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
