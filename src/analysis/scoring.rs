//! Composite score and recommendation ordering

use crate::analysis::budget::CrawlBudget;
use crate::analysis::{Issue, IssueKind, Priority, Severity};
use crate::config::ScoringConfig;
use serde::Serialize;
use std::collections::HashSet;

/// A prioritized action item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    /// `None` for crawl budget advice
    pub issue_type: Option<IssueKind>,
    pub text: String,
}

/// Positive signals that earn bonus points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreBonuses {
    pub robots_present: bool,
    pub sitemap_present: bool,
    pub self_canonical_root: bool,
    pub single_root_h1: bool,
}

fn penalty_for(kind: IssueKind, config: &ScoringConfig) -> u32 {
    match kind.severity() {
        Severity::Critical if kind.is_blocking() => config.blocking_penalty,
        Severity::Critical => config.critical_penalty,
        Severity::Warning => config.warning_penalty,
        Severity::Minor => config.minor_penalty,
    }
}

/// Computes the 0-100 score
///
/// Each issue type is penalized once, however many times it was raised.
pub fn compute_score(issues: &[Issue], bonuses: ScoreBonuses, config: &ScoringConfig) -> u8 {
    let kinds: HashSet<IssueKind> = issues.iter().map(|i| i.kind).collect();
    let penalty: i64 = kinds
        .iter()
        .map(|kind| penalty_for(*kind, config) as i64)
        .sum();

    let bonus: i64 = [
        (bonuses.robots_present, config.robots_bonus),
        (bonuses.sitemap_present, config.sitemap_bonus),
        (bonuses.self_canonical_root, config.canonical_bonus),
        (bonuses.single_root_h1, config.single_h1_bonus),
    ]
    .iter()
    .filter(|(earned, _)| *earned)
    .map(|(_, points)| *points as i64)
    .sum();

    (100 - penalty + bonus).clamp(0, 100) as u8
}

/// Maps issues and budget advice onto an ordered recommendation list
///
/// Duplicate texts are dropped (first wins) and the sort by priority is
/// stable, so analyzer order is kept within a priority.
pub fn build_recommendations(issues: &[Issue], budget: &CrawlBudget) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    let mut recommendations: Vec<Recommendation> = issues
        .iter()
        .map(|issue| Recommendation {
            priority: issue.severity.priority(),
            issue_type: Some(issue.kind),
            text: issue.recommendation.clone(),
        })
        .chain(budget.recommendations.iter().map(|text| Recommendation {
            priority: Priority::Medium,
            issue_type: None,
            text: text.clone(),
        }))
        .filter(|r| seen.insert(r.text.clone()))
        .collect();

    recommendations.sort_by_key(|r| r.priority);
    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::budget::{estimate_crawl_budget, BudgetInputs};

    fn issue(kind: IssueKind, recommendation: &str) -> Issue {
        Issue::new(kind, "d", recommendation, 1)
    }

    #[test]
    fn test_clean_site_scores_full() {
        let bonuses = ScoreBonuses {
            robots_present: true,
            sitemap_present: true,
            self_canonical_root: true,
            single_root_h1: true,
        };
        assert_eq!(compute_score(&[], bonuses, &ScoringConfig::default()), 100);
    }

    #[test]
    fn test_penalties_by_severity() {
        let config = ScoringConfig::default();
        let none = ScoreBonuses::default();

        assert_eq!(compute_score(&[issue(IssueKind::RootNoindex, "r")], none, &config), 75);
        assert_eq!(compute_score(&[issue(IssueKind::MissingSitemap, "r")], none, &config), 80);
        assert_eq!(compute_score(&[issue(IssueKind::MissingRobotsTxt, "r")], none, &config), 90);
        assert_eq!(compute_score(&[issue(IssueKind::MultipleH1, "r")], none, &config), 98);
    }

    #[test]
    fn test_issue_type_penalized_once() {
        let issues = vec![
            issue(IssueKind::MissingTitles, "a"),
            issue(IssueKind::MissingTitles, "b"),
        ];
        assert_eq!(
            compute_score(&issues, ScoreBonuses::default(), &ScoringConfig::default()),
            90
        );
    }

    #[test]
    fn test_missing_sitemap_outweighs_missing_robots() {
        let config = ScoringConfig::default();
        let none = ScoreBonuses::default();
        let sitemap = compute_score(&[issue(IssueKind::MissingSitemap, "r")], none, &config);
        let robots = compute_score(&[issue(IssueKind::MissingRobotsTxt, "r")], none, &config);
        assert!(sitemap < robots);
    }

    #[test]
    fn test_score_clamped() {
        let config = ScoringConfig::default();
        let many: Vec<Issue> = [
            IssueKind::AnalysisFailed,
            IssueKind::RootUnreachable,
            IssueKind::RobotsBlocksAll,
            IssueKind::RootNoindex,
            IssueKind::MissingSitemap,
        ]
        .into_iter()
        .map(|k| issue(k, "r"))
        .collect();
        assert_eq!(compute_score(&many, ScoreBonuses::default(), &config), 0);

        let bonuses = ScoreBonuses {
            robots_present: true,
            sitemap_present: true,
            self_canonical_root: true,
            single_root_h1: true,
        };
        assert_eq!(
            compute_score(&[issue(IssueKind::MultipleH1, "r")], bonuses, &config),
            100
        );
    }

    #[test]
    fn test_recommendations_sorted_and_deduplicated() {
        let issues = vec![
            issue(IssueKind::TemporaryRedirects, "use 301"),
            issue(IssueKind::MissingRobotsTxt, "create robots.txt"),
            issue(IssueKind::MissingSitemap, "create sitemap"),
            issue(IssueKind::MissingTitles, "add titles"),
            issue(IssueKind::DuplicateTitles, "add titles"),
        ];
        let budget = estimate_crawl_budget(&BudgetInputs {
            robots_exists: true,
            sitemap_exists: true,
            root_load_time_ms: Some(5000),
            ..Default::default()
        });

        let recommendations = build_recommendations(&issues, &budget);
        let texts: Vec<&str> = recommendations.iter().map(|r| r.text.as_str()).collect();

        assert_eq!(texts[0], "create sitemap");
        assert_eq!(texts[1], "create robots.txt");
        assert_eq!(texts[2], "add titles");
        assert!(texts[3].starts_with("Reduce server response"));
        assert_eq!(texts[4], "use 301");
        assert_eq!(recommendations.len(), 5);
        assert_eq!(recommendations[3].issue_type, None);
        assert_eq!(recommendations[4].priority, Priority::Low);
    }
}
