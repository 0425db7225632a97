//! Integration tests for link probing and redirect resolution

use crate::support::{audit, hits, page, redirect, serve, serve_method, test_config};
use sumi_audit::analysis::{IssueKind, LinkRecord, LinkStatus, RedirectType};
use sumi_audit::AnalysisReport;
use wiremock::{MockServer, ResponseTemplate};

fn record<'a>(report: &'a AnalysisReport, target: &str) -> &'a LinkRecord {
    report
        .link_integrity
        .records
        .iter()
        .find(|r| r.target_url == target)
        .unwrap_or_else(|| panic!("no record for {}", target))
}

#[tokio::test]
async fn test_broken_and_redirected_links() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/",
        page(
            "Home",
            r#"<a href="/gone">Gone</a> <a href="/old">Old</a> <a href="/fine">Fine</a>"#,
        ),
    )
    .await;
    serve(&server, "/gone", ResponseTemplate::new(410)).await;
    serve(&server, "/old", redirect(301, "/older")).await;
    serve(&server, "/older", redirect(308, "/fine")).await;
    serve(&server, "/fine", page("Fine", "<p>ok</p>")).await;

    let report = audit(&format!("{}/", base), test_config()).await;

    let gone = record(&report, &format!("{}/gone", base));
    assert_eq!(gone.status, LinkStatus::Broken);
    assert_eq!(gone.status_code, Some(410));

    let old = record(&report, &format!("{}/old", base));
    assert_eq!(old.status, LinkStatus::Redirect);
    let chain: Vec<(u16, RedirectType)> = old
        .redirect_chain
        .iter()
        .map(|h| (h.status_code, h.redirect_type))
        .collect();
    assert_eq!(
        chain,
        vec![
            (301, RedirectType::Permanent),
            (308, RedirectType::Permanent),
            (200, RedirectType::Other),
        ]
    );

    assert_eq!(record(&report, &format!("{}/fine", base)).status, LinkStatus::Valid);
    assert_eq!(report.link_integrity.broken_internal, 1);
    assert!(report.has_issue(IssueKind::BrokenInternalLinks));
    assert!(!report.has_issue(IssueKind::TemporaryRedirects));
}

#[tokio::test]
async fn test_head_not_allowed_falls_back_to_get() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(&server, "/", page("Home", r#"<a href="/nohead">No HEAD</a>"#)).await;
    serve_method(&server, "HEAD", "/nohead", ResponseTemplate::new(405)).await;
    serve_method(&server, "GET", "/nohead", page("No HEAD", "<p>get only</p>")).await;

    let report = audit(&format!("{}/", base), test_config()).await;

    let nohead = record(&report, &format!("{}/nohead", base));
    assert_eq!(nohead.status, LinkStatus::Valid);
    assert_eq!(nohead.status_code, Some(200));
    assert_eq!(hits(&server, "HEAD", "/nohead").await, 1);
    // One GET from the crawl, one from the probe fallback
    assert_eq!(hits(&server, "GET", "/nohead").await, 2);
}

#[tokio::test]
async fn test_redirect_loop_and_temporary_redirect() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/",
        page(
            "Home",
            r#"<a href="/loop-a">Loop</a> <a href="/moved">Moved</a>"#,
        ),
    )
    .await;
    serve(&server, "/loop-a", redirect(301, "/loop-b")).await;
    serve(&server, "/loop-b", redirect(301, "/loop-a")).await;
    serve(&server, "/moved", redirect(302, "/target")).await;
    serve(&server, "/target", page("Target", "<p>here</p>")).await;

    let report = audit(&format!("{}/", base), test_config()).await;

    let looping = record(&report, &format!("{}/loop-a", base));
    assert_eq!(looping.redirect_chain.len(), 2);
    assert!(looping.issues.iter().any(|i| i.contains("loop")));
    assert!(report.has_issue(IssueKind::RedirectLoops));

    let moved = record(&report, &format!("{}/moved", base));
    assert_eq!(moved.redirect_chain[0].redirect_type, RedirectType::Temporary);
    assert!(report.has_issue(IssueKind::TemporaryRedirects));
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.text.contains("permanent redirects")));
    assert_eq!(report.link_integrity.redirects.loops, 1);
}

#[tokio::test]
async fn test_link_caps_limit_probes() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links: String = (0..6)
        .map(|i| format!(r#"<a href="/p{i}">Page {i}</a> "#))
        .collect();
    serve(&server, "/", page("Home", &links)).await;

    let mut config = test_config();
    config.crawler.max_depth = 0;
    config.links.max_internal_links = 3;
    config.links.internal_batch_size = 2;
    let report = audit(&format!("{}/", base), config).await;

    assert_eq!(report.link_integrity.internal_total, 3);
    let probed: usize = {
        let mut total = 0;
        for i in 0..6 {
            total += hits(&server, "HEAD", &format!("/p{}", i)).await;
        }
        total
    };
    assert_eq!(probed, 3);
}
