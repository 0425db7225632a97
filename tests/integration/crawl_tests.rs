//! Integration tests for the crawl and the site-level checks
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! audit end-to-end over real HTTP.

use crate::support::{audit, hits, html, page, serve, serve_method, test_config};
use std::io::Write;
use sumi_audit::analysis::IssueKind;
use sumi_audit::config::load_config;
use tempfile::NamedTempFile;
use wiremock::{MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_audit_single_site() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve_method(
        &server,
        "GET",
        "/robots.txt",
        ResponseTemplate::new(200).set_body_raw(
            format!("User-agent: *\nAllow: /\nSitemap: {}/sitemap.xml\n", base),
            "text/plain",
        ),
    )
    .await;
    serve_method(
        &server,
        "GET",
        "/sitemap.xml",
        ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/</loc><lastmod>2024-01-01</lastmod></url>
  <url><loc>{base}/page1</loc><lastmod>2024-03-01</lastmod></url>
</urlset>"#
            ),
            "application/xml",
        ),
    )
    .await;
    serve(
        &server,
        "/",
        page(
            "Home",
            r#"<a href="/page1">Page 1</a> <a href="/page2">Page 2</a> <a href="/missing">Gone</a>"#,
        ),
    )
    .await;
    serve(
        &server,
        "/page1",
        page("Page 1", r#"<a href="/">Home</a> <a href="/page2">Page 2</a>"#),
    )
    .await;
    serve(&server, "/page2", page("Page 2", "<p>The second page.</p>")).await;

    let report = audit(&format!("{}/", base), test_config()).await;

    assert!(report.robots.exists);
    assert!(report.sitemap.exists);
    assert_eq!(report.sitemap.url_count, 2);
    assert_eq!(report.sitemap.last_modified.as_deref(), Some("2024-03-01"));

    // Root, two pages and the 404 target
    assert_eq!(report.crawl.pages.len(), 4);
    assert_eq!(report.crawl.pages[0].depth, 0);
    assert_eq!(hits(&server, "GET", "/page2").await, 1);
    assert_eq!(hits(&server, "GET", "/").await, 1);

    assert_eq!(report.error_pages.len(), 1);
    assert_eq!(report.error_pages[0].status_code, 404);
    assert!(report.has_issue(IssueKind::BrokenInternalLinks));
    assert!(report.has_issue(IssueKind::InsecureRoot));
    assert!(!report.has_issue(IssueKind::MissingSitemap));
    assert!(!report.has_issue(IssueKind::MissingRobotsTxt));
    assert!(report.score <= 100);
}

#[tokio::test]
async fn test_depth_and_page_limits() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(&server, "/", page("Home", r#"<a href="/d1">Down</a>"#)).await;
    serve(&server, "/d1", page("D1", r#"<a href="/d2">Down</a>"#)).await;
    serve(&server, "/d2", page("D2", r#"<a href="/d3">Down</a>"#)).await;
    serve(&server, "/d3", page("D3", "<p>bottom</p>")).await;

    let report = audit(&format!("{}/", base), test_config()).await;
    assert_eq!(report.crawl.pages.len(), 3);
    assert_eq!(hits(&server, "GET", "/d3").await, 0);
    assert!(report.crawl.pages.iter().all(|p| p.depth <= 2));

    let mut config = test_config();
    config.crawler.max_pages = 2;
    let report = audit(&format!("{}/", base), config).await;
    assert_eq!(report.crawl.pages.len(), 2);
}

#[tokio::test]
async fn test_x_robots_tag_noindex_root() {
    let server = MockServer::start().await;

    serve(
        &server,
        "/",
        page("Home", "<p>hidden</p>").insert_header("x-robots-tag", "noindex"),
    )
    .await;

    let report = audit(&format!("{}/", server.uri()), test_config()).await;

    assert!(report.has_issue(IssueKind::RootNoindex));
    assert!(!report.technical_factors.indexable);
    assert!(report
        .crawl_budget
        .factors
        .iter()
        .any(|f| f.name == "noindex_root"));
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.text.to_lowercase().contains("review noindex directive")));
}

#[tokio::test]
async fn test_unreachable_root_still_reports() {
    // Nothing listens on the discard port locally
    let report = audit("http://127.0.0.1:9/", test_config()).await;

    assert!(report.crawl.pages.is_empty());
    assert_eq!(report.crawl.unreachable.len(), 1);
    assert!(!report.robots.exists);
    assert!(report.has_issue(IssueKind::RootUnreachable));
}

#[tokio::test]
async fn test_respects_robots_when_configured() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve_method(
        &server,
        "GET",
        "/robots.txt",
        ResponseTemplate::new(200)
            .set_body_raw("User-agent: *\nDisallow: /private\n", "text/plain"),
    )
    .await;
    serve(
        &server,
        "/",
        page(
            "Home",
            r#"<a href="/private/x">Secret</a> <a href="/public">Public</a>"#,
        ),
    )
    .await;
    serve(&server, "/public", page("Public", "<p>open</p>")).await;
    serve(&server, "/private/x", page("Secret", "<p>closed</p>")).await;

    let mut config = test_config();
    config.crawler.respect_robots_txt = true;
    let report = audit(&format!("{}/", base), config).await;

    assert_eq!(hits(&server, "GET", "/private/x").await, 0);
    assert_eq!(hits(&server, "GET", "/public").await, 1);
    assert_eq!(report.crawl.blocked, vec![format!("{}/private/x", base)]);
    assert!(report.has_issue(IssueKind::BlockedByRobots));
}

#[tokio::test]
async fn test_config_file_drives_audit() {
    let server = MockServer::start().await;

    serve(&server, "/", page("Home", r#"<a href="/a">A</a>"#)).await;
    serve(&server, "/a", html("<html><head><title>A</title></head></html>")).await;

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
[crawler]
max-pages = 1
page-timeout-ms = 2000

[links]
check-broken-links = false
check-redirects = false
batch-pause-ms = 0
"#,
    )
    .unwrap();
    file.flush().unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.crawler.max_pages, 1);

    let report = audit(&format!("{}/", server.uri()), config).await;

    assert_eq!(report.crawl.pages.len(), 1);
    assert_eq!(report.link_integrity.internal_total, 1);
    assert_eq!(hits(&server, "HEAD", "/a").await, 0);
    assert_eq!(hits(&server, "GET", "/a").await, 0);
}
