//! Shared fixtures for the integration tests

use sumi_audit::config::Config;
use sumi_audit::{AnalysisReport, AnalysisRequest, Auditor};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration tuned for fast local runs
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.user_agent.crawler_name = "TestBot".to_string();
    config.user_agent.crawler_version = "1.0.0".to_string();
    config.crawler.page_timeout_ms = 2_000;
    config.links.request_timeout_ms = 2_000;
    config.links.batch_pause_ms = 0;
    config
}

/// An HTML response with the right content type
pub fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html; charset=utf-8")
}

/// A minimal page with a title, description, one H1 and the given body
pub fn page(title: &str, body: &str) -> ResponseTemplate {
    html(format!(
        r#"<html><head><title>{title}</title><meta name="description" content="{title} description"></head>
        <body><h1>{title}</h1>{body}</body></html>"#
    ))
}

pub fn redirect(status: u16, location: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("location", location)
}

/// Serves `template` for GET and HEAD on `route`
pub async fn serve(server: &MockServer, route: &str, template: ResponseTemplate) {
    Mock::given(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

/// Serves `template` for one method only
pub async fn serve_method(
    server: &MockServer,
    verb: &str,
    route: &str,
    template: ResponseTemplate,
) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(template)
        .mount(server)
        .await;
}

/// Number of requests `server` received for `route` with `verb`
pub async fn hits(server: &MockServer, verb: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.to_string().eq_ignore_ascii_case(verb) && r.url.path() == route)
        .count()
}

/// Runs a full audit of `root` with `config`
pub async fn audit(root: &str, config: Config) -> AnalysisReport {
    let request = AnalysisRequest::from_config(root, &config);
    let auditor = Auditor::from_config(config).expect("client builds");
    auditor.analyze(&request).await.expect("valid root url")
}
