//! Fetch module: the HTTP capability the auditor is built on
//!
//! This module contains:
//! - The [`FetchGateway`] trait and its request/response types
//! - The reqwest-backed [`HttpGateway`]
//! - [`fetch_following`], which walks redirects hop by hop for page,
//!   robots.txt and sitemap retrieval

mod gateway;
mod http;

#[cfg(test)]
pub(crate) mod testing;

pub use gateway::{
    FetchFailure, FetchFailureKind, FetchGateway, FetchOutcome, HttpResponse, Method,
};
pub use http::{build_http_client, HttpGateway};

use std::time::Duration;
use url::Url;

/// Default number of redirects followed when retrieving a document
pub const DEFAULT_FOLLOW_LIMIT: usize = 5;

/// The end of a followed redirect sequence
#[derive(Debug, Clone)]
pub struct FollowedResponse {
    /// URL that produced `response`
    pub final_url: String,
    /// Last response received (may still be a 3xx if the limit was hit)
    pub response: HttpResponse,
    /// URLs that answered with a redirect, in order
    pub redirects: Vec<String>,
    /// Redirect target that was not requested because it had been seen before
    pub already_seen: Option<String>,
}

/// Fetches `url`, following up to `max_redirects` redirects
///
/// Stops early on a redirect without `Location`, an unresolvable
/// `Location`, or a hop back to a URL already seen; the 3xx response is
/// returned in those cases.
pub async fn fetch_following<G: FetchGateway + ?Sized>(
    gateway: &G,
    url: &str,
    method: Method,
    timeout: Duration,
    max_redirects: usize,
) -> Result<FollowedResponse, FetchFailure> {
    fetch_following_unseen(gateway, url, method, timeout, max_redirects, |_| false).await
}

/// Like [`fetch_following`], but never requests a redirect target for which
/// `seen` returns true
///
/// The skipped target is reported in [`FollowedResponse::already_seen`] and
/// the last redirect response is returned.
pub async fn fetch_following_unseen<G, F>(
    gateway: &G,
    url: &str,
    method: Method,
    timeout: Duration,
    max_redirects: usize,
    seen: F,
) -> Result<FollowedResponse, FetchFailure>
where
    G: FetchGateway + ?Sized,
    F: Fn(&str) -> bool,
{
    let mut current = url.to_string();
    let mut redirects: Vec<String> = Vec::new();

    loop {
        let response = gateway.fetch(&current, method, timeout).await?;

        if !response.is_redirect() || redirects.len() >= max_redirects {
            return Ok(FollowedResponse {
                final_url: current,
                response,
                redirects,
                already_seen: None,
            });
        }

        let next = response
            .location()
            .and_then(|location| resolve_location(&current, location));

        match next {
            Some(next) if seen(&next) => {
                tracing::debug!("Redirect {} -> {} leads to a seen URL", current, next);
                return Ok(FollowedResponse {
                    final_url: current,
                    response,
                    redirects,
                    already_seen: Some(next),
                });
            }
            Some(next) if next != current && !redirects.contains(&next) => {
                tracing::debug!("Following redirect {} -> {}", current, next);
                redirects.push(std::mem::replace(&mut current, next));
            }
            _ => {
                return Ok(FollowedResponse {
                    final_url: current,
                    response,
                    redirects,
                    already_seen: None,
                })
            }
        }
    }
}

/// Resolves a `Location` header against the URL that returned it
pub fn resolve_location(base: &str, location: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(location.trim()).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedGateway;
    use super::*;

    #[tokio::test]
    async fn test_follows_redirects_to_final_page() {
        let gateway = ScriptedGateway::new()
            .redirect("http://example.com/", 301, "https://example.com/")
            .page("https://example.com/", "<html></html>");

        let followed = fetch_following(
            &gateway,
            "http://example.com/",
            Method::Get,
            Duration::from_secs(1),
            DEFAULT_FOLLOW_LIMIT,
        )
        .await
        .unwrap();

        assert_eq!(followed.final_url, "https://example.com/");
        assert_eq!(followed.response.status_code, 200);
        assert_eq!(followed.redirects, vec!["http://example.com/"]);
    }

    #[tokio::test]
    async fn test_stops_on_redirect_loop() {
        let gateway = ScriptedGateway::new()
            .redirect("https://example.com/a", 302, "/b")
            .redirect("https://example.com/b", 302, "/a");

        let followed = fetch_following(
            &gateway,
            "https://example.com/a",
            Method::Get,
            Duration::from_secs(1),
            10,
        )
        .await
        .unwrap();

        assert_eq!(followed.response.status_code, 302);
        assert_eq!(followed.final_url, "https://example.com/b");
        assert_eq!(gateway.request_count(), 2);
    }

    #[tokio::test]
    async fn test_respects_redirect_limit() {
        let gateway = ScriptedGateway::new()
            .redirect("https://example.com/1", 301, "/2")
            .redirect("https://example.com/2", 301, "/3")
            .redirect("https://example.com/3", 301, "/4");

        let followed = fetch_following(
            &gateway,
            "https://example.com/1",
            Method::Get,
            Duration::from_secs(1),
            1,
        )
        .await
        .unwrap();

        assert_eq!(followed.final_url, "https://example.com/2");
        assert!(followed.response.is_redirect());
    }

    #[tokio::test]
    async fn test_stops_before_seen_target() {
        let gateway = ScriptedGateway::new()
            .redirect("https://example.com/old", 301, "/mid")
            .redirect("https://example.com/mid", 301, "/new")
            .page("https://example.com/new", "<html></html>");

        let followed = fetch_following_unseen(
            &gateway,
            "https://example.com/old",
            Method::Get,
            Duration::from_secs(1),
            DEFAULT_FOLLOW_LIMIT,
            |url| url == "https://example.com/new",
        )
        .await
        .unwrap();

        assert_eq!(followed.final_url, "https://example.com/mid");
        assert_eq!(followed.redirects, vec!["https://example.com/old"]);
        assert_eq!(followed.already_seen.as_deref(), Some("https://example.com/new"));
        assert_eq!(gateway.requests_for("https://example.com/new"), 0);
    }

    #[test]
    fn test_resolve_location() {
        assert_eq!(
            resolve_location("https://example.com/a/b", "../c").as_deref(),
            Some("https://example.com/c")
        );
        assert_eq!(
            resolve_location("https://example.com/a", "https://other.org/x").as_deref(),
            Some("https://other.org/x")
        );
        assert_eq!(resolve_location("not a url", "/x"), None);
    }
}
