//! reqwest-backed [`FetchGateway`]
//!
//! This module handles all real HTTP requests, including:
//! - Building the client with the declared crawler identity
//! - GET and HEAD requests with a per-request timeout
//! - Error classification (timeout, network, other)

use crate::config::UserAgentConfig;
use crate::fetch::gateway::{
    FetchFailure, FetchFailureKind, FetchGateway, FetchOutcome, HttpResponse, Method,
};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed by the client; the redirect resolver and the
/// page fetcher walk them hop by hop.
///
/// # Example
///
/// ```no_run
/// use sumi_audit::config::UserAgentConfig;
/// use sumi_audit::fetch::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent_string())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production gateway over a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
}

impl HttpGateway {
    pub fn new(config: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl FetchGateway for HttpGateway {
    async fn fetch(&self, url: &str, method: Method, timeout: Duration) -> FetchOutcome {
        let request = match method {
            Method::Get => self.client.get(url),
            Method::Head => self.client.head(url),
        };

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, &e))?;

        let status_code = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_lowercase(), v.to_string()))
            })
            .collect();

        let body = match method {
            Method::Head => String::new(),
            Method::Get => response
                .bytes()
                .await
                .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                .map_err(|e| classify_error(url, &e))?,
        };

        tracing::trace!("{} {} -> {}", method, url, status_code);

        Ok(HttpResponse {
            status_code,
            headers,
            body,
        })
    }
}

/// Maps a reqwest error onto the failure taxonomy
fn classify_error(url: &str, error: &reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::new(url, FetchFailureKind::Timeout, "Request timeout")
    } else if error.is_connect() {
        FetchFailure::new(url, FetchFailureKind::Network, "Connection refused")
    } else if error.is_request() || error.is_body() {
        FetchFailure::new(url, FetchFailureKind::Network, error.to_string())
    } else {
        FetchFailure::new(url, FetchFailureKind::Other, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_gateway_construction() {
        assert!(HttpGateway::new(&UserAgentConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let gateway = HttpGateway::new(&UserAgentConfig::default()).unwrap();
        // Port 9 (discard) is closed on test machines
        let result = gateway
            .fetch("http://127.0.0.1:9/", Method::Head, Duration::from_secs(2))
            .await;

        let failure = result.unwrap_err();
        assert_ne!(failure.kind, FetchFailureKind::Other);
        assert_eq!(failure.url, "http://127.0.0.1:9/");
    }
}
