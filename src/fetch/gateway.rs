//! The single-request HTTP capability every analyzer is built on

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// HTTP method used by the auditor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Head => write!(f, "HEAD"),
        }
    }
}

/// A response as seen by the analyzers
///
/// Header names are lower-case. `body` is empty for HEAD requests.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_lowercase(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Looks up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    /// The `Location` header of a redirect response
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }
}

/// Why a fetch produced no response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchFailureKind {
    Timeout,
    Network,
    Other,
}

/// A fetch that produced no HTTP response at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    pub url: String,
    pub kind: FetchFailureKind,
    pub message: String,
}

impl FetchFailure {
    pub fn new(url: &str, kind: FetchFailureKind, message: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(url: &str, after: Duration) -> Self {
        Self::new(
            url,
            FetchFailureKind::Timeout,
            format!("no response within {}ms", after.as_millis()),
        )
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == FetchFailureKind::Timeout
    }
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FetchFailureKind::Timeout => write!(f, "timeout fetching {}: {}", self.url, self.message),
            FetchFailureKind::Network => {
                write!(f, "network error fetching {}: {}", self.url, self.message)
            }
            FetchFailureKind::Other => write!(f, "error fetching {}: {}", self.url, self.message),
        }
    }
}

impl std::error::Error for FetchFailure {}

pub type FetchOutcome = Result<HttpResponse, FetchFailure>;

/// Issues exactly one HTTP request
///
/// Implementations must not follow redirects: a 3xx is returned as-is so
/// callers can inspect every hop. A failure is never fatal to the audit;
/// callers degrade the affected finding instead.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    async fn fetch(&self, url: &str, method: Method, timeout: Duration) -> FetchOutcome;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(301).with_header("Location", "/next");
        assert_eq!(response.header("location"), Some("/next"));
        assert_eq!(response.header("LOCATION"), Some("/next"));
        assert_eq!(response.location(), Some("/next"));
    }

    #[test]
    fn test_status_classes() {
        assert!(HttpResponse::new(204).is_success());
        assert!(!HttpResponse::new(204).is_redirect());
        assert!(HttpResponse::new(308).is_redirect());
        assert!(!HttpResponse::new(404).is_success());
    }

    #[test]
    fn test_failure_display_distinguishes_timeout() {
        let timeout = FetchFailure::timeout("https://example.com/", Duration::from_secs(10));
        let network = FetchFailure::new(
            "https://example.com/",
            FetchFailureKind::Network,
            "connection refused",
        );
        assert!(timeout.to_string().starts_with("timeout"));
        assert!(network.to_string().starts_with("network error"));
        assert!(timeout.is_timeout());
        assert!(!network.is_timeout());
    }
}
