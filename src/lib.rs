//! Sumi-Audit: a bounded technical-SEO crawler
//!
//! This crate crawls a single site breadth-first from a root URL, inspects
//! robots.txt and sitemaps, extracts on-page signals, checks link integrity and
//! reduces everything to a scored [`AnalysisReport`](analysis::AnalysisReport).

pub mod analysis;
pub mod audit;
pub mod config;
pub mod crawler;
pub mod fetch;
pub mod output;
pub mod robots;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Invalid root URL '{url}': {reason}")]
    InvalidRootUrl { url: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::UrlState,
        to: state::UrlState,
    },

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Sumi-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use analysis::AnalysisReport;
pub use audit::{AnalysisRequest, Auditor};
pub use config::Config;
pub use fetch::{FetchGateway, HttpGateway};
pub use state::UrlState;
