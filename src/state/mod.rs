//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: the per-URL state machine driven by the site crawler

mod url_state;

pub use url_state::UrlState;
