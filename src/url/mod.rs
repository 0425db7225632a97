//! URL handling module for Sumi-Audit
//!
//! This module provides URL normalization, host extraction and the
//! same-site test used to split links into internal and external.

mod domain;
mod normalize;

pub use domain::{brand_label, extract_domain, is_same_site, site_host, validate_root_url};
pub use normalize::{normalize_key, normalize_url};
