use crate::UrlError;
use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sumi_audit::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the host with any leading `www.` removed
///
/// `example.com` and `www.example.com` are the same site for link
/// classification purposes.
pub fn site_host(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Checks whether two URLs belong to the same site (`host` ≡ `www.host`)
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => site_host(ha) == site_host(hb),
        _ => false,
    }
}

/// Returns the first label of the site host, used as the brand name
///
/// `www.acme-shop.co.uk` yields `acme-shop`.
pub fn brand_label(host: &str) -> String {
    site_host(host)
        .split('.')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Validates a root URL handed to the auditor
///
/// The URL must parse, use http or https, and carry a host. This is the only
/// input problem treated as fatal.
pub fn validate_root_url(input: &str) -> Result<Url, UrlError> {
    let url = Url::parse(input.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingDomain),
    }
}
