//! Redirect chain resolution
//!
//! A chain starts with the link's own URL and records every hop until a
//! non-redirect status. It never holds more than `max_hops + 1` entries.

use crate::analysis::links::probe;
use crate::analysis::{Issue, IssueKind};
use crate::fetch::{resolve_location, FetchGateway};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Duration;

/// Chains with more entries than this are reported as long
pub const LONG_CHAIN_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectType {
    Permanent,
    Temporary,
    Other,
}

impl RedirectType {
    /// Classifies a 3xx status; anything else is `Other`
    pub fn from_status(status: u16) -> Self {
        match status {
            301 | 308 => RedirectType::Permanent,
            302 | 303 | 307 => RedirectType::Temporary,
            _ => RedirectType::Other,
        }
    }
}

/// One entry of a redirect chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectHop {
    pub url: String,
    pub status_code: u16,
    pub redirect_type: RedirectType,
}

impl RedirectHop {
    pub fn new(url: impl Into<String>, status_code: u16) -> Self {
        Self {
            url: url.into(),
            status_code,
            redirect_type: RedirectType::from_status(status_code),
        }
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }
}

/// Why chain resolution stopped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainEnd {
    /// A non-redirect status was reached
    Resolved,
    /// `max_hops + 1` entries were recorded
    HopLimit,
    /// A hop pointed back to a URL already in the chain
    Loop,
    /// A redirect had no usable `Location`
    MissingLocation,
    /// The next hop could not be fetched
    FetchError(String),
}

/// A fully resolved redirect chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RedirectChain {
    pub hops: Vec<RedirectHop>,
    pub end: ChainEnd,
}

impl RedirectChain {
    pub fn len(&self) -> usize {
        self.hops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hops.is_empty()
    }

    pub fn is_long(&self) -> bool {
        self.hops.len() > LONG_CHAIN_THRESHOLD
    }

    pub fn is_loop(&self) -> bool {
        self.end == ChainEnd::Loop
    }

    pub fn has_temporary(&self) -> bool {
        self.hops
            .iter()
            .any(|hop| hop.redirect_type == RedirectType::Temporary)
    }

    /// The last status seen, if the chain reached a non-redirect
    pub fn final_status(&self) -> Option<u16> {
        match self.end {
            ChainEnd::Resolved => self.hops.last().map(|hop| hop.status_code),
            _ => None,
        }
    }
}

/// Resolves the chain that starts at `url`
///
/// # Arguments
///
/// * `gateway` - The gateway used for HEAD requests
/// * `url` - The first URL of the chain
/// * `first` - Status and `Location` already observed for `url`, if any
/// * `max_hops` - Maximum redirects followed
/// * `timeout` - Per-request timeout
pub async fn resolve_chain<G: FetchGateway + ?Sized>(
    gateway: &G,
    url: &str,
    first: Option<(u16, Option<String>)>,
    max_hops: usize,
    timeout: Duration,
) -> RedirectChain {
    let mut hops: Vec<RedirectHop> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut current = url.to_string();

    let (status, location) = match first {
        Some(observed) => observed,
        None => match probe(gateway, &current, timeout).await {
            Ok(response) => (
                response.status_code,
                response.location().map(str::to_string),
            ),
            Err(failure) => {
                return RedirectChain {
                    hops,
                    end: ChainEnd::FetchError(failure.to_string()),
                }
            }
        },
    };

    seen.insert(current.clone());
    hops.push(RedirectHop::new(&current, status));
    let mut location = location;

    loop {
        let Some(last) = hops.last() else {
            break;
        };
        if !last.is_redirect() {
            return RedirectChain {
                hops,
                end: ChainEnd::Resolved,
            };
        }

        if hops.len() > max_hops {
            tracing::debug!("Redirect chain from {} hit the hop limit", url);
            return RedirectChain {
                hops,
                end: ChainEnd::HopLimit,
            };
        }

        let Some(next) = location
            .as_deref()
            .and_then(|loc| resolve_location(&current, loc))
        else {
            return RedirectChain {
                hops,
                end: ChainEnd::MissingLocation,
            };
        };

        if !seen.insert(next.clone()) {
            tracing::debug!("Redirect loop detected: {} -> {}", current, next);
            return RedirectChain {
                hops,
                end: ChainEnd::Loop,
            };
        }

        match probe(gateway, &next, timeout).await {
            Ok(response) => {
                hops.push(RedirectHop::new(&next, response.status_code));
                location = response.location().map(str::to_string);
                current = next;
            }
            Err(failure) => {
                return RedirectChain {
                    hops,
                    end: ChainEnd::FetchError(failure.to_string()),
                };
            }
        }
    }

    RedirectChain {
        hops,
        end: ChainEnd::Resolved,
    }
}

/// Aggregate view of every resolved chain
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RedirectSummary {
    pub chains: usize,
    pub long_chains: usize,
    pub loops: usize,
    pub temporary: usize,
    pub longest: usize,
}

impl RedirectSummary {
    pub fn from_chains<'a>(chains: impl IntoIterator<Item = &'a RedirectChain>) -> Self {
        let mut summary = Self::default();
        for chain in chains {
            summary.chains += 1;
            summary.longest = summary.longest.max(chain.len());
            if chain.is_long() {
                summary.long_chains += 1;
            }
            if chain.is_loop() {
                summary.loops += 1;
            }
            if chain.has_temporary() {
                summary.temporary += 1;
            }
        }
        summary
    }

    /// Issues for long chains, loops and temporary redirects
    pub fn issues(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        if self.long_chains > 0 {
            issues.push(Issue::new(
                IssueKind::LongRedirectChains,
                format!(
                    "{} links pass through more than {} redirect hops (longest: {})",
                    self.long_chains, LONG_CHAIN_THRESHOLD, self.longest
                ),
                "Point links directly at the final destination to shorten redirect chains",
                self.long_chains,
            ));
        }

        if self.loops > 0 {
            issues.push(Issue::new(
                IssueKind::RedirectLoops,
                format!("{} links end in a redirect loop", self.loops),
                "Fix redirect rules so every chain ends on a page that answers 200",
                self.loops,
            ));
        }

        if self.temporary > 0 {
            issues.push(Issue::new(
                IssueKind::TemporaryRedirects,
                format!("{} redirect chains use temporary (302/303/307) redirects", self.temporary),
                "Prefer permanent redirects (301/308) for moved content",
                self.temporary,
            ));
        }

        issues
    }
}
