/// URL state definitions for tracking crawl progress
///
/// Every URL the crawler learns about moves strictly forward through
/// `Queued -> Fetching -> Visited`.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    /// Discovered and waiting in the frontier
    Queued,

    /// Popped from the frontier; the page fetch is in progress
    Fetching,

    /// Fetched (successfully or not); never fetched again in this run
    Visited,
}

impl UrlState {
    /// Returns true if the URL must not be fetched again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Visited)
    }

    /// Returns true if moving from `self` to `next` is legal
    ///
    /// A URL redirected to is marked `Visited` directly, without having
    /// been queued.
    pub fn can_transition_to(&self, next: UrlState) -> bool {
        matches!(
            (self, next),
            (Self::Queued, Self::Fetching) | (Self::Fetching, Self::Visited)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Visited => "visited",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
