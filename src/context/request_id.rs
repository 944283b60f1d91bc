use http::HeaderValue;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime};
use ulid::Ulid;

/// Header consulted for an inbound correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Correlation id of one dispatch, kept across async suspension and resume.
///
/// ULIDs embed their creation time, so the id doubles as the dispatch's
/// start clock: [`age`](Self::age) on resumption is the total time the
/// request has been in flight, suspension included.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// The caller's id from an `x-request-id` value, when it is a ULID.
    #[must_use]
    pub fn from_header(value: &HeaderValue) -> Option<Self> {
        value.to_str().ok()?.trim().parse().ok()
    }

    /// When the id was minted, millisecond precision.
    #[must_use]
    pub fn issued_at(&self) -> SystemTime {
        self.0.datetime()
    }

    /// Time since the id was minted; zero if the clock went backwards.
    #[must_use]
    pub fn age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.issued_at())
            .unwrap_or_default()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(RequestId)
    }
}
