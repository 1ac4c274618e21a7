use std::fmt;

// ---------------------------------------------------------------------------
// Per-card failure reporting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The line had no usable leading quantity or card reference.
    Parse,
    /// The catalog has no card for the name or identifier.
    NotFound,
    /// Still rate limited after every retry.
    RateLimited,
    /// Transport failure or server error after every retry.
    Network,
    /// The catalog answered with a body that could not be decoded.
    InvalidResponse,
    /// The catalog refused the request with a client-error status.
    Rejected,
}

impl FailureKind {
    /// Transient kinds are retried before being reported.
    pub fn is_transient(self) -> bool {
        matches!(self, FailureKind::RateLimited | FailureKind::Network)
    }

    /// Whether the failure says something about the catalog rather than the
    /// card: it could not be reached, refused the request, or answered with
    /// garbage.
    pub fn is_catalog_fault(self) -> bool {
        !matches!(self, FailureKind::Parse | FailureKind::NotFound)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Parse => "unparsable line",
            FailureKind::NotFound => "not found",
            FailureKind::RateLimited => "rate limited",
            FailureKind::Network => "network error",
            FailureKind::InvalidResponse => "invalid catalog response",
            FailureKind::Rejected => "rejected by catalog",
        };
        f.write_str(label)
    }
}

/// One line or card that did not make it into the resolved deck, keyed by
/// the original query text or identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedQuery {
    pub query: String,
    pub kind: FailureKind,
}

impl FailedQuery {
    pub fn new(query: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            query: query.into(),
            kind,
        }
    }
}

impl fmt::Display for FailedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.query, self.kind)
    }
}
