//! Error types used throughout bookhound.
//!
//! Two taxonomies: [`SourceError`] for failures at a single external source
//! (absorbed into the attempt trail, possibly retried), and [`LookupError`]
//! for failures of the lookup machinery itself. "Not found" is neither:
//! it is a normal [`LookupResult`](crate::models::LookupResult) without an
//! ASIN.

/// Failure at one external source for one query attempt.
///
/// The `Display` string is recorded verbatim in the attempt trail, so every
/// variant reads as a human-readable reason.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source answered but the result listing was empty.
    #[error("no results")]
    NoResults,

    /// The source answered with something we could not parse.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The request did not complete within the client timeout.
    #[error("timeout")]
    Timeout,

    /// The source answered with a non-success HTTP status.
    #[error("http status {0}")]
    Http(u16),

    /// The source signalled rate limiting (HTTP 429 or equivalent).
    #[error("rate limited")]
    RateLimited {
        /// Server-suggested wait in seconds, when provided.
        retry_after: Option<u64>,
    },

    /// The request failed before a response arrived.
    #[error("network error: {0}")]
    Network(String),
}

impl SourceError {
    /// True for failures worth one more attempt: timeouts, connection
    /// errors, and server-class HTTP statuses. Client-class failures
    /// (malformed queries, 4xx, empty listings) are definitive.
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Timeout | SourceError::Network(_) => true,
            SourceError::Http(status) => (500..=599).contains(status),
            _ => false,
        }
    }

    /// True when the failure should trigger exponential backoff rather
    /// than immediate retry or surfacing.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SourceError::RateLimited { .. })
    }

    /// Map a reqwest error to the matching variant.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout
        } else if let Some(status) = err.status() {
            SourceError::Http(status.as_u16())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

/// Failure of the lookup machinery, as opposed to one source.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The query itself is unusable (no title and no ISBN). Never retried.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The cache could not be read or written. Logged; lookups proceed
    /// uncached rather than failing.
    #[error("cache error: {0}")]
    CacheIo(String),

    /// Configuration-level failure. The only class that propagates to the
    /// caller as fatal.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LookupError {
    /// Create a new InvalidQuery error.
    pub fn invalid_query<S: Into<String>>(msg: S) -> Self {
        Self::InvalidQuery(msg.into())
    }

    /// Create a new CacheIo error.
    pub fn cache_io<S: Into<String>>(msg: S) -> Self {
        Self::CacheIo(msg.into())
    }

    /// Create a new Config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type alias for lookup machinery operations.
pub type Result<T> = std::result::Result<T, LookupError>;
