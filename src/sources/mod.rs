//! Source adapters: one per external data source, behind a uniform
//! search contract.
//!
//! Each adapter turns a [`SearchVariant`] into zero or more [`Candidate`]s
//! or a [`SourceError`] with a human-readable reason. Adapters never
//! validate ASIN shape beyond cheap filtering and never consult the cache;
//! both are the resolver's job.

pub mod amazon;
pub mod googlebooks;
pub mod openlibrary;

use async_trait::async_trait;

use crate::error::SourceError;
use crate::models::{Candidate, SearchVariant, SourceKind};

pub use amazon::{AmazonSource, HttpPageFetcher, SearchPageFetcher};
pub use googlebooks::GoogleBooksSource;
pub use openlibrary::OpenLibrarySource;

/// Async contract every external source implements.
///
/// Implementations are shared across batch workers behind an `Arc`.
#[async_trait]
pub trait BookSource: Send + Sync {
    /// Which member of the closed source set this adapter is.
    fn kind(&self) -> SourceKind;

    /// Search for candidates matching `variant`, sorted by descending
    /// confidence. An empty listing is reported as
    /// [`SourceError::NoResults`] so the attempt trail carries a reason.
    async fn search(&self, variant: &SearchVariant) -> Result<Vec<Candidate>, SourceError>;
}

/// Minimal percent-encoding for query parameter values.
pub(crate) fn urlencoded(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            b' ' => out.push('+'),
            _ => {
                out.push('%');
                out.push(char::from(HEX[(b >> 4) as usize]));
                out.push(char::from(HEX[(b & 0x0f) as usize]));
            }
        }
    }
    out
}

const HEX: [u8; 16] = *b"0123456789ABCDEF";

/// Map a non-success HTTP status to the matching source error.
pub(crate) fn status_error(status: u16, retry_after: Option<u64>) -> SourceError {
    if status == 429 {
        SourceError::RateLimited { retry_after }
    } else {
        SourceError::Http(status)
    }
}

/// Sort candidates by descending confidence, stable on ties.
pub(crate) fn sort_candidates(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encoding() {
        assert_eq!(urlencoded("hello world"), "hello+world");
        assert_eq!(urlencoded("foo&bar"), "foo%26bar");
        assert_eq!(urlencoded("simple"), "simple");
        assert_eq!(urlencoded("Könige"), "K%C3%B6nige");
    }

    #[test]
    fn status_mapping() {
        assert!(matches!(
            status_error(429, Some(2)),
            SourceError::RateLimited { retry_after: Some(2) }
        ));
        assert!(matches!(status_error(503, None), SourceError::Http(503)));
    }

    #[test]
    fn candidate_ordering() {
        let mut candidates = vec![
            Candidate {
                asin: "B000000001".into(),
                source: SourceKind::Amazon,
                confidence: 0.4,
                raw_title: "a".into(),
            },
            Candidate {
                asin: "B000000002".into(),
                source: SourceKind::Amazon,
                confidence: 0.9,
                raw_title: "b".into(),
            },
        ];
        sort_candidates(&mut candidates);
        assert_eq!(candidates[0].asin, "B000000002");
    }
}
