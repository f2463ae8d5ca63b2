//! Core data model for lookups: queries, variants, candidates, and results.

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::lang;

/// External data source kinds, in fixed priority order.
///
/// The closed set here replaces runtime string dispatch: each kind is bound
/// to exactly one adapter and the resolver walks [`SourceKind::PRIORITY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Regional storefront search pages (HTML).
    Amazon,
    /// Google Books volumes API (structured JSON).
    GoogleBooks,
    /// Open Library bibliographic API.
    OpenLibrary,
}

impl SourceKind {
    /// Fixed adapter priority: marketplace first, metadata API second,
    /// bibliographic API third.
    pub const PRIORITY: [SourceKind; 3] = [
        SourceKind::Amazon,
        SourceKind::GoogleBooks,
        SourceKind::OpenLibrary,
    ];

    /// Short lowercase identifier, used in logs and the `--source` filter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Amazon => "amazon",
            SourceKind::GoogleBooks => "googlebooks",
            SourceKind::OpenLibrary => "openlibrary",
        }
    }

    /// Parse a `--source` filter value.
    pub fn parse(s: &str) -> Option<SourceKind> {
        match s.to_ascii_lowercase().as_str() {
            "amazon" => Some(SourceKind::Amazon),
            "googlebooks" | "google" => Some(SourceKind::GoogleBooks),
            "openlibrary" => Some(SourceKind::OpenLibrary),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized book metadata driving one lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookQuery {
    /// Book title as extracted; may be empty only when `isbn` is present.
    pub title: String,
    /// Author display name, empty when unknown.
    pub author: String,
    /// Two-letter base language code (see [`crate::lang::normalize`]).
    pub language: String,
    /// Series name, when one was detected.
    pub series: Option<String>,
    /// ISBN-10 or ISBN-13 digits, when known.
    pub isbn: Option<String>,
}

impl BookQuery {
    /// Build a query, enforcing the invariant that at least a title or an
    /// ISBN is present.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        language: &str,
        series: Option<String>,
        isbn: Option<String>,
    ) -> Result<Self, LookupError> {
        let title = title.into();
        let author = author.into();
        if title.trim().is_empty() && isbn.as_deref().map_or(true, |i| i.trim().is_empty()) {
            return Err(LookupError::invalid_query("neither title nor isbn present"));
        }
        Ok(Self {
            title,
            author,
            language: lang::normalize(language).to_string(),
            series,
            isbn: isbn.filter(|i| !i.trim().is_empty()),
        })
    }

    /// Normalized cache key: lowercased title and author plus the ISBN,
    /// with whitespace collapsed.
    pub fn cache_key(&self) -> String {
        fn squash(s: &str) -> String {
            s.split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase()
        }
        format!(
            "{}|{}|{}",
            squash(&self.title),
            squash(&self.author),
            self.isbn.as_deref().unwrap_or("")
        )
    }
}

/// Priority tier a variant belongs to; tiers are tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantTier {
    /// Localized title + author on the native-language marketplace.
    Primary,
    /// Canonical-English equivalent title, when a mapping exists.
    Canonical,
    /// Series-level title instead of the specific volume.
    Series,
    /// Author-only query.
    AuthorOnly,
    /// Title with edition/subtitle noise stripped.
    Stripped,
    /// Same title retried on the remaining marketplaces.
    CrossMarket,
    /// Fuzzy-mode expansion (author forms, series aliases).
    Fuzzy,
}

/// One concrete query form tried against the sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchVariant {
    /// Title to search for; empty for author-only variants.
    pub title: String,
    /// Author to search for; empty when unknown or stripped.
    pub author: String,
    /// Marketplace domain this variant targets (e.g. `amazon.de`).
    pub domain: String,
    /// ISBN carried over from the query, for sources that resolve directly.
    pub isbn: Option<String>,
    /// Priority tier this variant was generated under.
    pub tier: VariantTier,
}

impl std::fmt::Display for SearchVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.title.is_empty() {
            write!(f, "author:\"{}\" @ {}", self.author, self.domain)
        } else if self.author.is_empty() {
            write!(f, "\"{}\" @ {}", self.title, self.domain)
        } else {
            write!(f, "\"{}\" by {} @ {}", self.title, self.author, self.domain)
        }
    }
}

/// An identifier proposed by one source, pending validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// The proposed ASIN, not yet validated.
    pub asin: String,
    /// Source that proposed it.
    pub source: SourceKind,
    /// Similarity between the result title and the query title (0.0 - 1.0).
    pub confidence: f64,
    /// Title string as the source returned it.
    pub raw_title: String,
}

/// Outcome of one (source, variant) attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// A candidate passed validation and the confidence gate.
    Accepted { asin: String, confidence: f64 },
    /// The source returned candidates but none were acceptable.
    Rejected { reason: String },
    /// The source call failed; the reason is the [`SourceError`] display.
    ///
    /// [`SourceError`]: crate::error::SourceError
    Failed { reason: String },
}

/// One entry in the diagnostic trail of a lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub source: SourceKind,
    /// Human-readable variant description (its `Display` form).
    pub variant: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Final result of one lookup. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    /// The resolved ASIN, or `None` after exhausting all sources.
    pub asin: Option<String>,
    /// Source that produced the accepted candidate.
    pub source: Option<SourceKind>,
    /// Every (source, variant) pair tried, in order.
    pub attempts: Vec<Attempt>,
    /// Wall-clock time the lookup took.
    pub elapsed_ms: u64,
    /// Whether this result was served from the cache.
    pub from_cache: bool,
}

impl LookupResult {
    /// A cache-served result carries no fresh attempts.
    pub fn from_cache_entry(asin: Option<String>, source: Option<SourceKind>, elapsed_ms: u64) -> Self {
        Self {
            asin,
            source,
            attempts: Vec::new(),
            elapsed_ms,
            from_cache: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_requires_title_or_isbn() {
        assert!(BookQuery::new("", "", "en", None, None).is_err());
        assert!(BookQuery::new("  ", "Someone", "en", None, None).is_err());
        assert!(BookQuery::new("Mistborn", "", "en", None, None).is_ok());
        assert!(BookQuery::new("", "", "en", None, Some("9780765311788".into())).is_ok());
    }

    #[test]
    fn query_normalizes_language() {
        let q = BookQuery::new("Mistborn", "Brandon Sanderson", "deu", None, None).unwrap();
        assert_eq!(q.language, "de");
        let q = BookQuery::new("Mistborn", "Brandon Sanderson", "nope", None, None).unwrap();
        assert_eq!(q.language, "en");
    }

    #[test]
    fn cache_key_is_case_and_space_insensitive() {
        let a = BookQuery::new("Mistborn", "Brandon  Sanderson", "en", None, None).unwrap();
        let b = BookQuery::new("MISTBORN", "brandon sanderson", "en", None, None).unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn cache_key_distinguishes_isbn() {
        let a = BookQuery::new("Mistborn", "", "en", None, None).unwrap();
        let b = BookQuery::new("Mistborn", "", "en", None, Some("9780765311788".into())).unwrap();
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn source_kind_parsing() {
        assert_eq!(SourceKind::parse("amazon"), Some(SourceKind::Amazon));
        assert_eq!(SourceKind::parse("Google"), Some(SourceKind::GoogleBooks));
        assert_eq!(SourceKind::parse("openlibrary"), Some(SourceKind::OpenLibrary));
        assert_eq!(SourceKind::parse("ebay"), None);
    }

    #[test]
    fn variant_display() {
        let v = SearchVariant {
            title: "Mistborn".into(),
            author: "Brandon Sanderson".into(),
            domain: "amazon.com".into(),
            isbn: None,
            tier: VariantTier::Primary,
        };
        assert_eq!(v.to_string(), "\"Mistborn\" by Brandon Sanderson @ amazon.com");

        let v = SearchVariant {
            title: String::new(),
            author: "Brandon Sanderson".into(),
            domain: "amazon.com".into(),
            isbn: None,
            tier: VariantTier::AuthorOnly,
        };
        assert_eq!(v.to_string(), "author:\"Brandon Sanderson\" @ amazon.com");
    }
}
