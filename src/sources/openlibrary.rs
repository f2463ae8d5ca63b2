//! Open Library bibliographic API adapter.
//!
//! Resolves by ISBN directly when the variant carries one; title/author
//! queries go through a search-then-resolve two-step (search for matching
//! works, then fetch edition detail for identifiers).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::asin;
use crate::error::SourceError;
use crate::fuzzy;
use crate::models::{Candidate, SearchVariant, SourceKind};

use super::{sort_candidates, urlencoded, BookSource};

const OPEN_LIBRARY_BASE: &str = "https://openlibrary.org";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Editions fetched per search before giving up on a variant.
const MAX_EDITION_FETCHES: usize = 3;

#[derive(Debug, Deserialize)]
struct Edition {
    title: Option<String>,
    identifiers: Option<EditionIdentifiers>,
}

#[derive(Debug, Deserialize)]
struct EditionIdentifiers {
    amazon: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    title: Option<String>,
    edition_key: Option<Vec<String>>,
}

/// Bibliographic API source.
pub struct OpenLibrarySource {
    client: reqwest::Client,
    base_url: String,
}

impl OpenLibrarySource {
    pub fn new() -> Self {
        Self::with_base_url(OPEN_LIBRARY_BASE)
    }

    /// Test hook: point the adapter at a mock server.
    pub fn with_base_url(base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            base_url: base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(SourceError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            let retry_after = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(super::status_error(status.as_u16(), retry_after));
        }

        resp.json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))
    }

    fn edition_asin(edition: &Edition) -> Option<String> {
        edition
            .identifiers
            .as_ref()?
            .amazon
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find_map(|raw| asin::normalize_asin(raw.trim()))
    }

    /// Direct edition fetch by ISBN. An edition without an Amazon
    /// identifier is a miss, not an error.
    async fn resolve_isbn(&self, isbn: &str) -> Result<Option<Candidate>, SourceError> {
        let url = format!("{}/isbn/{}.json", self.base_url, urlencoded(isbn));
        debug!(url = %url, "open library isbn resolve");

        let edition = match self.get_json::<Edition>(&url).await {
            Ok(edition) => edition,
            // Unknown ISBNs come back 404; fall through to search.
            Err(SourceError::Http(404)) => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(Self::edition_asin(&edition).map(|asin| Candidate {
            asin,
            source: SourceKind::OpenLibrary,
            // The ISBN is an exact key; there is no title to compare.
            confidence: 1.0,
            raw_title: edition.title.unwrap_or_default(),
        }))
    }

    /// Search for matching works, then fetch edition detail for each until
    /// one carries an Amazon identifier.
    async fn search_editions(&self, variant: &SearchVariant) -> Result<Vec<Candidate>, SourceError> {
        let mut url = format!("{}/search.json?limit=5", self.base_url);
        if !variant.title.is_empty() {
            url.push_str(&format!("&title={}", urlencoded(&variant.title)));
        }
        if !variant.author.is_empty() {
            url.push_str(&format!("&author={}", urlencoded(&variant.author)));
        }
        debug!(url = %url, "open library search");

        let body: SearchResponse = self.get_json(&url).await?;

        let mut candidates = Vec::new();
        let mut fetches = 0usize;
        for doc in &body.docs {
            let Some(olid) = doc.edition_key.as_deref().and_then(|keys| keys.first()) else {
                continue;
            };
            if fetches >= MAX_EDITION_FETCHES {
                break;
            }
            fetches += 1;

            let edition_url = format!("{}/books/{}.json", self.base_url, olid);
            debug!(url = %edition_url, "open library edition fetch");
            let edition: Edition = match self.get_json(&edition_url).await {
                Ok(edition) => edition,
                Err(SourceError::Http(404)) => continue,
                Err(e) => return Err(e),
            };

            if let Some(asin) = Self::edition_asin(&edition) {
                let raw_title = edition
                    .title
                    .or_else(|| doc.title.clone())
                    .unwrap_or_default();
                candidates.push(Candidate {
                    confidence: fuzzy::similarity(&variant.title, &raw_title),
                    asin,
                    source: SourceKind::OpenLibrary,
                    raw_title,
                });
            }
        }

        Ok(candidates)
    }
}

impl Default for OpenLibrarySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookSource for OpenLibrarySource {
    fn kind(&self) -> SourceKind {
        SourceKind::OpenLibrary
    }

    async fn search(&self, variant: &SearchVariant) -> Result<Vec<Candidate>, SourceError> {
        if let Some(ref isbn) = variant.isbn {
            if let Some(candidate) = self.resolve_isbn(isbn).await? {
                return Ok(vec![candidate]);
            }
        }

        if variant.title.is_empty() && variant.author.is_empty() {
            return Err(SourceError::NoResults);
        }

        let mut candidates = self.search_editions(variant).await?;
        if candidates.is_empty() {
            return Err(SourceError::NoResults);
        }
        sort_candidates(&mut candidates);
        Ok(candidates)
    }
}
