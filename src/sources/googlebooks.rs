//! Google Books volumes API adapter.
//!
//! Structured queries against a public book-metadata API; identifiers come
//! out of typed response fields, not HTML. Field-scoped strategies are
//! tried in sequence: title+author combined first, then title alone.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::asin;
use crate::error::SourceError;
use crate::fuzzy;
use crate::models::{Candidate, SearchVariant, SourceKind};

use super::{sort_candidates, urlencoded, BookSource};

const GOOGLE_BOOKS_BASE: &str = "https://www.googleapis.com/books/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    items: Option<Vec<Volume>>,
}

#[derive(Debug, Deserialize)]
struct Volume {
    #[serde(rename = "volumeInfo")]
    volume_info: VolumeInfo,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    title: Option<String>,
    #[serde(rename = "industryIdentifiers")]
    industry_identifiers: Option<Vec<IndustryIdentifier>>,
}

#[derive(Debug, Deserialize)]
struct IndustryIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}

/// Book-metadata API source.
pub struct GoogleBooksSource {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleBooksSource {
    pub fn new() -> Self {
        Self::with_base_url(GOOGLE_BOOKS_BASE)
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

    /// Field-scoped query strings for a variant, in the order to try them.
    fn query_strategies(variant: &SearchVariant) -> Vec<String> {
        let mut strategies = Vec::new();
        match (!variant.title.is_empty(), !variant.author.is_empty()) {
            (true, true) => {
                strategies.push(format!(
                    "intitle:\"{}\" inauthor:\"{}\"",
                    variant.title, variant.author
                ));
                strategies.push(format!("intitle:\"{}\"", variant.title));
            }
            (true, false) => strategies.push(format!("intitle:\"{}\"", variant.title)),
            (false, true) => strategies.push(format!("inauthor:\"{}\"", variant.author)),
            (false, false) => {}
        }
        strategies
    }

    /// ASIN out of a volume's identifier list, when one is present.
    ///
    /// Amazon identifiers surface under type `OTHER`, sometimes prefixed
    /// `ASIN:`.
    fn extract_asin(info: &VolumeInfo) -> Option<String> {
        info.industry_identifiers
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter(|id| id.kind == "OTHER")
            .find_map(|id| {
                let raw = id.identifier.strip_prefix("ASIN:").unwrap_or(&id.identifier);
                asin::normalize_asin(raw.trim())
            })
    }

    async fn query(&self, q: &str, query_title: &str) -> Result<Vec<Candidate>, SourceError> {
        let url = format!(
            "{}/volumes?q={}&maxResults={MAX_RESULTS}&printType=books",
            self.base_url,
            urlencoded(q)
        );
        debug!(url = %url, "google books search");

        let resp = self
            .client
            .get(&url)
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

        let body: VolumesResponse = resp
            .json()
            .await
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let candidates = body
            .items
            .unwrap_or_default()
            .into_iter()
            .filter_map(|v| {
                let asin = Self::extract_asin(&v.volume_info)?;
                let raw_title = v.volume_info.title.unwrap_or_default();
                Some(Candidate {
                    confidence: fuzzy::similarity(query_title, &raw_title),
                    asin,
                    source: SourceKind::GoogleBooks,
                    raw_title,
                })
            })
            .collect();

        Ok(candidates)
    }
}

impl Default for GoogleBooksSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookSource for GoogleBooksSource {
    fn kind(&self) -> SourceKind {
        SourceKind::GoogleBooks
    }

    async fn search(&self, variant: &SearchVariant) -> Result<Vec<Candidate>, SourceError> {
        let strategies = Self::query_strategies(variant);
        if strategies.is_empty() {
            return Err(SourceError::NoResults);
        }

        let mut last_err = None;
        for q in &strategies {
            match self.query(q, &variant.title).await {
                Ok(mut candidates) if !candidates.is_empty() => {
                    sort_candidates(&mut candidates);
                    return Ok(candidates);
                }
                Ok(_) => {}
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or(SourceError::NoResults))
    }
}
