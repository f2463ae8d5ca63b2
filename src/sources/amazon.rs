//! Regional storefront search adapter.
//!
//! Issues a query against a marketplace search page and parses the result
//! listing for embedded ASINs. Two search scopes are tried in sequence on
//! a single query: digital editions first, then the general book index.
//!
//! Page retrieval sits behind [`SearchPageFetcher`] so a browser-automation
//! backend can be slotted in; the default implementation is a plain HTTP
//! GET.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};
use tracing::debug;

use crate::asin;
use crate::error::SourceError;
use crate::fuzzy;
use crate::models::{Candidate, SearchVariant, SourceKind};

use super::{sort_candidates, urlencoded, BookSource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Search scopes tried in sequence on one query: Kindle store first, then
/// the general book index.
const SEARCH_SCOPES: &[&str] = &["digital-text", "stripbooks"];

/// Contract for retrieving raw search-result HTML for a query URL.
#[async_trait]
pub trait SearchPageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, SourceError>;
}

/// Default fetcher: a plain HTTP GET with a desktop user agent.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .expect("failed to build reqwest client");
        Self { client }
    }
}

impl Default for HttpPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchPageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, SourceError> {
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

        resp.text().await.map_err(SourceError::from_reqwest)
    }
}

/// Marketplace search source.
pub struct AmazonSource {
    fetcher: Arc<dyn SearchPageFetcher>,
    /// Test hook: replaces `https://www.{domain}` as the URL prefix.
    base_override: Option<String>,
}

impl AmazonSource {
    pub fn new(fetcher: Arc<dyn SearchPageFetcher>) -> Self {
        Self {
            fetcher,
            base_override: None,
        }
    }

    /// Route every marketplace request to a fixed base URL instead of the
    /// variant's domain.
    pub fn with_base_url(fetcher: Arc<dyn SearchPageFetcher>, base: impl Into<String>) -> Self {
        Self {
            fetcher,
            base_override: Some(base.into()),
        }
    }

    fn search_url(&self, variant: &SearchVariant, scope: &str) -> String {
        let base = match &self.base_override {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://www.{}", variant.domain),
        };
        let terms = if variant.title.is_empty() {
            variant.author.clone()
        } else if variant.author.is_empty() {
            variant.title.clone()
        } else {
            format!("{} {}", variant.title, variant.author)
        };
        format!("{base}/s?k={}&i={scope}", urlencoded(&terms))
    }

    /// Pull (asin, title) pairs out of a result listing.
    fn parse_listing(html: &str, query_title: &str) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let result_sel = Selector::parse("div[data-asin]").expect("static selector");
        let title_sel = Selector::parse("h2 span").expect("static selector");

        let mut candidates = Vec::new();
        for element in document.select(&result_sel) {
            let Some(raw_asin) = element.value().attr("data-asin") else {
                continue;
            };
            let Some(normalized) = asin::normalize_asin(raw_asin) else {
                continue;
            };

            let raw_title = element
                .select(&title_sel)
                .next()
                .map(|t| t.text().collect::<String>())
                .unwrap_or_default()
                .trim()
                .to_string();

            candidates.push(Candidate {
                confidence: fuzzy::similarity(query_title, &raw_title),
                asin: normalized,
                source: SourceKind::Amazon,
                raw_title,
            });
        }
        candidates
    }
}

#[async_trait]
impl BookSource for AmazonSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Amazon
    }

    async fn search(&self, variant: &SearchVariant) -> Result<Vec<Candidate>, SourceError> {
        let mut last_err = None;

        for scope in SEARCH_SCOPES {
            let url = self.search_url(variant, scope);
            debug!(url = %url, scope = scope, "marketplace search");

            let html = match self.fetcher.fetch(&url).await {
                Ok(html) => html,
                Err(e) => {
                    last_err = Some(e);
                    continue;
                }
            };

            let mut candidates = Self::parse_listing(&html, &variant.title);
            if !candidates.is_empty() {
                sort_candidates(&mut candidates);
                return Ok(candidates);
            }
        }

        Err(last_err.unwrap_or(SourceError::NoResults))
    }
}
