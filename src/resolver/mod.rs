//! Lookup orchestrator.
//!
//! Drives one lookup through its states: cache check, variant generation
//! (optionally fuzzy-expanded), source calls in fixed priority order
//! through the throttle, shape validation and the confidence gate, and the
//! final unconditional cache write. The search is greedy: the first
//! accepted candidate wins, and later higher-confidence candidates are
//! never retroactively preferred.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::asin;
use crate::cache::{AsinCache, CacheEntry};
use crate::error::LookupError;
use crate::extract;
use crate::fuzzy;
use crate::lang;
use crate::models::{
    Attempt, AttemptOutcome, BookQuery, Candidate, LookupResult, SearchVariant, SourceKind,
    VariantTier,
};
use crate::sources::BookSource;
use crate::throttle::Throttle;

/// Per-lookup knobs, set from the CLI.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Expand variants with author forms and series aliases.
    pub fuzzy: bool,
    /// Minimum confidence for accepting a candidate in fuzzy mode.
    pub fuzzy_threshold: f64,
    /// Bypass an existing cache entry (including negatives).
    pub refresh: bool,
    /// Restrict lookups to a subset of sources, preserving priority order.
    pub source_filter: Option<Vec<SourceKind>>,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            fuzzy: false,
            fuzzy_threshold: 0.8,
            refresh: false,
            source_filter: None,
        }
    }
}

/// Top-level lookup engine. Owns [`LookupResult`] construction; shares the
/// cache and throttle with every batch worker.
pub struct Resolver {
    sources: Vec<Arc<dyn BookSource>>,
    throttle: Throttle,
    cache: Arc<AsinCache>,
}

impl Resolver {
    /// The cache handle is passed in explicitly; there is no ambient
    /// global state.
    pub fn new(sources: Vec<Arc<dyn BookSource>>, throttle: Throttle, cache: Arc<AsinCache>) -> Self {
        Self {
            sources,
            throttle,
            cache,
        }
    }

    fn source(&self, kind: SourceKind) -> Option<&Arc<dyn BookSource>> {
        self.sources.iter().find(|s| s.kind() == kind)
    }

    /// Source order for one lookup: the fixed priority table, optionally
    /// filtered.
    fn source_order(&self, opts: &ResolveOptions) -> Vec<SourceKind> {
        SourceKind::PRIORITY
            .into_iter()
            .filter(|kind| {
                opts.source_filter
                    .as_ref()
                    .map_or(true, |filter| filter.contains(kind))
            })
            .filter(|kind| self.source(*kind).is_some())
            .collect()
    }

    /// Variants for one lookup: the extractor's priority sequence, plus
    /// fuzzy expansions on the primary marketplace when enabled.
    fn variants(&self, query: &BookQuery, opts: &ResolveOptions) -> Vec<SearchVariant> {
        let mut variants = extract::search_variants(query);

        if opts.fuzzy {
            let primary_domain = lang::marketplace(&query.language);
            for (title, author) in fuzzy::variants(&query.title, &query.author) {
                let dup = variants.iter().any(|v| {
                    v.title.eq_ignore_ascii_case(&title)
                        && v.author.eq_ignore_ascii_case(&author)
                        && v.domain == primary_domain
                });
                if !dup {
                    variants.push(SearchVariant {
                        title,
                        author,
                        domain: primary_domain.to_string(),
                        isbn: query.isbn.clone(),
                        tier: VariantTier::Fuzzy,
                    });
                }
            }
        }

        variants
    }

    /// First candidate passing shape validation and, in fuzzy mode, the
    /// confidence gate.
    fn accept<'a>(candidates: &'a [Candidate], opts: &ResolveOptions) -> Option<&'a Candidate> {
        candidates.iter().find(|c| {
            asin::is_valid_asin(&c.asin) && (!opts.fuzzy || c.confidence >= opts.fuzzy_threshold)
        })
    }

    /// Resolve one query to a [`LookupResult`].
    ///
    /// Per-source and per-variant failures are absorbed into the attempt
    /// trail; only an unusable query surfaces as an error. A cache write
    /// failure is logged and the result still returned.
    pub async fn lookup(
        &self,
        query: &BookQuery,
        opts: &ResolveOptions,
    ) -> Result<LookupResult, LookupError> {
        let started = Instant::now();
        let key = query.cache_key();

        if !opts.refresh {
            if let Some(entry) = self.cache.get(&key) {
                debug!(key = %key, "cache hit");
                return Ok(LookupResult::from_cache_entry(
                    entry.asin,
                    entry.source,
                    started.elapsed().as_millis() as u64,
                ));
            }
        }

        let variants = self.variants(query, opts);
        let order = self.source_order(opts);
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut accepted: Option<Candidate> = None;

        'search: for variant in &variants {
            for kind in &order {
                let source = self.source(*kind).expect("order only lists known sources");

                debug!(source = %kind, variant = %variant, "trying source");
                let outcome = match self.throttle.call(*kind, || source.search(variant)).await {
                    Ok(candidates) => match Self::accept(&candidates, opts) {
                        Some(candidate) => {
                            let candidate = candidate.clone();
                            let outcome = AttemptOutcome::Accepted {
                                asin: candidate.asin.clone(),
                                confidence: candidate.confidence,
                            };
                            attempts.push(Attempt {
                                source: *kind,
                                variant: variant.to_string(),
                                outcome,
                            });
                            accepted = Some(candidate);
                            break 'search;
                        }
                        None => AttemptOutcome::Rejected {
                            reason: format!(
                                "{} candidate(s), none passed validation and threshold",
                                candidates.len()
                            ),
                        },
                    },
                    Err(e) => AttemptOutcome::Failed {
                        reason: e.to_string(),
                    },
                };

                attempts.push(Attempt {
                    source: *kind,
                    variant: variant.to_string(),
                    outcome,
                });
            }
        }

        let entry = match &accepted {
            Some(candidate) => {
                info!(
                    asin = %candidate.asin,
                    source = %candidate.source,
                    confidence = candidate.confidence,
                    "resolved"
                );
                CacheEntry::positive(candidate.asin.clone(), candidate.source)
            }
            None => {
                info!(attempts = attempts.len(), "exhausted all sources without a match");
                CacheEntry::negative()
            }
        };

        if let Err(e) = self.cache.put(&key, entry) {
            warn!(error = %e, "cache write failed, continuing uncached");
        }

        Ok(LookupResult {
            asin: accepted.as_ref().map(|c| c.asin.clone()),
            source: accepted.as_ref().map(|c| c.source),
            attempts,
            elapsed_ms: started.elapsed().as_millis() as u64,
            from_cache: false,
        })
    }
}
