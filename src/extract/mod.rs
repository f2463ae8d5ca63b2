//! Localization extractor: file/metadata to [`BookQuery`], and query to
//! prioritized [`SearchVariant`]s.
//!
//! Extraction never fails. Embedded metadata is preferred; a corrupt or
//! bare file degrades to filename conventions, and in the worst case to a
//! single title-like token. Language comes from the metadata code, from a
//! localized-title dictionary hit, or defaults to the base language.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::calibre::{self, EbookMeta};
use crate::lang;
use crate::models::{BookQuery, SearchVariant, VariantTier};
use crate::titles;

/// `(Series Name #2)` or `(Series Name 2)` in a filename. The volume
/// number is required so ordinary parenthesized noise never reads as a
/// series.
static SERIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)#]*[^)#\d])\s*#?\s*\d+(?:\.\d+)?\)").expect("static regex"));

/// Bracketed or parenthesized noise groups.
static NOISE_GROUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[(\[][^)\]]*[)\]]").expect("static regex"));

/// Edition/format tokens that never belong in a search query.
static NOISE_TOKENS: &[&str] = &[
    "kindle edition",
    "german edition",
    "english edition",
    "special edition",
    "unabridged",
    "ebook",
    "epub",
    "roman",
    "a novel",
];

/// Derive the best available [`BookQuery`] for a file.
///
/// Tries embedded metadata first (when the external suite's tool is on the
/// PATH), then filename conventions. This function never errors; the
/// fallback chain always produces something searchable.
pub fn extract(path: &Path) -> BookQuery {
    if calibre::ebook_meta_available() {
        match calibre::read_metadata(path) {
            Ok(meta) => {
                if let Some(query) = from_metadata(&meta) {
                    return query;
                }
                debug!(path = %path.display(), "embedded metadata incomplete, using filename");
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "metadata read failed, using filename");
            }
        }
    }
    from_filename(path)
}

/// Build a query from embedded metadata. `None` when the metadata lacks a
/// usable title.
pub fn from_metadata(meta: &EbookMeta) -> Option<BookQuery> {
    let title = meta.title.as_deref()?.trim().to_string();
    if title.is_empty() {
        return None;
    }

    let author = meta.author.clone().unwrap_or_default();
    let language = detect_language(meta.language.as_deref(), &title);

    BookQuery::new(title, author, language, meta.series.clone(), None).ok()
}

/// Build a query from filename conventions alone. Never fails: the file
/// stem itself is the last-resort title token.
pub fn from_filename(path: &Path) -> BookQuery {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .replace('_', " ");

    let series = SERIES_RE
        .captures(&stem)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty());

    let cleaned = NOISE_GROUP_RE.replace_all(&stem, "");
    let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");

    let (title, author) = split_title_author(&cleaned);
    let title = if title.is_empty() { cleaned.clone() } else { title };
    let language = detect_language(None, &title);

    BookQuery::new(title, author, language, series, None).unwrap_or_else(|_| BookQuery {
        title: stem,
        author: String::new(),
        language: lang::DEFAULT_LANG.to_string(),
        series: None,
        isbn: None,
    })
}

/// Split a `Title - Author` stem. A comma in the trailing part reads as
/// `Surname, First`; a stem without a separator is all title.
fn split_title_author(stem: &str) -> (String, String) {
    match stem.rsplit_once(" - ") {
        Some((title, author)) if !author.trim().is_empty() => {
            (title.trim().to_string(), author.trim().to_string())
        }
        _ => (stem.trim().to_string(), String::new()),
    }
}

fn detect_language(code: Option<&str>, title: &str) -> &'static str {
    if let Some(code) = code {
        if lang::is_known(code) {
            return lang::normalize(code);
        }
    }
    titles::language_of(title).unwrap_or(lang::DEFAULT_LANG)
}

/// Strip edition/subtitle noise from a title: bracketed groups, the
/// subtitle after a colon, and known format tokens.
pub fn strip_noise(title: &str) -> String {
    let stripped = NOISE_GROUP_RE.replace_all(title, "");
    let stripped = stripped.split(':').next().unwrap_or(&stripped).trim();

    let mut out = stripped.to_string();
    for token in NOISE_TOKENS {
        let lower = out.to_lowercase();
        if let Some(pos) = lower.find(token) {
            // Only strip whole trailing tokens, not words inside the title.
            if pos + token.len() == lower.len() {
                out.truncate(pos);
            }
        }
    }
    out.trim().trim_end_matches(['-', ',']).trim().to_string()
}

/// Ordered search variants for a query, highest priority first.
///
/// The sequence is finite; callers stop consuming once a candidate is
/// accepted.
pub fn search_variants(query: &BookQuery) -> Vec<SearchVariant> {
    let primary_domain = lang::marketplace(&query.language);
    let mut variants: Vec<SearchVariant> = Vec::new();

    let mut push = |title: &str, author: &str, domain: &str, tier: VariantTier| {
        let dup = variants.iter().any(|v| {
            v.title.eq_ignore_ascii_case(title)
                && v.author.eq_ignore_ascii_case(author)
                && v.domain == domain
        });
        if !dup {
            variants.push(SearchVariant {
                title: title.to_string(),
                author: author.to_string(),
                domain: domain.to_string(),
                isbn: query.isbn.clone(),
                tier,
            });
        }
    };

    // (1) localized title + author on the native marketplace
    push(&query.title, &query.author, primary_domain, VariantTier::Primary);

    // (2) canonical-English equivalent, when the dictionary knows one
    if let Some(canonical) = titles::canonical_for(&query.title) {
        push(
            canonical,
            &query.author,
            lang::marketplace("en"),
            VariantTier::Canonical,
        );
    }

    // (3) series-level title
    let series = query
        .series
        .clone()
        .or_else(|| titles::series_of(&query.title).map(String::from));
    if let Some(series) = series {
        if !series.eq_ignore_ascii_case(&query.title) {
            push(&series, &query.author, primary_domain, VariantTier::Series);
        }
    }

    // (4) author-only
    if !query.author.is_empty() {
        push("", &query.author, primary_domain, VariantTier::AuthorOnly);
    }

    // (5) noise-stripped title
    let stripped = strip_noise(&query.title);
    if !stripped.is_empty() && stripped != query.title {
        push(&stripped, &query.author, primary_domain, VariantTier::Stripped);
    }

    // (6) same title on the remaining marketplaces
    for domain in lang::fallback_marketplaces(primary_domain) {
        push(&query.title, &query.author, domain, VariantTier::CrossMarket);
    }

    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn filename_title_author_convention() {
        let q = from_filename(&PathBuf::from("Mistborn - Brandon Sanderson.epub"));
        assert_eq!(q.title, "Mistborn");
        assert_eq!(q.author, "Brandon Sanderson");
        assert_eq!(q.language, "en");
    }

    #[test]
    fn filename_underscores_and_series() {
        let q = from_filename(&PathBuf::from("Kinder_des_Nebels_-_Brandon_Sanderson_(Mistborn #1).epub"));
        assert_eq!(q.title, "Kinder des Nebels");
        assert_eq!(q.author, "Brandon Sanderson");
        assert_eq!(q.series.as_deref(), Some("Mistborn"));
        // Localized title carries the language signal.
        assert_eq!(q.language, "de");
    }

    #[test]
    fn filename_without_separator_is_all_title() {
        let q = from_filename(&PathBuf::from("mistborn.epub"));
        assert_eq!(q.title, "mistborn");
        assert_eq!(q.author, "");
    }

    #[test]
    fn metadata_preferred_fields() {
        let meta = EbookMeta {
            title: Some("Kinder des Nebels".into()),
            author: Some("Brandon Sanderson".into()),
            language: Some("deu".into()),
            series: Some("Mistborn".into()),
        };
        let q = from_metadata(&meta).unwrap();
        assert_eq!(q.language, "de");
        assert_eq!(q.series.as_deref(), Some("Mistborn"));
    }

    #[test]
    fn metadata_without_title_is_rejected() {
        let meta = EbookMeta {
            title: None,
            author: Some("Someone".into()),
            ..Default::default()
        };
        assert!(from_metadata(&meta).is_none());
    }

    #[test]
    fn unknown_language_code_falls_back_to_title_signal() {
        let meta = EbookMeta {
            title: Some("Kinder des Nebels".into()),
            author: None,
            language: Some("xx-weird".into()),
            series: None,
        };
        let q = from_metadata(&meta).unwrap();
        assert_eq!(q.language, "de");
    }

    #[test]
    fn noise_stripping() {
        assert_eq!(strip_noise("Mistborn: The Final Empire"), "Mistborn");
        assert_eq!(strip_noise("Mistborn (German Edition)"), "Mistborn");
        assert_eq!(strip_noise("Kinder des Nebels Roman"), "Kinder des Nebels");
        assert_eq!(strip_noise("Plain Title"), "Plain Title");
    }

    #[test]
    fn variant_order_for_localized_query() {
        let q = BookQuery::new(
            "Kinder des Nebels",
            "Brandon Sanderson",
            "de",
            None,
            None,
        )
        .unwrap();
        let variants = search_variants(&q);

        assert_eq!(variants[0].tier, VariantTier::Primary);
        assert_eq!(variants[0].domain, "amazon.de");

        let canonical = variants.iter().find(|v| v.tier == VariantTier::Canonical).unwrap();
        assert_eq!(canonical.title, "Mistborn");
        assert_eq!(canonical.domain, "amazon.com");

        // Canonical comes before any cross-market retry.
        let canonical_pos = variants.iter().position(|v| v.tier == VariantTier::Canonical).unwrap();
        let cross_pos = variants.iter().position(|v| v.tier == VariantTier::CrossMarket).unwrap();
        assert!(canonical_pos < cross_pos);
    }

    #[test]
    fn variants_deduplicate() {
        let q = BookQuery::new("Mistborn", "Brandon Sanderson", "en", Some("Mistborn".into()), None).unwrap();
        let variants = search_variants(&q);
        // Series name equals the title, so no separate series variant.
        assert!(variants.iter().all(|v| v.tier != VariantTier::Series));

        let mut keys: Vec<String> = variants
            .iter()
            .map(|v| format!("{}|{}|{}", v.title.to_lowercase(), v.author.to_lowercase(), v.domain))
            .collect();
        let before = keys.len();
        keys.dedup();
        assert_eq!(before, keys.len());
    }

    #[test]
    fn author_only_variant_present() {
        let q = BookQuery::new("Mistborn", "Brandon Sanderson", "en", None, None).unwrap();
        let variants = search_variants(&q);
        let author_only = variants.iter().find(|v| v.tier == VariantTier::AuthorOnly).unwrap();
        assert!(author_only.title.is_empty());
        assert_eq!(author_only.author, "Brandon Sanderson");
    }
}
