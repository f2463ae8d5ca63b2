//! Language code normalization and marketplace mapping.
//!
//! Metadata in the wild carries 2-letter codes (`de`), 3-letter codes in
//! both ISO 639-2 flavours (`deu`, `ger`), and region-qualified tags
//! (`de-DE`, `en_US`). Everything collapses to a 2-letter base code; codes
//! we cannot place default to English rather than failing.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Base language used when no signal is found.
pub const DEFAULT_LANG: &str = "en";

/// Map of known language codes (2-letter, 639-2/B and 639-2/T) to their
/// 2-letter base code.
static BASE_CODES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("en", "en"),
        ("eng", "en"),
        ("de", "de"),
        ("deu", "de"),
        ("ger", "de"),
        ("fr", "fr"),
        ("fra", "fr"),
        ("fre", "fr"),
        ("es", "es"),
        ("spa", "es"),
        ("it", "it"),
        ("ita", "it"),
        ("pt", "pt"),
        ("por", "pt"),
        ("nl", "nl"),
        ("nld", "nl"),
        ("dut", "nl"),
        ("ja", "ja"),
        ("jpn", "ja"),
        ("pl", "pl"),
        ("pol", "pl"),
        ("sv", "sv"),
        ("swe", "sv"),
    ])
});

/// Marketplace domain per base language code.
static MARKETPLACES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("en", "amazon.com"),
        ("de", "amazon.de"),
        ("fr", "amazon.fr"),
        ("es", "amazon.es"),
        ("it", "amazon.it"),
        ("pt", "amazon.com.br"),
        ("nl", "amazon.nl"),
        ("ja", "amazon.co.jp"),
        ("pl", "amazon.pl"),
        ("sv", "amazon.se"),
    ])
});

/// Marketplaces worth retrying a query on, most to least likely.
static FALLBACK_MARKETPLACES: &[&str] = &["amazon.com", "amazon.de", "amazon.co.uk"];

/// Collapse any recognized language code to its 2-letter base. Region
/// qualifiers are stripped first (`de-DE` and `de_DE` both read as `de`).
/// Unrecognized input yields [`DEFAULT_LANG`].
pub fn normalize(code: &str) -> &'static str {
    let trimmed = code.trim();
    let base = trimmed
        .split(['-', '_'])
        .next()
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    BASE_CODES.get(base.as_str()).copied().unwrap_or(DEFAULT_LANG)
}

/// True when the code (after trimming and region-stripping) is one we know.
pub fn is_known(code: &str) -> bool {
    let trimmed = code.trim();
    let base = trimmed
        .split(['-', '_'])
        .next()
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    BASE_CODES.contains_key(base.as_str())
}

/// Primary marketplace domain for a base language code.
pub fn marketplace(base: &str) -> &'static str {
    MARKETPLACES
        .get(base)
        .copied()
        .unwrap_or("amazon.com")
}

/// Marketplaces to retry on after the primary one, excluding `primary`
/// itself.
pub fn fallback_marketplaces(primary: &str) -> Vec<&'static str> {
    FALLBACK_MARKETPLACES
        .iter()
        .copied()
        .filter(|d| *d != primary)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_letter_codes_collapse() {
        assert_eq!(normalize("deu"), "de");
        assert_eq!(normalize("ger"), "de");
        assert_eq!(normalize("de"), "de");
        assert_eq!(normalize("fre"), "fr");
        assert_eq!(normalize("fra"), "fr");
    }

    #[test]
    fn region_qualifiers_stripped() {
        assert_eq!(normalize("de-DE"), "de");
        assert_eq!(normalize("en_US"), "en");
        assert_eq!(normalize("pt-BR"), "pt");
    }

    #[test]
    fn unknown_codes_default_without_raising() {
        assert_eq!(normalize("tlh"), DEFAULT_LANG);
        assert_eq!(normalize(""), DEFAULT_LANG);
        assert_eq!(normalize("zz-ZZ"), DEFAULT_LANG);
    }

    #[test]
    fn case_and_whitespace_tolerated() {
        assert_eq!(normalize(" DEU "), "de");
        assert_eq!(normalize("EN"), "en");
    }

    #[test]
    fn known_codes() {
        assert!(is_known("ger"));
        assert!(is_known("en_GB"));
        assert!(!is_known("tlh"));
    }

    #[test]
    fn marketplace_mapping() {
        assert_eq!(marketplace("de"), "amazon.de");
        assert_eq!(marketplace("en"), "amazon.com");
        assert_eq!(marketplace("xx"), "amazon.com");
    }

    #[test]
    fn fallbacks_exclude_primary() {
        let fallbacks = fallback_marketplaces("amazon.de");
        assert!(!fallbacks.contains(&"amazon.de"));
        assert!(fallbacks.contains(&"amazon.com"));
    }
}
