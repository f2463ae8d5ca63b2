//! Fuzzy variation generation and title similarity scoring.
//!
//! The generator expands a (title, author) pair into the textual forms
//! sources actually index: author name permutations and sibling volume
//! titles within a known series. Same input always yields the same set;
//! pairs differing only by case are deduplicated.

use std::collections::BTreeSet;

use crate::titles;

/// Collapse a title for comparison: lowercase, alphanumerics and single
/// spaces only.
pub fn normalize_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_space = true;
    for c in s.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

/// Similarity between a query title and a raw result title, in [0, 1].
/// Jaro-Winkler over the normalized forms; an empty side scores 0.
pub fn similarity(query: &str, raw: &str) -> f64 {
    let a = normalize_title(query);
    let b = normalize_title(raw);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::jaro_winkler(&a, &b)
}

/// Author name forms sources index under: full, surname-only,
/// "Surname, First", and initialed.
fn author_forms(author: &str) -> Vec<String> {
    let author = author.split_whitespace().collect::<Vec<_>>().join(" ");
    if author.is_empty() {
        return vec![String::new()];
    }

    let mut forms = vec![author.clone()];
    let parts: Vec<&str> = author.split(' ').collect();
    if parts.len() >= 2 {
        let surname = parts[parts.len() - 1];
        let given = parts[..parts.len() - 1].join(" ");
        forms.push(surname.to_string());
        forms.push(format!("{surname}, {given}"));
        let initials: String = parts[..parts.len() - 1]
            .iter()
            .filter_map(|p| p.chars().next())
            .map(|c| format!("{}. ", c.to_uppercase()))
            .collect();
        forms.push(format!("{}{surname}", initials));
    }
    forms
}

/// Alternate volume titles for a title within a known series, plus the
/// title itself.
fn title_forms(title: &str) -> Vec<String> {
    let mut forms = vec![title.to_string()];
    forms.extend(titles::series_aliases(title).into_iter().map(String::from));
    forms
}

/// Deterministic set of (title, author) pairs for weak matching.
///
/// Set semantics: order-independent, deduplicated case-insensitively. The
/// input pair itself is always a member.
pub fn variants(title: &str, author: &str) -> BTreeSet<(String, String)> {
    let mut seen = BTreeSet::new();
    let mut out = BTreeSet::new();
    for t in title_forms(title) {
        for a in author_forms(author) {
            let key = (t.to_lowercase(), a.to_lowercase());
            if seen.insert(key) {
                out.insert((t.clone(), a));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_punctuation() {
        assert_eq!(normalize_title("Mistborn: The Final Empire"), "mistborn the final empire");
        assert_eq!(normalize_title("  Der  Weg   der Könige!"), "der weg der könige");
    }

    #[test]
    fn similarity_bounds() {
        assert!((similarity("Mistborn", "Mistborn") - 1.0).abs() < f64::EPSILON);
        assert_eq!(similarity("", "Mistborn"), 0.0);
        let s = similarity("Mistborn", "Mistborn: The Final Empire");
        assert!(s > 0.7 && s < 1.0);
    }

    #[test]
    fn similarity_ignores_case() {
        assert!((similarity("MISTBORN", "mistborn") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn author_forms_cover_conventions() {
        let forms = author_forms("Brandon Sanderson");
        assert!(forms.contains(&"Brandon Sanderson".to_string()));
        assert!(forms.contains(&"Sanderson".to_string()));
        assert!(forms.contains(&"Sanderson, Brandon".to_string()));
        assert!(forms.contains(&"B. Sanderson".to_string()));
    }

    #[test]
    fn variants_deterministic_and_deduplicated() {
        let a = variants("Mistborn", "Brandon Sanderson");
        let b = variants("Mistborn", "Brandon Sanderson");
        assert_eq!(a, b);

        // Case-only differences collapse.
        let c = variants("MISTBORN", "BRANDON SANDERSON");
        assert_eq!(a.len(), c.len());
    }

    #[test]
    fn variants_include_series_aliases() {
        let set = variants("Mistborn", "Brandon Sanderson");
        assert!(set
            .iter()
            .any(|(t, _)| t == "The Well of Ascension"));
    }

    #[test]
    fn variants_include_input_pair() {
        let set = variants("Standalone", "Jane Doe");
        assert!(set.contains(&("Standalone".to_string(), "Jane Doe".to_string())));
    }

    #[test]
    fn single_name_author_has_no_permutations() {
        let forms = author_forms("Homer");
        assert_eq!(forms, vec!["Homer".to_string()]);
    }
}
