//! ASIN shape validation.
//!
//! An ASIN is exactly ten alphanumeric characters beginning with `B`.
//! Ten-digit numeric codes are ISBN-10s, a different identifier namespace,
//! and are rejected even though they appear in the same page locations.

/// Check whether `candidate` has the shape of an ASIN. Case-insensitive,
/// no side effects.
pub fn is_valid_asin(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() != 10 {
        return false;
    }
    if !bytes[0].eq_ignore_ascii_case(&b'B') {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_alphanumeric())
}

/// Canonical uppercase form of a valid ASIN, or `None` when the shape check
/// fails.
pub fn normalize_asin(candidate: &str) -> Option<String> {
    if is_valid_asin(candidate) {
        Some(candidate.to_ascii_uppercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_standard_asins() {
        assert!(is_valid_asin("B00ZVA3XL6"));
        assert!(is_valid_asin("B0041JKFJW"));
        assert!(is_valid_asin("B000000000"));
    }

    #[test]
    fn case_insensitive() {
        assert!(is_valid_asin("b00zva3xl6"));
        assert!(is_valid_asin("B00zVa3Xl6"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_asin(""));
        assert!(!is_valid_asin("B00ZVA3XL"));
        assert!(!is_valid_asin("B00ZVA3XL6A"));
    }

    #[test]
    fn rejects_isbn10_lookalikes() {
        // Plain numeric ISBN-10s never start with B.
        assert!(!is_valid_asin("0765311788"));
        assert!(!is_valid_asin("316602501X"));
    }

    #[test]
    fn rejects_wrong_prefix_and_symbols() {
        assert!(!is_valid_asin("A00ZVA3XL6"));
        assert!(!is_valid_asin("B00ZVA3X-6"));
        assert!(!is_valid_asin("B00ZVA3X 6"));
    }

    #[test]
    fn normalization_uppercases() {
        assert_eq!(normalize_asin("b00zva3xl6").as_deref(), Some("B00ZVA3XL6"));
        assert_eq!(normalize_asin("0765311788"), None);
    }
}
