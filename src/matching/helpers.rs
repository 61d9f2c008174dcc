//! Shared string similarity helpers. All scores are on [0, 1].

use strsim::levenshtein;

/// Jaro-Winkler similarity; an empty side scores 0 so that missing values
/// never look like agreement.
#[inline]
pub(crate) fn jaro_winkler(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::jaro_winkler(a, b)
}

/// Hamming similarity over chars, counting any length difference as
/// mismatches: `1 - mismatches / max_len`.
pub(crate) fn hamming_similarity(a: &str, b: &str) -> f64 {
    let la = a.chars().count();
    let lb = b.chars().count();
    let max_len = la.max(lb);
    if max_len == 0 {
        return 1.0;
    }
    let same = a.chars().zip(b.chars()).filter(|(x, y)| x == y).count();
    same as f64 / max_len as f64
}

/// Levenshtein distance normalized by the longer string.
pub(crate) fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// `"{a} {b}"` without a dangling space when `b` is empty.
pub(crate) fn join_space(a: &str, b: &str) -> String {
    if b.is_empty() {
        a.to_string()
    } else {
        format!("{} {}", a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaro_winkler_empty_is_zero() {
        assert_eq!(jaro_winkler("", ""), 0.0);
        assert_eq!(jaro_winkler("SMITH", ""), 0.0);
        assert_eq!(jaro_winkler("SMITH", "SMITH"), 1.0);
    }

    #[test]
    fn hamming_counts_length_difference() {
        assert_eq!(hamming_similarity("205", "205"), 1.0);
        assert!((hamming_similarity("205", "206") - 2.0 / 3.0).abs() < 1e-12);
        assert!((hamming_similarity("12", "123") - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(hamming_similarity("1", "9"), 0.0);
    }

    #[test]
    fn levenshtein_normalized() {
        assert_eq!(levenshtein_similarity("43215", "43215"), 1.0);
        assert!((levenshtein_similarity("43215", "43216") - 0.8).abs() < 1e-12);
        assert_eq!(levenshtein_similarity("", "43215"), 0.0);
    }

    #[test]
    fn join_space_skips_empty() {
        assert_eq!(join_space("MAIN", "ST"), "MAIN ST");
        assert_eq!(join_space("MAIN", ""), "MAIN");
    }
}
