use unicode_normalization::UnicodeNormalization;

/// Canonical form of a blocking-key component: diacritics removed,
/// upper-cased, inner whitespace collapsed.
pub fn normalize_key(input: &str) -> String {
    let stripped: String = input
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();
    let mut out = String::with_capacity(stripped.len());
    for word in stripped.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        for uc in word.chars().flat_map(char::to_uppercase) {
            out.push(uc);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics_and_case() {
        assert_eq!(normalize_key("Núñez"), "NUNEZ");
        assert_eq!(normalize_key("  garden   st "), "GARDEN ST");
    }

    #[test]
    fn blank_stays_blank() {
        assert_eq!(normalize_key(""), "");
        assert_eq!(normalize_key(" \t "), "");
    }
}
