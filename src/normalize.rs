//! Text normalization for column names and amenity strings.
//!
//! Datasets mix German and English column names (`Schwimmbad`, `Frühstück`,
//! `free-wifi`), so every key is folded to a canonical ASCII form before it is
//! compared with seed lists or oracle answers.

use unicode_normalization::UnicodeNormalization;

/// German letters that must expand to two ASCII letters instead of losing
/// their diacritic.
const DIGRAPHS: &[(char, &str)] = &[
    ('ä', "ae"),
    ('ö', "oe"),
    ('ü', "ue"),
    ('Ä', "Ae"),
    ('Ö', "Oe"),
    ('Ü', "Ue"),
    ('ß', "ss"),
];

/// Canonicalize a column name or amenity string.
///
/// German umlauts expand first, remaining accents are decomposed and dropped,
/// then the text is lowercased, hyphens become underscores, and anything that
/// is not `a-z`, `0-9`, space, `_`, `/`, or a bracket is removed.
pub fn normalize(text: &str) -> String {
    let mut expanded = String::with_capacity(text.len());
    for c in text.chars() {
        match DIGRAPHS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => expanded.push_str(to),
            None => expanded.push(c),
        }
    }

    expanded
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .map(|c| if c == '-' { '_' } else { c })
        .filter(|c| is_kept(*c))
        .collect()
}

fn is_kept(c: char) -> bool {
    c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || matches!(c, ' ' | '_' | '/' | '(' | ')' | '[' | ']')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_german_digraphs() {
        let out = normalize("Müller-Straße");
        assert_eq!(out, "mueller_strasse");
        assert!(!out.contains('-'));
        assert!(out.is_ascii());
    }

    #[test]
    fn test_generic_accents_stripped() {
        assert_eq!(normalize("Café Crème"), "cafe creme");
        assert_eq!(normalize("Ärztlicher Dienst"), "aerztlicher dienst");
    }

    #[test]
    fn test_punctuation_removed_brackets_kept() {
        assert_eq!(normalize("Price/Night (EUR)!"), "price/night (eur)");
        assert_eq!(normalize("rooms[2A1C]"), "rooms[2a1c]");
        assert_eq!(normalize("Wi-Fi, free."), "wi_fi free");
    }

    #[test]
    fn test_empty_and_non_latin() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("日本"), "");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("Außenpool & Sauna-Bereich");
        assert_eq!(normalize(&once), once);
    }
}
