//! Romanian / English language detection
//!
//! Diacritics are a strong signal for Romanian. Without them, two disjoint
//! function-word sets are tested and an inconclusive result falls back to
//! the configured default.

use regex::Regex;
use std::sync::OnceLock;

use crate::types::Language;

/// Romanian letters with diacritics, including the cedilla variants ş ţ
const RO_DIACRITICS: &[char] = &['ă', 'â', 'î', 'ș', 'ț', 'ş', 'ţ'];

fn romanian_words() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(si|este|sunt|care|ce|cum|unde|cine|cand|pentru|vreme|vremea|maine|azi|acum|buna|salut|multumesc|te rog|despre|din|cu|nu|da|sau|pe|mai|foarte|eu|tu|noi|voi|vreau|poti|spune|imi|la|ziua|seara|cat|cati|orase|oras)\b",
        )
        .expect("Invalid regex")
    })
}

fn english_words() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(the|is|are|what|what's|how|where|who|when|why|weather|tomorrow|today|please|thanks|thank|hello|hi|and|of|for|with|you|your|my|can|could|tell|me|does|will|should)\b",
        )
        .expect("Invalid regex")
    })
}

/// Detect the language of `text`; total and deterministic
pub fn detect(text: &str, default: Language) -> Language {
    let lower = text.to_lowercase();

    if lower.chars().any(|c| RO_DIACRITICS.contains(&c)) {
        return Language::Ro;
    }

    match (
        romanian_words().is_match(&lower),
        english_words().is_match(&lower),
    ) {
        (true, false) => Language::Ro,
        (false, true) => Language::En,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diacritics_always_romanian() {
        for text in [
            "vreme în București",
            "Ce faci? Mâine plouă",
            "what is ţuică",
            "the weather in Iaşi please",
            "ăâ",
        ] {
            assert_eq!(detect(text, Language::En), Language::Ro, "{}", text);
        }
    }

    #[test]
    fn test_uppercase_diacritics_are_lowered() {
        assert_eq!(detect("ȘTIRI", Language::En), Language::Ro);
    }

    #[test]
    fn test_english_only_keywords() {
        assert_eq!(detect("weather tomorrow in Paris", Language::Ro), Language::En);
        assert_eq!(detect("What is the capital of Peru", Language::Ro), Language::En);
    }

    #[test]
    fn test_romanian_without_diacritics() {
        assert_eq!(detect("vreme la Cluj", Language::En), Language::Ro);
        assert_eq!(detect("salut, ce faci", Language::En), Language::Ro);
    }

    #[test]
    fn test_inconclusive_uses_default() {
        assert_eq!(detect("wiki Romania", Language::En), Language::En);
        assert_eq!(detect("wiki Romania", Language::Ro), Language::Ro);
        assert_eq!(detect("", Language::Ro), Language::Ro);
    }

    #[test]
    fn test_both_sets_matching_uses_default() {
        // "ce" is Romanian, "the" is English
        assert_eq!(detect("ce the", Language::Ro), Language::Ro);
        assert_eq!(detect("ce the", Language::En), Language::En);
    }
}
