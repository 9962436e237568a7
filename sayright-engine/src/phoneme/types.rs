//! Phoneme sequences and phonetic classification
//!
//! Phonemes are ARPABET symbols as used by the CMU pronouncing
//! dictionary. Vowel symbols may carry a trailing stress digit
//! (`AH0`, `EY1`) which is ignored for classification and usually
//! stripped during normalization.

use std::fmt;

/// ARPABET vowel symbols (stress digits stripped)
const VOWELS: &[&str] = &[
    "AA", "AE", "AH", "AO", "AW", "AY", "EH", "ER", "EY", "IH", "IY", "OW", "OY", "UH", "UW",
];

/// Strip a trailing numeric stress marker from a phoneme symbol.
///
/// `"AH0"` → `"AH"`; symbols without a digit are returned unchanged.
pub fn strip_stress(symbol: &str) -> &str {
    symbol.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// Whether a phoneme symbol is a vowel (stress-insensitive)
pub fn is_vowel(symbol: &str) -> bool {
    VOWELS.contains(&strip_stress(symbol))
}

/// Ordered sequence of phoneme symbols.
///
/// Immutable once produced; a sequence parsed from non-empty input is
/// never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhonemeSequence(Vec<String>);

impl PhonemeSequence {
    /// Parse a whitespace-separated phoneme string.
    ///
    /// Returns an empty sequence for blank input; callers treat an
    /// empty sequence as a reportable failure, not a valid value.
    pub fn parse(text: &str) -> Self {
        Self(
            text.split_whitespace()
                .map(|t| t.to_ascii_uppercase())
                .collect(),
        )
    }

    pub fn from_tokens(tokens: Vec<String>) -> Self {
        Self(tokens)
    }

    /// A copy of this sequence with stress digits removed
    pub fn stripped(&self) -> Self {
        Self(self.0.iter().map(|p| strip_stress(p).to_string()).collect())
    }

    /// The vowel-only subsequence (order preserved)
    pub fn vowels(&self) -> Self {
        Self(self.0.iter().filter(|p| is_vowel(p)).cloned().collect())
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PhonemeSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}
