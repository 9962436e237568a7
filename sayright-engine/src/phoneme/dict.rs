//! CMU-format pronunciation dictionary
//!
//! Loads a word → phoneme-sequence table from line-oriented text:
//!
//! ```text
//! ;;; comment
//! CAT  K AE1 T
//! TOMATO  T AH0 M EY1 T OW2
//! TOMATO(1)  T AH0 M AA1 T OW2
//! ```
//!
//! A parenthesized suffix marks an alternate pronunciation of the
//! same base word. `lookup` returns the first-seen variant (the
//! canonical pronunciation); `lookup_all` exposes every variant.
//! The table is built once at startup and shared read-only.

use crate::error::{Error, Result};
use crate::phoneme::PhonemeSequence;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Comment marker used by the CMU dictionary distribution
const COMMENT_MARKER: &str = ";;;";

/// Dictionary loading options
#[derive(Debug, Clone, Copy)]
pub struct DictOptions {
    /// Keep numeric stress markers on vowel phonemes.
    ///
    /// Off by default: recognizers emit stress-free phonemes, so
    /// stripped entries compare cleanly.
    pub stress_sensitive: bool,
}

impl Default for DictOptions {
    fn default() -> Self {
        Self {
            stress_sensitive: false,
        }
    }
}

/// Read-only word → pronunciations mapping
pub struct Dictionary {
    entries: HashMap<String, Vec<PhonemeSequence>>,
}

impl Dictionary {
    /// Load a dictionary from a file.
    pub fn load<P: AsRef<Path>>(path: P, options: DictOptions) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Dictionary(format!("failed to read {}: {}", path.display(), e))
        })?;
        let dict = Self::parse(&text, options);
        if dict.is_empty() {
            return Err(Error::Dictionary(format!(
                "no entries parsed from {}",
                path.display()
            )));
        }
        debug!("Loaded {} dictionary entries from {}", dict.len(), path.display());
        Ok(dict)
    }

    /// Parse dictionary text.
    ///
    /// Malformed lines (no phonemes after the word) are skipped with
    /// a warning rather than failing the whole load.
    pub fn parse(text: &str, options: DictOptions) -> Self {
        let mut entries: HashMap<String, Vec<PhonemeSequence>> = HashMap::new();

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }

            let mut parts = line.split_whitespace();
            let word = match parts.next() {
                Some(w) => w,
                None => continue,
            };

            let phonemes: Vec<String> = parts.map(|t| t.to_ascii_uppercase()).collect();
            if phonemes.is_empty() {
                warn!("Skipping dictionary line {} (no phonemes): {}", line_no + 1, line);
                continue;
            }

            let key = normalize_word(word);
            if key.is_empty() {
                warn!("Skipping dictionary line {} (empty word): {}", line_no + 1, line);
                continue;
            }

            let mut sequence = PhonemeSequence::from_tokens(phonemes);
            if !options.stress_sensitive {
                sequence = sequence.stripped();
            }

            entries.entry(key).or_default().push(sequence);
        }

        Self { entries }
    }

    /// Look up the canonical pronunciation of a word.
    ///
    /// Case-insensitive. When the dictionary carries multiple
    /// variants, the first-seen one is returned (documented
    /// collapse-to-first behavior); see [`Dictionary::lookup_all`].
    pub fn lookup(&self, word: &str) -> Option<&PhonemeSequence> {
        self.entries
            .get(&normalize_word(word))
            .and_then(|variants| variants.first())
    }

    /// All pronunciation variants of a word, in first-seen order.
    pub fn lookup_all(&self, word: &str) -> Option<&[PhonemeSequence]> {
        self.entries
            .get(&normalize_word(word))
            .map(|variants| variants.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalize a dictionary headword: uppercase, variant suffix removed.
///
/// `Tomato(1)` and `tomato` both map to `TOMATO`.
fn normalize_word(word: &str) -> String {
    let base = match word.find('(') {
        Some(idx) => &word[..idx],
        None => word,
    };
    base.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
;;; cmudict sample
CAT  K AE1 T
HELLO  HH AH0 L OW1
TOMATO  T AH0 M EY1 T OW2
TOMATO(1)  T AH0 M AA1 T OW2

BADLINE
";

    #[test]
    fn test_parse_skips_comments_blanks_and_malformed() {
        let dict = Dictionary::parse(SAMPLE, DictOptions::default());
        assert_eq!(dict.len(), 3);
        assert!(dict.lookup("BADLINE").is_none());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let dict = Dictionary::parse(SAMPLE, DictOptions::default());
        let lower = dict.lookup("cat").unwrap();
        let mixed = dict.lookup("Cat").unwrap();
        let upper = dict.lookup("CAT").unwrap();
        assert_eq!(lower, mixed);
        assert_eq!(mixed, upper);
        assert_eq!(lower.to_string(), "K AE T");
    }

    #[test]
    fn test_stress_stripped_by_default() {
        let dict = Dictionary::parse(SAMPLE, DictOptions::default());
        assert_eq!(dict.lookup("hello").unwrap().to_string(), "HH AH L OW");
    }

    #[test]
    fn test_stress_sensitive_option() {
        let dict = Dictionary::parse(
            SAMPLE,
            DictOptions {
                stress_sensitive: true,
            },
        );
        assert_eq!(dict.lookup("hello").unwrap().to_string(), "HH AH0 L OW1");
    }

    #[test]
    fn test_variant_collapses_to_first_seen() {
        let dict = Dictionary::parse(SAMPLE, DictOptions::default());
        // lookup returns the canonical (first) pronunciation
        assert_eq!(dict.lookup("tomato").unwrap().to_string(), "T AH M EY T OW");
        // lookup_all exposes both variants
        let all = dict.lookup_all("tomato").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].to_string(), "T AH M AA T OW");
    }

    #[test]
    fn test_unknown_word() {
        let dict = Dictionary::parse(SAMPLE, DictOptions::default());
        assert!(dict.lookup("dog").is_none());
        assert!(dict.lookup_all("dog").is_none());
    }

    #[test]
    fn test_load_missing_file_is_dictionary_error() {
        let result = Dictionary::load("/nonexistent/cmudict.txt", DictOptions::default());
        assert!(matches!(result, Err(Error::Dictionary(_))));
    }

    #[test]
    fn test_load_from_file() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();

        let dict = Dictionary::load(file.path(), DictOptions::default()).unwrap();
        assert_eq!(dict.len(), 3);
        assert!(dict.lookup("cat").is_some());
    }
}
