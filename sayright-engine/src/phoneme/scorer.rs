//! Phonetic similarity scoring
//!
//! Compares a recognized phoneme sequence against the target
//! pronunciation and produces a weighted 0–100 breakdown of three
//! terms:
//!
//! 1. token-level edit distance over the full sequences
//! 2. edit distance restricted to the vowel subsequences
//! 3. sequence-length difference
//!
//! All normalization denominators use `max(len(target), 1)`, so an
//! empty recognized sequence scores 0 rather than dividing by zero.

use crate::error::{Error, Result};
use crate::phoneme::PhonemeSequence;
use sayright_common::{ScoreBreakdown, ScoreWeights};

/// Score `recognized` against `target` with the supplied weights.
///
/// The weights must sum to 1.0 within tolerance; the scorer does not
/// normalize on the caller's behalf.
///
/// # Errors
/// `InvalidWeights` if the weight triple does not sum to 1.0.
pub fn score(
    recognized: &PhonemeSequence,
    target: &PhonemeSequence,
    weights: &ScoreWeights,
) -> Result<ScoreBreakdown> {
    if let Err(sum) = weights.validate() {
        return Err(Error::InvalidWeights(format!(
            "weights must sum to 1.0, got {:.4}",
            sum
        )));
    }

    let edit_sim = sequence_similarity(recognized, target);
    let vowel_sim = sequence_similarity(&recognized.vowels(), &target.vowels());
    let length_sim = length_similarity(recognized.len(), target.len());

    let edit = edit_sim * weights.edit * 100.0;
    let vowel = vowel_sim * weights.vowel * 100.0;
    let length = length_sim * weights.length * 100.0;

    Ok(ScoreBreakdown {
        edit,
        vowel,
        length,
        total: edit + vowel + length,
    })
}

/// Normalized edit similarity between two token sequences.
///
/// `1 - distance / max(len(target), 1)`, clamped to [0, 1]. Each
/// phoneme symbol is an atomic token; insert, delete, and substitute
/// all cost 1.
fn sequence_similarity(recognized: &PhonemeSequence, target: &PhonemeSequence) -> f64 {
    let recognized_tokens: Vec<&String> = recognized.tokens().iter().collect();
    let target_tokens: Vec<&String> = target.tokens().iter().collect();
    let distance = strsim::generic_levenshtein(&recognized_tokens, &target_tokens);
    let denominator = target.len().max(1) as f64;
    (1.0 - distance as f64 / denominator).clamp(0.0, 1.0)
}

/// Normalized length similarity: `1 - |len_r - len_t| / max(len_t, 1)`
fn length_similarity(recognized_len: usize, target_len: usize) -> f64 {
    let diff = recognized_len.abs_diff(target_len) as f64;
    let denominator = target_len.max(1) as f64;
    (1.0 - diff / denominator).clamp(0.0, 1.0)
}
