//! Phoneme subsystem: sequences, pronunciation dictionary, similarity scoring

pub mod dict;
pub mod scorer;
pub mod types;

pub use dict::Dictionary;
pub use types::PhonemeSequence;
