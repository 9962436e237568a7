//! # SayRight Scoring Engine (sayright-engine)
//!
//! Pronunciation scoring service: records an utterance, encodes it as
//! a canonical WAV stream, resolves the target word to phonemes via a
//! CMU-style dictionary, sends the audio to an external phoneme
//! recognizer, and scores the recognized phonemes against the target
//! with a weighted edit-distance breakdown.
//!
//! **Architecture:** capture → encode → recognize → score pipeline
//! orchestrated on tokio, controlled over an HTTP/SSE interface.

pub mod api;
pub mod audio;
pub mod config;
pub mod error;
pub mod phoneme;
pub mod pipeline;
pub mod recognizer;
pub mod state;

pub use error::{Error, Result};
pub use state::SharedState;
