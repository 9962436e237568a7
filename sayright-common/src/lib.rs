//! # SayRight Common Library
//!
//! Shared code for the SayRight pronunciation scoring services:
//! - Score types (ScoreWeights, ScoreBreakdown, RunState)
//! - Event types (EngineEvent enum)
//! - Common error types
//! - Configuration file resolution

pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use types::{RunState, ScoreBreakdown, ScoreWeights};
