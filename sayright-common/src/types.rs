//! Core score types shared between the engine and its API surface.
//!
//! A scoring run produces a `ScoreBreakdown` from a caller-supplied
//! `ScoreWeights` triple; `RunState` tracks the pipeline state machine.

use serde::{Deserialize, Serialize};

/// Tolerance for the "weights sum to 1.0" check.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

/// Caller-supplied weighting of the three similarity terms.
///
/// The scorer does not normalize: the three weights must sum to 1.0
/// (within [`WEIGHT_SUM_TOLERANCE`]) or scoring is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the phoneme edit-distance term
    pub edit: f64,

    /// Weight of the vowel-subsequence term
    pub vowel: f64,

    /// Weight of the length-difference term
    pub length: f64,
}

impl ScoreWeights {
    pub fn new(edit: f64, vowel: f64, length: f64) -> Self {
        Self { edit, vowel, length }
    }

    /// Check that the weights sum to 1.0 within tolerance.
    ///
    /// Returns the offending sum on failure so callers can report it.
    pub fn validate(&self) -> std::result::Result<(), f64> {
        let sum = self.edit + self.vowel + self.length;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            Err(sum)
        } else {
            Ok(())
        }
    }
}

impl Default for ScoreWeights {
    /// Default weighting used by the reference front-end: 0.7 / 0.15 / 0.15
    fn default() -> Self {
        Self {
            edit: 0.7,
            vowel: 0.15,
            length: 0.15,
        }
    }
}

/// Weighted similarity score breakdown.
///
/// All components are already weight-scaled; `total` is their sum and
/// lies in [0, 100] whenever the weights sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Edit-distance component (weight-scaled, 0..=100*edit_weight)
    pub edit: f64,

    /// Vowel-subsequence component
    pub vowel: f64,

    /// Length-difference component
    pub length: f64,

    /// Sum of the three components, in [0, 100]
    pub total: f64,
}

/// Scoring pipeline state machine states.
///
/// `Failed` is reachable from every non-terminal state; `Completed`
/// and `Failed` are terminal for a given run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Capturing,
    Encoding,
    AwaitingRecognition,
    Scoring,
    Completed,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Capturing => "capturing",
            RunState::Encoding => "encoding",
            RunState::AwaitingRecognition => "awaiting_recognition",
            RunState::Scoring => "scoring",
            RunState::Completed => "completed",
            RunState::Failed => "failed",
        }
    }

    /// True once a run has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Idle | RunState::Completed | RunState::Failed)
    }
}
