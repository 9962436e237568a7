//! Event types for the SayRight event system
//!
//! Every scoring run broadcasts its progress as `EngineEvent`s; the
//! HTTP layer re-exports them over SSE for the external UI.

use crate::types::{RunState, ScoreBreakdown};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// SayRight engine event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// Pipeline state machine transition
    RunStateChanged {
        run_id: Uuid,
        state: RunState,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio capture started for a run
    CaptureStarted {
        run_id: Uuid,
        max_duration_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Audio capture stopped; the buffer is trimmed to the actual
    /// captured sample count, never padded
    CaptureStopped {
        run_id: Uuid,
        sample_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recognition gateway returned a phoneme string
    RecognitionCompleted {
        run_id: Uuid,
        phonemes: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Scoring finished; final result for the run
    ScoreReady {
        run_id: Uuid,
        word: String,
        breakdown: ScoreBreakdown,
        recognized: String,
        target: String,
        elapsed_ms: u64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Run terminated with a failure reason
    RunFailed {
        run_id: Uuid,
        reason: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl EngineEvent {
    /// Event type string, used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            EngineEvent::RunStateChanged { .. } => "RunStateChanged",
            EngineEvent::CaptureStarted { .. } => "CaptureStarted",
            EngineEvent::CaptureStopped { .. } => "CaptureStopped",
            EngineEvent::RecognitionCompleted { .. } => "RecognitionCompleted",
            EngineEvent::ScoreReady { .. } => "ScoreReady",
            EngineEvent::RunFailed { .. } => "RunFailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_tags_type() {
        let event = EngineEvent::RunStateChanged {
            run_id: Uuid::new_v4(),
            state: RunState::Capturing,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RunStateChanged");
        assert_eq!(json["state"], "capturing");
    }

    #[test]
    fn test_event_type_matches_variant() {
        let event = EngineEvent::RunFailed {
            run_id: Uuid::new_v4(),
            reason: "recognition timed out".to_string(),
            timestamp: chrono::Utc::now(),
        };
        assert_eq!(event.event_type(), "RunFailed");
    }
}
