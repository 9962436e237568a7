//! Shared engine state
//!
//! Thread-safe shared state coordinating the pipeline, the HTTP
//! handlers, and the SSE event stream.

use sayright_common::events::EngineEvent;
use sayright_common::{RunState, ScoreBreakdown};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Result of the most recent completed run
#[derive(Debug, Clone)]
pub struct LastScore {
    pub run_id: Uuid,
    pub word: String,
    pub breakdown: ScoreBreakdown,
    pub recognized: String,
    pub target: String,
    pub elapsed_ms: u64,
}

/// Shared state accessible by all components
///
/// Uses RwLock for concurrent read access with rare writes.
pub struct SharedState {
    /// Current pipeline state
    run_state: RwLock<RunState>,

    /// Most recent completed score (None until a run completes)
    last_score: RwLock<Option<LastScore>>,

    /// Event broadcaster for SSE events
    event_tx: broadcast::Sender<EngineEvent>,
}

impl SharedState {
    /// Create new shared state with default values
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(100); // Buffer up to 100 events
        Self {
            run_state: RwLock::new(RunState::Idle),
            last_score: RwLock::new(None),
            event_tx,
        }
    }

    /// Broadcast an event to all SSE listeners
    pub fn broadcast_event(&self, event: EngineEvent) {
        // Ignore send errors (no receivers is OK)
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to event stream for SSE
    pub fn subscribe_events(&self) -> broadcast::Receiver<EngineEvent> {
        self.event_tx.subscribe()
    }

    /// Get current run state
    pub async fn get_run_state(&self) -> RunState {
        *self.run_state.read().await
    }

    /// Set run state
    pub async fn set_run_state(&self, state: RunState) {
        *self.run_state.write().await = state;
    }

    /// Get the most recent score
    pub async fn get_last_score(&self) -> Option<LastScore> {
        self.last_score.read().await.clone()
    }

    /// Record a completed score
    pub async fn set_last_score(&self, score: LastScore) {
        *self.last_score.write().await = Some(score);
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
