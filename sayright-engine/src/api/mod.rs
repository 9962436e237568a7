//! REST API for the scoring engine
//!
//! Control surface consumed by the external UI layer: start/stop/
//! cancel scoring runs, inspect pipeline state, look up dictionary
//! pronunciations, and stream engine events over SSE.

pub mod handlers;
pub mod sse;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;

use crate::phoneme::Dictionary;
use crate::pipeline::ScoringPipeline;
use crate::state::SharedState;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Scoring pipeline
    pub pipeline: Arc<ScoringPipeline>,
    /// Shared engine state
    pub state: Arc<SharedState>,
    /// Pronunciation dictionary
    pub dictionary: Arc<Dictionary>,
    /// Default maximum capture duration in seconds
    pub default_max_duration_secs: f64,
    /// Server port
    pub port: u16,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no prefix for health endpoint)
        .route("/health", get(health_check))
        // API v1 routes
        .nest(
            "/api/v1",
            Router::new()
                // Scoring pipeline endpoints
                .route("/scoring/run", post(handlers::run_scoring))
                .route("/scoring/stop", post(handlers::stop_capture))
                .route("/scoring/cancel", post(handlers::cancel_run))
                .route("/scoring/state", get(handlers::get_state))
                // Dictionary lookup
                .route("/dictionary/:word", get(handlers::lookup_word))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "module": "sayright-engine",
        "version": env!("CARGO_PKG_VERSION"),
        "port": state.port,
        "dictionary_entries": state.dictionary.len(),
    }))
}
