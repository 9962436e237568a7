//! HTTP request handlers
//!
//! Implements the scoring control endpoints. Pipeline failures map to
//! structured JSON error responses; none of them crash the service.

use crate::api::AppState;
use crate::error::Error;
use crate::pipeline::{RunRequest, ScoreOutcome};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sayright_common::{RunState, ScoreWeights};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::info;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RunScoringRequest {
    /// Target word to score against
    pub word: String,

    /// Similarity weights; defaults to 0.7 / 0.15 / 0.15
    #[serde(default)]
    pub weights: ScoreWeights,

    /// Maximum capture duration in seconds (config default if absent)
    pub max_duration_secs: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub state: RunState,
    pub last_score: Option<LastScoreInfo>,
}

#[derive(Debug, Serialize)]
pub struct LastScoreInfo {
    pub run_id: uuid::Uuid,
    pub word: String,
    pub total: f64,
    pub edit: f64,
    pub vowel: f64,
    pub length: f64,
    pub recognized: String,
    pub target: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub word: String,
    /// Canonical (first-seen) pronunciation
    pub phonemes: String,
    /// Every known pronunciation variant
    pub variants: Vec<String>,
}

/// Upper bound on a single capture request, in seconds.
///
/// Also guards `Duration::from_secs_f64`, which panics on values too
/// large to represent.
const MAX_CAPTURE_SECS: f64 = 600.0;

/// Map a pipeline error to an HTTP status code
fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::AlreadyRunning => StatusCode::CONFLICT,
        Error::UnknownWord(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::InvalidWeights(_) => StatusCode::BAD_REQUEST,
        Error::NoCaptureDevice(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::RecognitionTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        Error::RecognitionFailure(_) => StatusCode::BAD_GATEWAY,
        Error::Cancelled => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: Error) -> (StatusCode, Json<ErrorResponse>) {
    (
        status_for(&error),
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

// ============================================================================
// Scoring Endpoints
// ============================================================================

/// POST /api/v1/scoring/run - execute one scoring run
///
/// Suspends until the run reaches Completed or Failed; the response
/// carries the full score breakdown or the failure reason.
pub async fn run_scoring(
    State(app): State<AppState>,
    Json(request): Json<RunScoringRequest>,
) -> Result<Json<ScoreOutcome>, (StatusCode, Json<ErrorResponse>)> {
    let requested_secs = request
        .max_duration_secs
        .unwrap_or(app.default_max_duration_secs);
    if !requested_secs.is_finite() || requested_secs < 0.0 || requested_secs > MAX_CAPTURE_SECS {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!(
                    "max_duration_secs must be between 0 and {} seconds",
                    MAX_CAPTURE_SECS
                ),
            }),
        ));
    }
    let max_duration = Duration::from_secs_f64(requested_secs);

    info!(
        "Run request: word '{}', max duration {:.1} s",
        request.word,
        max_duration.as_secs_f32()
    );

    let outcome = app
        .pipeline
        .run_scoring(RunRequest {
            word: request.word,
            weights: request.weights,
            max_duration,
        })
        .await
        .map_err(error_response)?;

    Ok(Json(outcome))
}

/// POST /api/v1/scoring/stop - end the capture phase early
pub async fn stop_capture(
    State(app): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    app.pipeline.stop_capture().await.map_err(error_response)?;
    Ok(Json(StatusResponse {
        status: "capture stopping".to_string(),
    }))
}

/// POST /api/v1/scoring/cancel - cancel the active run
pub async fn cancel_run(
    State(app): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    app.pipeline.cancel().map_err(error_response)?;
    Ok(Json(StatusResponse {
        status: "cancelling".to_string(),
    }))
}

/// GET /api/v1/scoring/state - current pipeline state and last score
pub async fn get_state(State(app): State<AppState>) -> Json<StateResponse> {
    let state = app.state.get_run_state().await;
    let last_score = app.state.get_last_score().await.map(|score| LastScoreInfo {
        run_id: score.run_id,
        word: score.word,
        total: score.breakdown.total,
        edit: score.breakdown.edit,
        vowel: score.breakdown.vowel,
        length: score.breakdown.length,
        recognized: score.recognized,
        target: score.target,
        elapsed_ms: score.elapsed_ms,
    });

    Json(StateResponse { state, last_score })
}

// ============================================================================
// Dictionary Endpoint
// ============================================================================

/// GET /api/v1/dictionary/{word} - pronunciation lookup
pub async fn lookup_word(
    State(app): State<AppState>,
    Path(word): Path<String>,
) -> Result<Json<LookupResponse>, (StatusCode, Json<ErrorResponse>)> {
    match app.dictionary.lookup_all(&word) {
        Some(variants) => {
            let rendered: Vec<String> = variants.iter().map(|v| v.to_string()).collect();
            Ok(Json(LookupResponse {
                word,
                phonemes: rendered.first().cloned().unwrap_or_default(),
                variants: rendered,
            }))
        }
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("word not found in dictionary: {}", word),
            }),
        )),
    }
}
