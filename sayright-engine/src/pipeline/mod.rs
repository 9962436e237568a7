//! Scoring pipeline orchestration
//!
//! Sequences one scoring run through the state machine
//! `Idle → Capturing → Encoding → AwaitingRecognition → Scoring →
//! Completed`, with `Failed` reachable from every non-terminal state.
//!
//! At most one run is active per pipeline instance; concurrent run
//! requests are rejected with `AlreadyRunning`. The recognition wait
//! is a bounded poll loop (fixed interval, hard timeout) rather than
//! a push notification: per-run latency is dominated by microphone
//! duration, not poll granularity.

use crate::audio::{wav, AudioCapture};
use crate::error::{Error, Result};
use crate::phoneme::{scorer, Dictionary, PhonemeSequence};
use crate::recognizer::Recognizer;
use crate::state::{LastScore, SharedState};
use sayright_common::events::EngineEvent;
use sayright_common::{RunState, ScoreBreakdown, ScoreWeights};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Pipeline tuning knobs
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Hard budget for the recognition wait
    pub recognition_timeout: Duration,

    /// Poll interval while awaiting recognition
    pub poll_interval: Duration,

    /// Optional debug artifact: write the last encoded recording here
    pub save_last_recording: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            recognition_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(100),
            save_last_recording: None,
        }
    }
}

/// One scoring run request
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Target word to score against
    pub word: String,

    /// Similarity term weighting (must sum to 1.0)
    pub weights: ScoreWeights,

    /// Maximum capture duration; capture may be stopped earlier
    pub max_duration: Duration,
}

/// Final result of a completed run
#[derive(Debug, Clone, serde::Serialize)]
pub struct ScoreOutcome {
    pub run_id: Uuid,
    pub word: String,
    pub breakdown: ScoreBreakdown,
    /// Recognized phoneme string (space separated)
    pub recognized: String,
    /// Target phoneme string from the dictionary
    pub target: String,
    /// Wall-clock time for the whole run
    pub elapsed_ms: u64,
}

/// Scoring pipeline - orchestrates capture, encoding, recognition and
/// scoring for one run at a time.
pub struct ScoringPipeline {
    dictionary: Arc<Dictionary>,
    capture: Arc<dyn AudioCapture>,
    recognizer: Arc<dyn Recognizer>,
    state: Arc<SharedState>,
    config: PipelineConfig,

    /// At-most-one-active-run guard; held for the whole run and
    /// released on every exit path
    run_lock: Arc<tokio::sync::Mutex<()>>,

    /// Early capture-stop signal for the active run
    stop_tx: std::sync::Mutex<Option<mpsc::Sender<()>>>,

    /// Cancellation token of the active run
    cancel_token: std::sync::Mutex<Option<CancellationToken>>,
}

impl ScoringPipeline {
    pub fn new(
        dictionary: Arc<Dictionary>,
        capture: Arc<dyn AudioCapture>,
        recognizer: Arc<dyn Recognizer>,
        state: Arc<SharedState>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            dictionary,
            capture,
            recognizer,
            state,
            config,
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
            stop_tx: std::sync::Mutex::new(None),
            cancel_token: std::sync::Mutex::new(None),
        }
    }

    /// Execute one scoring run end to end.
    ///
    /// Suspends the caller until the run reaches `Completed` or
    /// `Failed`. Rejects concurrent requests with `AlreadyRunning`
    /// without disturbing the active run.
    pub async fn run_scoring(&self, request: RunRequest) -> Result<ScoreOutcome> {
        let guard = Arc::clone(&self.run_lock)
            .try_lock_owned()
            .map_err(|_| Error::AlreadyRunning)?;

        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (stop_tx, stop_rx) = mpsc::channel(1);

        self.set_stop_tx(Some(stop_tx));
        self.set_cancel_token(Some(cancel.clone()));

        let result = self.execute(run_id, request, &cancel, stop_rx).await;

        // Release per-run signal slots on every exit path
        self.set_stop_tx(None);
        self.set_cancel_token(None);
        drop(guard);

        result
    }

    /// End the capture phase of the active run early.
    ///
    /// The buffer is trimmed to the samples captured so far.
    pub async fn stop_capture(&self) -> Result<()> {
        if self.state.get_run_state().await != RunState::Capturing {
            return Err(Error::Internal("no capture in progress".to_string()));
        }
        let tx = self
            .stop_tx
            .lock()
            .map_err(|_| Error::Internal("pipeline state poisoned".to_string()))?
            .clone();
        match tx {
            Some(tx) => {
                // Full channel means a stop is already queued
                let _ = tx.try_send(());
                Ok(())
            }
            None => Err(Error::Internal("no capture in progress".to_string())),
        }
    }

    /// Cancel the active run.
    ///
    /// Cancellation at `Capturing` discards the partial buffer; at
    /// `AwaitingRecognition` the wait is abandoned and any late
    /// gateway completion is discarded with the handle.
    pub fn cancel(&self) -> Result<()> {
        let token = self
            .cancel_token
            .lock()
            .map_err(|_| Error::Internal("pipeline state poisoned".to_string()))?
            .clone();
        match token {
            Some(token) => {
                token.cancel();
                Ok(())
            }
            None => Err(Error::Internal("no active run".to_string())),
        }
    }

    async fn execute(
        &self,
        run_id: Uuid,
        request: RunRequest,
        cancel: &CancellationToken,
        mut stop_rx: mpsc::Receiver<()>,
    ) -> Result<ScoreOutcome> {
        let started = Instant::now();
        let word = request.word.trim().to_string();

        info!("Scoring run {} started for word '{}'", run_id, word);

        // Precondition checks before any capture resource is touched
        if word.is_empty() {
            return Err(self.fail(run_id, Error::UnknownWord("(empty)".to_string())).await);
        }
        if let Err(sum) = request.weights.validate() {
            return Err(self
                .fail(
                    run_id,
                    Error::InvalidWeights(format!("weights must sum to 1.0, got {:.4}", sum)),
                )
                .await);
        }

        // Capturing
        self.transition(run_id, RunState::Capturing).await;
        if let Err(e) = self.capture.start(request.max_duration) {
            return Err(self.fail(run_id, e).await);
        }
        self.state.broadcast_event(EngineEvent::CaptureStarted {
            run_id,
            max_duration_ms: request.max_duration.as_millis() as u64,
            timestamp: chrono::Utc::now(),
        });

        tokio::select! {
            _ = tokio::time::sleep(request.max_duration) => {
                debug!("Run {}: capture reached max duration", run_id);
            }
            _ = stop_rx.recv() => {
                debug!("Run {}: capture stopped early", run_id);
            }
            _ = cancel.cancelled() => {
                // Stop capture and discard the partial buffer
                let _ = self.capture.stop();
                return Err(self.fail(run_id, Error::Cancelled).await);
            }
        }

        let buffer = match self.capture.stop() {
            Ok(buffer) => buffer,
            Err(e) => return Err(self.fail(run_id, e).await),
        };
        self.state.broadcast_event(EngineEvent::CaptureStopped {
            run_id,
            sample_count: buffer.samples.len(),
            timestamp: chrono::Utc::now(),
        });

        if buffer.is_empty() {
            return Err(self
                .fail(run_id, Error::Encoding("no samples captured".to_string()))
                .await);
        }

        // Encoding
        self.transition(run_id, RunState::Encoding).await;
        let waveform = match wav::encode(&buffer) {
            Ok(bytes) => bytes,
            Err(e) => return Err(self.fail(run_id, e).await),
        };
        if let Some(path) = &self.config.save_last_recording {
            // Debug artifact only; never fails the run
            if let Err(e) = std::fs::write(path, &waveform) {
                warn!("Failed to save recording to {}: {}", path.display(), e);
            }
        }

        // Resolve the target word before dispatching recognition so a
        // dictionary miss never spends a gateway call
        let target = match self.dictionary.lookup(&word) {
            Some(sequence) => sequence.clone(),
            None => return Err(self.fail(run_id, Error::UnknownWord(word)).await),
        };

        // AwaitingRecognition
        self.transition(run_id, RunState::AwaitingRecognition).await;
        let handle = self.recognizer.begin(waveform, &word);
        let deadline = Instant::now() + self.config.recognition_timeout;

        let phonemes = loop {
            if let Some(result) = handle.poll() {
                match result {
                    Ok(phonemes) => break phonemes,
                    Err(reason) => {
                        return Err(self.fail(run_id, Error::RecognitionFailure(reason)).await)
                    }
                }
            }
            if Instant::now() >= deadline {
                return Err(self
                    .fail(
                        run_id,
                        Error::RecognitionTimeout {
                            budget_secs: self.config.recognition_timeout.as_secs(),
                        },
                    )
                    .await);
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                _ = cancel.cancelled() => {
                    // The in-flight request may still complete; its
                    // result dies with the abandoned handle
                    return Err(self.fail(run_id, Error::Cancelled).await);
                }
            }
        };

        let recognized = PhonemeSequence::parse(&phonemes).stripped();
        if recognized.is_empty() {
            return Err(self
                .fail(
                    run_id,
                    Error::RecognitionFailure("recognizer returned no phonemes".to_string()),
                )
                .await);
        }
        self.state.broadcast_event(EngineEvent::RecognitionCompleted {
            run_id,
            phonemes: recognized.to_string(),
            timestamp: chrono::Utc::now(),
        });

        // Scoring
        self.transition(run_id, RunState::Scoring).await;
        let breakdown = match scorer::score(&recognized, &target, &request.weights) {
            Ok(breakdown) => breakdown,
            Err(e) => return Err(self.fail(run_id, e).await),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        let outcome = ScoreOutcome {
            run_id,
            word: word.clone(),
            breakdown,
            recognized: recognized.to_string(),
            target: target.to_string(),
            elapsed_ms,
        };

        self.transition(run_id, RunState::Completed).await;
        self.state
            .set_last_score(LastScore {
                run_id,
                word: word.clone(),
                breakdown,
                recognized: outcome.recognized.clone(),
                target: outcome.target.clone(),
                elapsed_ms,
            })
            .await;
        self.state.broadcast_event(EngineEvent::ScoreReady {
            run_id,
            word,
            breakdown,
            recognized: outcome.recognized.clone(),
            target: outcome.target.clone(),
            elapsed_ms,
            timestamp: chrono::Utc::now(),
        });

        info!(
            "Scoring run {} completed: total {:.2} in {} ms",
            run_id, breakdown.total, elapsed_ms
        );
        Ok(outcome)
    }

    /// Record a state transition and broadcast it
    async fn transition(&self, run_id: Uuid, state: RunState) {
        debug!("Run {}: -> {}", run_id, state.as_str());
        self.state.set_run_state(state).await;
        self.state.broadcast_event(EngineEvent::RunStateChanged {
            run_id,
            state,
            timestamp: chrono::Utc::now(),
        });
    }

    /// Terminate the run with a failure: release the capture device
    /// if held, mark `Failed`, and report the structured reason.
    async fn fail(&self, run_id: Uuid, err: Error) -> Error {
        if self.capture.is_active() {
            let _ = self.capture.stop();
        }
        warn!("Scoring run {} failed: {}", run_id, err);
        self.transition(run_id, RunState::Failed).await;
        self.state.broadcast_event(EngineEvent::RunFailed {
            run_id,
            reason: err.to_string(),
            timestamp: chrono::Utc::now(),
        });
        err
    }

    fn set_stop_tx(&self, tx: Option<mpsc::Sender<()>>) {
        if let Ok(mut slot) = self.stop_tx.lock() {
            *slot = tx;
        }
    }

    fn set_cancel_token(&self, token: Option<CancellationToken>) {
        if let Ok(mut slot) = self.cancel_token.lock() {
            *slot = token;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::capture::FakeCapture;
    use crate::phoneme::dict::DictOptions;
    use crate::recognizer::{NeverRecognizer, StaticRecognizer};

    const DICT: &str = "\
CAT  K AE1 T
HELLO  HH AH0 L OW1
";

    fn test_pipeline(
        recognizer: Arc<dyn Recognizer>,
        config: PipelineConfig,
    ) -> (Arc<ScoringPipeline>, Arc<SharedState>) {
        let dictionary = Arc::new(Dictionary::parse(DICT, DictOptions::default()));
        let capture = Arc::new(FakeCapture::sine());
        let state = Arc::new(SharedState::new());
        let pipeline = Arc::new(ScoringPipeline::new(
            dictionary,
            capture,
            recognizer,
            Arc::clone(&state),
            config,
        ));
        (pipeline, state)
    }

    fn quick_config() -> PipelineConfig {
        PipelineConfig {
            recognition_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_millis(10),
            save_last_recording: None,
        }
    }

    fn request(word: &str) -> RunRequest {
        RunRequest {
            word: word.to_string(),
            weights: ScoreWeights::default(),
            max_duration: Duration::from_millis(20),
        }
    }

    #[tokio::test]
    async fn test_happy_path_exact_match() {
        let (pipeline, state) =
            test_pipeline(Arc::new(StaticRecognizer::new("K AE T")), quick_config());

        let outcome = pipeline.run_scoring(request("cat")).await.unwrap();
        assert_eq!(outcome.word, "cat");
        assert_eq!(outcome.recognized, "K AE T");
        assert_eq!(outcome.target, "K AE T");
        assert!((outcome.breakdown.total - 100.0).abs() < 0.01);

        assert_eq!(state.get_run_state().await, RunState::Completed);
        let last = state.get_last_score().await.unwrap();
        assert_eq!(last.run_id, outcome.run_id);
    }

    #[tokio::test]
    async fn test_unknown_word_fails_without_recognition() {
        // NeverRecognizer would hang the run if recognition were
        // dispatched; an unknown word must fail before that
        let (pipeline, state) = test_pipeline(Arc::new(NeverRecognizer), quick_config());

        let result = pipeline.run_scoring(request("dog")).await;
        assert!(matches!(result, Err(Error::UnknownWord(_))));
        assert_eq!(state.get_run_state().await, RunState::Failed);
    }

    #[tokio::test]
    async fn test_empty_word_rejected_before_capture() {
        let (pipeline, state) = test_pipeline(Arc::new(NeverRecognizer), quick_config());

        let result = pipeline.run_scoring(request("   ")).await;
        assert!(matches!(result, Err(Error::UnknownWord(_))));
        assert_eq!(state.get_run_state().await, RunState::Failed);
    }

    #[tokio::test]
    async fn test_invalid_weights_rejected_before_capture() {
        let (pipeline, _state) = test_pipeline(Arc::new(NeverRecognizer), quick_config());

        let mut req = request("cat");
        req.weights = ScoreWeights::new(0.9, 0.9, 0.9);
        let result = pipeline.run_scoring(req).await;
        assert!(matches!(result, Err(Error::InvalidWeights(_))));
    }

    #[tokio::test]
    async fn test_recognition_timeout() {
        let (pipeline, state) = test_pipeline(Arc::new(NeverRecognizer), quick_config());

        let result = pipeline.run_scoring(request("cat")).await;
        assert!(matches!(result, Err(Error::RecognitionTimeout { .. })));
        assert_eq!(state.get_run_state().await, RunState::Failed);
    }

    #[tokio::test]
    async fn test_recognition_failure_propagates() {
        let (pipeline, _state) = test_pipeline(
            Arc::new(StaticRecognizer::failing("model exploded")),
            quick_config(),
        );

        let result = pipeline.run_scoring(request("cat")).await;
        match result {
            Err(Error::RecognitionFailure(reason)) => assert!(reason.contains("model exploded")),
            other => panic!("expected RecognitionFailure, got {:?}", other.map(|o| o.word)),
        }
    }

    #[tokio::test]
    async fn test_empty_recognition_is_a_failure_not_a_zero_score() {
        let (pipeline, _state) =
            test_pipeline(Arc::new(StaticRecognizer::new("   ")), quick_config());

        let result = pipeline.run_scoring(request("cat")).await;
        assert!(matches!(result, Err(Error::RecognitionFailure(_))));
    }

    #[tokio::test]
    async fn test_concurrent_run_rejected_and_first_run_unharmed() {
        let (pipeline, _state) = test_pipeline(
            Arc::new(StaticRecognizer::with_delay(
                "K AE T",
                Duration::from_millis(150),
            )),
            quick_config(),
        );

        let first = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.run_scoring(request("cat")).await })
        };

        // Let the first run reach Capturing or later
        tokio::time::sleep(Duration::from_millis(10)).await;

        let second = pipeline.run_scoring(request("hello")).await;
        assert!(matches!(second, Err(Error::AlreadyRunning)));

        // The first run still completes normally
        let outcome = first.await.unwrap().unwrap();
        assert!((outcome.breakdown.total - 100.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_cancel_during_recognition_wait() {
        let (pipeline, state) = test_pipeline(Arc::new(NeverRecognizer), quick_config());

        let run = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move { pipeline.run_scoring(request("cat")).await })
        };

        // Wait until the run is past capture
        tokio::time::sleep(Duration::from_millis(60)).await;
        pipeline.cancel().unwrap();

        let result = run.await.unwrap();
        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(state.get_run_state().await, RunState::Failed);

        // The run slots are cleared: nothing left to cancel
        assert!(pipeline.cancel().is_err());
    }

    #[tokio::test]
    async fn test_stop_capture_ends_wait_early() {
        let (pipeline, _state) =
            test_pipeline(Arc::new(StaticRecognizer::new("K AE T")), quick_config());

        let run = {
            let pipeline = Arc::clone(&pipeline);
            tokio::spawn(async move {
                let mut req = request("cat");
                req.max_duration = Duration::from_secs(10);
                pipeline.run_scoring(req).await
            })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        pipeline.stop_capture().await.unwrap();

        // Far sooner than the 10 s max duration
        let outcome = tokio::time::timeout(Duration::from_secs(2), run)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert!((outcome.breakdown.total - 100.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_stop_capture_when_idle_is_an_error() {
        let (pipeline, _state) =
            test_pipeline(Arc::new(StaticRecognizer::new("K AE T")), quick_config());
        assert!(pipeline.stop_capture().await.is_err());
    }
}
