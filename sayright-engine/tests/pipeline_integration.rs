//! End-to-end scoring pipeline tests
//!
//! Exercises the full capture → encode → recognize → score sequence
//! through the public API with a fake microphone and canned
//! recognizer responses.

use sayright_engine::audio::capture::FakeCapture;
use sayright_engine::error::Error;
use sayright_engine::phoneme::dict::{DictOptions, Dictionary};
use sayright_engine::pipeline::{PipelineConfig, RunRequest, ScoringPipeline};
use sayright_engine::recognizer::{NeverRecognizer, Recognizer, StaticRecognizer};
use sayright_engine::SharedState;
use sayright_common::{RunState, ScoreWeights};
use std::sync::Arc;
use std::time::Duration;

const DICT: &str = "\
CAT  K AE1 T
HELLO  HH AH0 L OW1
";

fn build_pipeline(recognizer: Arc<dyn Recognizer>) -> (Arc<ScoringPipeline>, Arc<SharedState>) {
    let dictionary = Arc::new(Dictionary::parse(DICT, DictOptions::default()));
    let state = Arc::new(SharedState::new());
    let pipeline = Arc::new(ScoringPipeline::new(
        dictionary,
        Arc::new(FakeCapture::sine()),
        recognizer,
        Arc::clone(&state),
        PipelineConfig {
            recognition_timeout: Duration::from_millis(400),
            poll_interval: Duration::from_millis(10),
            save_last_recording: None,
        },
    ));
    (pipeline, state)
}

fn request(word: &str) -> RunRequest {
    RunRequest {
        word: word.to_string(),
        weights: ScoreWeights::default(),
        max_duration: Duration::from_millis(20),
    }
}

#[tokio::test]
async fn exact_match_scores_100() {
    let (pipeline, state) = build_pipeline(Arc::new(StaticRecognizer::new("K AE T")));

    let outcome = pipeline.run_scoring(request("cat")).await.unwrap();
    assert!((outcome.breakdown.total - 100.0).abs() < 0.01);
    assert!((outcome.breakdown.edit - 70.0).abs() < 0.01);
    assert!((outcome.breakdown.vowel - 15.0).abs() < 0.01);
    assert!((outcome.breakdown.length - 15.0).abs() < 0.01);
    assert_eq!(state.get_run_state().await, RunState::Completed);
}

#[tokio::test]
async fn vowel_substitution_scores_per_breakdown() {
    let (pipeline, _) = build_pipeline(Arc::new(StaticRecognizer::new("K AH T")));

    let outcome = pipeline.run_scoring(request("cat")).await.unwrap();
    // edit similarity 1 - 1/3, vowel similarity 0, lengths equal
    assert!((outcome.breakdown.edit - 46.67).abs() < 0.01);
    assert!((outcome.breakdown.vowel - 0.0).abs() < 0.01);
    assert!((outcome.breakdown.length - 15.0).abs() < 0.01);
    assert!((outcome.breakdown.total - 61.67).abs() < 0.01);
}

#[tokio::test]
async fn second_request_rejected_while_first_active() {
    let (pipeline, _) = build_pipeline(Arc::new(StaticRecognizer::with_delay(
        "K AE T",
        Duration::from_millis(100),
    )));

    let first = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.run_scoring(request("cat")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    // Second request fails fast; the first run is untouched
    let second = pipeline.run_scoring(request("hello")).await;
    assert!(matches!(second, Err(Error::AlreadyRunning)));

    let outcome = first.await.unwrap().unwrap();
    assert_eq!(outcome.word, "cat");
    assert!((outcome.breakdown.total - 100.0).abs() < 0.01);
}

#[tokio::test]
async fn sequential_runs_reuse_the_pipeline() {
    let (pipeline, _) = build_pipeline(Arc::new(StaticRecognizer::new("HH AH L OW")));

    let first = pipeline.run_scoring(request("hello")).await.unwrap();
    assert!((first.breakdown.total - 100.0).abs() < 0.01);

    // The run guard is released after completion
    let second = pipeline.run_scoring(request("hello")).await.unwrap();
    assert!((second.breakdown.total - 100.0).abs() < 0.01);
    assert_ne!(first.run_id, second.run_id);
}

#[tokio::test]
async fn timeout_reported_when_recognizer_stalls() {
    let (pipeline, state) = build_pipeline(Arc::new(NeverRecognizer));

    let result = pipeline.run_scoring(request("cat")).await;
    assert!(matches!(result, Err(Error::RecognitionTimeout { .. })));
    assert_eq!(state.get_run_state().await, RunState::Failed);

    // A failed run releases the pipeline for the next one
    assert!(matches!(
        pipeline.run_scoring(request("cat")).await,
        Err(Error::RecognitionTimeout { .. })
    ));
}

#[tokio::test]
async fn unknown_word_short_circuits() {
    let (pipeline, state) = build_pipeline(Arc::new(NeverRecognizer));

    let result = pipeline.run_scoring(request("xylophone")).await;
    match result {
        Err(Error::UnknownWord(word)) => assert_eq!(word, "xylophone"),
        other => panic!("expected UnknownWord, got {:?}", other.err()),
    }
    assert_eq!(state.get_run_state().await, RunState::Failed);
}

#[tokio::test]
async fn cancel_during_capture_discards_buffer_and_releases_device() {
    let (pipeline, state) = build_pipeline(Arc::new(StaticRecognizer::new("K AE T")));

    let run = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move {
            let mut req = request("cat");
            req.max_duration = Duration::from_secs(10);
            pipeline.run_scoring(req).await
        })
    };

    // Cancel while the run is still in its capture window
    tokio::time::sleep(Duration::from_millis(30)).await;
    pipeline.cancel().unwrap();

    let result = run.await.unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(state.get_run_state().await, RunState::Failed);
    assert!(state.get_last_score().await.is_none());

    // The capture device was released: a follow-up run succeeds
    let outcome = pipeline.run_scoring(request("cat")).await.unwrap();
    assert!((outcome.breakdown.total - 100.0).abs() < 0.01);
}

#[tokio::test]
async fn events_trace_the_run() {
    let (pipeline, state) = build_pipeline(Arc::new(StaticRecognizer::new("K AE T")));
    let mut rx = state.subscribe_events();

    pipeline.run_scoring(request("cat")).await.unwrap();

    let mut types = Vec::new();
    while let Ok(event) = rx.try_recv() {
        types.push(event.event_type());
    }

    assert!(types.contains(&"CaptureStarted"));
    assert!(types.contains(&"CaptureStopped"));
    assert!(types.contains(&"RecognitionCompleted"));
    assert!(types.contains(&"ScoreReady"));
    assert!(!types.contains(&"RunFailed"));
}
