//! Recognition gateway
//!
//! Boundary to the external phoneme recognizer. The engine never
//! looks inside the model: it hands over an encoded waveform plus the
//! target word and eventually receives a raw phoneme string (or a
//! failure) through a single-consumption result slot. At most one
//! request is dispatched per scoring run; the pipeline polls the slot
//! under its own timeout budget.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Outcome written into the result slot by the gateway
pub type RecognitionResult = std::result::Result<String, String>;

/// Single-consumption result slot for one recognition request.
///
/// The gateway's background task fills the slot exactly once; the
/// pipeline polls it and takes the result. Abandoning the handle
/// discards any late completion.
#[derive(Clone)]
pub struct RecognitionHandle {
    slot: Arc<Mutex<Option<RecognitionResult>>>,
}

impl RecognitionHandle {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Fill the slot. Later completions are ignored.
    pub fn complete(&self, result: RecognitionResult) {
        if let Ok(mut slot) = self.slot.lock() {
            if slot.is_none() {
                *slot = Some(result);
            }
        }
    }

    /// Take the result if the request has completed (consume-once).
    pub fn poll(&self) -> Option<RecognitionResult> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl Default for RecognitionHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque recognizer boundary.
///
/// `begin` is non-blocking: it dispatches the request and returns a
/// handle the caller polls for completion.
pub trait Recognizer: Send + Sync {
    fn begin(&self, waveform: Vec<u8>, word: &str) -> RecognitionHandle;
}

/// Shape of the inference service's JSON response
#[derive(Debug, serde::Deserialize)]
struct RecognizeResponse {
    phonemes: String,
}

/// HTTP-backed recognizer posting WAV bytes to an inference endpoint.
///
/// The request body is the raw waveform (`audio/wav`); the target
/// word travels as a query parameter for the service's logging. The
/// response is `{ "phonemes": "K AE T" }`.
pub struct HttpRecognizer {
    client: reqwest::Client,
    url: String,
}

impl HttpRecognizer {
    /// Create a recognizer for the given endpoint URL.
    ///
    /// `request_timeout` should sit above the pipeline's recognition
    /// budget so the pipeline's poll deadline governs.
    pub fn new(url: String, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_default();
        Self { client, url }
    }
}

impl Recognizer for HttpRecognizer {
    fn begin(&self, waveform: Vec<u8>, word: &str) -> RecognitionHandle {
        let handle = RecognitionHandle::new();
        let slot = handle.clone();
        let client = self.client.clone();
        let url = self.url.clone();
        let word = word.to_string();

        debug!(
            "Dispatching recognition request: {} bytes for '{}'",
            waveform.len(),
            word
        );

        tokio::spawn(async move {
            let result = client
                .post(&url)
                .query(&[("word", word.as_str())])
                .header(reqwest::header::CONTENT_TYPE, "audio/wav")
                .body(waveform)
                .send()
                .await;

            let outcome = match result {
                Ok(response) if response.status().is_success() => {
                    match response.json::<RecognizeResponse>().await {
                        Ok(body) => Ok(body.phonemes),
                        Err(e) => Err(format!("malformed recognizer response: {}", e)),
                    }
                }
                Ok(response) => Err(format!("recognizer returned HTTP {}", response.status())),
                Err(e) => Err(format!("recognizer request failed: {}", e)),
            };

            if let Err(reason) = &outcome {
                warn!("Recognition for '{}' failed: {}", word, reason);
            }
            slot.complete(outcome);
        });

        handle
    }
}

/// Test double resolving after a fixed delay with a canned result.
pub struct StaticRecognizer {
    result: RecognitionResult,
    delay: Duration,
}

impl StaticRecognizer {
    pub fn new(phonemes: &str) -> Self {
        Self {
            result: Ok(phonemes.to_string()),
            delay: Duration::from_millis(0),
        }
    }

    pub fn with_delay(phonemes: &str, delay: Duration) -> Self {
        Self {
            result: Ok(phonemes.to_string()),
            delay,
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            delay: Duration::from_millis(0),
        }
    }
}

impl Recognizer for StaticRecognizer {
    fn begin(&self, _waveform: Vec<u8>, _word: &str) -> RecognitionHandle {
        let handle = RecognitionHandle::new();
        let slot = handle.clone();
        let result = self.result.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            slot.complete(result);
        });

        handle
    }
}

/// Test double that never completes; used for timeout coverage.
pub struct NeverRecognizer;

impl Recognizer for NeverRecognizer {
    fn begin(&self, _waveform: Vec<u8>, _word: &str) -> RecognitionHandle {
        RecognitionHandle::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_consume_once() {
        let handle = RecognitionHandle::new();
        assert!(handle.poll().is_none());

        handle.complete(Ok("K AE T".to_string()));
        assert_eq!(handle.poll(), Some(Ok("K AE T".to_string())));
        // Second poll finds the slot empty
        assert!(handle.poll().is_none());
    }

    #[test]
    fn test_handle_ignores_late_completion() {
        let handle = RecognitionHandle::new();
        handle.complete(Ok("first".to_string()));
        handle.complete(Ok("second".to_string()));
        assert_eq!(handle.poll(), Some(Ok("first".to_string())));
    }

    #[tokio::test]
    async fn test_static_recognizer_completes() {
        let recognizer = StaticRecognizer::new("K AE T");
        let handle = recognizer.begin(vec![0u8; 44], "cat");

        // Give the spawned task a moment to fill the slot
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(handle.poll(), Some(Ok("K AE T".to_string())));
    }

    #[tokio::test]
    async fn test_never_recognizer_never_completes() {
        let recognizer = NeverRecognizer;
        let handle = recognizer.begin(vec![0u8; 44], "cat");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(handle.poll().is_none());
    }
}
