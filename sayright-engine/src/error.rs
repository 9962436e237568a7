//! Error types for sayright-engine
//!
//! Defines the scoring pipeline failure taxonomy using thiserror.
//! Every variant is recoverable at the pipeline boundary: a failure
//! terminates the current run cleanly and is reported as a structured
//! reason to the caller; none crash the process.

use thiserror::Error;

/// Main error type for the scoring engine
#[derive(Error, Debug)]
pub enum Error {
    /// No audio input device is available
    #[error("No capture device available: {0}")]
    NoCaptureDevice(String),

    /// A scoring run (or capture) is already in progress
    #[error("A scoring run is already in progress")]
    AlreadyRunning,

    /// Malformed capture parameters or empty capture buffer
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Target word absent from the pronunciation dictionary
    #[error("Word not found in dictionary: {0}")]
    UnknownWord(String),

    /// Recognition did not complete within the configured budget
    #[error("Recognition timed out after {budget_secs} s")]
    RecognitionTimeout { budget_secs: u64 },

    /// Gateway-reported recognition error
    #[error("Recognition failed: {0}")]
    RecognitionFailure(String),

    /// Weight triple does not sum to 1.0 within tolerance
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    /// Run cancelled by the caller
    #[error("Scoring run cancelled")]
    Cancelled,

    /// Dictionary loading or parsing errors
    #[error("Dictionary error: {0}")]
    Dictionary(String),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
