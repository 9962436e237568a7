//! Configuration for the SayRight scoring engine
//!
//! Single-tier TOML bootstrap configuration: everything the service
//! needs is known at startup and cannot change while running.
//! Priority order for each setting:
//! 1. Command-line arguments (--port, --dictionary)
//! 2. Environment variables (SAYRIGHT_PORT, SAYRIGHT_DICTIONARY)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::error::{Error, Result};
use crate::pipeline::PipelineConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Bootstrap configuration loaded from TOML
///
/// These settings cannot change during runtime; restart to pick up
/// changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP server port
    pub port: u16,

    /// Path to the CMU-format pronunciation dictionary
    pub dictionary_path: PathBuf,

    /// Recognizer endpoint settings
    pub recognizer: RecognizerConfig,

    /// Capture device settings
    pub capture: CaptureConfig,

    /// Optional debug artifact: the last encoded recording is written
    /// here after each run
    pub save_last_recording: Option<PathBuf>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Recognition gateway settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Inference endpoint URL
    pub url: String,

    /// Hard budget for the recognition wait, in seconds
    pub timeout_secs: u64,

    /// Poll interval while awaiting recognition, in milliseconds
    pub poll_interval_ms: u64,
}

/// Audio capture settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture sample rate in Hz
    pub sample_rate: u32,

    /// Capture channel count (microphones are mono)
    pub channels: u16,

    /// Default maximum capture duration, in seconds
    pub max_duration_secs: f64,

    /// Input device name (None = default input device)
    pub device: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log filter (tracing EnvFilter syntax)
    pub level: String,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: 5760,
            dictionary_path: PathBuf::from("resources/cmudict.sample"),
            recognizer: RecognizerConfig::default(),
            capture: CaptureConfig::default(),
            save_last_recording: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5761/api/v1/recognize".to_string(),
            timeout_secs: 30,
            poll_interval_ms: 100,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            max_duration_secs: 5.0,
            device: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "sayright_engine=debug,info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("failed to parse {}: {}", path.display(), e)))
    }

    /// Pipeline tuning derived from this configuration
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            recognition_timeout: Duration::from_secs(self.recognizer.timeout_secs),
            poll_interval: Duration::from_millis(self.recognizer.poll_interval_ms),
            save_last_recording: self.save_last_recording.clone(),
        }
    }

    /// Default capture duration as a Duration
    pub fn max_capture_duration(&self) -> Duration {
        Duration::from_secs_f64(self.capture.max_duration_secs)
    }
}
