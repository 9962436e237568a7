//! Core audio data types
//!
//! Defines the capture buffer handed from the microphone stage to the
//! waveform encoder.

/// AudioBuffer holds captured audio ready for encoding.
///
/// **Format:**
/// - Samples are f32 (floating point -1.0 to 1.0)
/// - Mono, or interleaved when `channels > 1`
/// - Trimmed to the actual captured length, never silence-padded
///
/// Owned exclusively by the capture stage until handed to the
/// encoder; immutable thereafter.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// PCM samples (interleaved when multi-channel)
    pub samples: Vec<f32>,

    /// Channel count (1 for microphone capture)
    pub channels: u16,

    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / self.channels as usize
    }

    /// Duration in seconds
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f32 / self.sample_rate as f32
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
