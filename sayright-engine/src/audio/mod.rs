//! Audio subsystem: capture buffers, WAV encoding, microphone capture

pub mod capture;
pub mod types;
pub mod wav;

pub use capture::{AudioCapture, CpalCapture};
pub use types::AudioBuffer;
