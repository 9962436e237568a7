//! Canonical WAV (RIFF/PCM16) encoding
//!
//! Turns an [`AudioBuffer`] into an uncompressed waveform byte stream:
//! 44-byte RIFF header followed by interleaved signed 16-bit
//! little-endian samples. Pure and deterministic; the encoder itself
//! never touches storage.

use crate::audio::AudioBuffer;
use crate::error::{Error, Result};
use std::path::Path;

/// Bytes per encoded sample (PCM16)
const BYTES_PER_SAMPLE: u32 = 2;

/// Size of the fmt chunk body
const FMT_CHUNK_SIZE: u32 = 16;

/// PCM format tag
const FORMAT_PCM: u16 = 1;

/// Encode an audio buffer into a canonical WAV byte stream.
///
/// Samples are clamped to [-1.0, 1.0] and quantized as
/// `round(clamp(s) * 32767)` to i16 little-endian.
///
/// # Errors
/// `Encoding` if the buffer's channel count or sample rate is zero;
/// well-formed input has no error path.
pub fn encode(buffer: &AudioBuffer) -> Result<Vec<u8>> {
    if buffer.channels == 0 {
        return Err(Error::Encoding("channel count must be non-zero".to_string()));
    }
    if buffer.sample_rate == 0 {
        return Err(Error::Encoding("sample rate must be non-zero".to_string()));
    }

    let data_bytes = buffer.samples.len() as u32 * BYTES_PER_SAMPLE;
    let byte_rate = buffer.sample_rate * buffer.channels as u32 * BYTES_PER_SAMPLE;
    let block_align = buffer.channels * BYTES_PER_SAMPLE as u16;

    let mut out = Vec::with_capacity(44 + data_bytes as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_bytes).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&FMT_CHUNK_SIZE.to_le_bytes());
    out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    out.extend_from_slice(&buffer.channels.to_le_bytes());
    out.extend_from_slice(&buffer.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&(8 * BYTES_PER_SAMPLE as u16).to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_bytes.to_le_bytes());

    for &sample in &buffer.samples {
        let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        out.extend_from_slice(&quantized.to_le_bytes());
    }

    Ok(out)
}

/// Encode a buffer and write it to `path`.
///
/// Convenience composition used for the optional save-last-recording
/// debug artifact; overwrites any previous file at the path.
pub fn write_wav<P: AsRef<Path>>(path: P, buffer: &AudioBuffer) -> Result<()> {
    let bytes = encode(buffer)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
