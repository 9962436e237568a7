//! Microphone capture using cpal
//!
//! The capture device is a single exclusive resource: starting a
//! capture while one is active is rejected, not queued. Stopping
//! returns a buffer sized to the *actual* number of captured samples.

use crate::audio::AudioBuffer;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Audio capture boundary.
///
/// Implemented by [`CpalCapture`] for real microphones and by
/// [`FakeCapture`] for deterministic tests.
pub trait AudioCapture: Send + Sync {
    /// Begin capturing, bounded by `max_duration`.
    ///
    /// # Errors
    /// - `AlreadyRunning` if a capture is active
    /// - `NoCaptureDevice` if no input device is available
    fn start(&self, max_duration: Duration) -> Result<()>;

    /// Stop capturing and return the recorded buffer, trimmed to the
    /// actual captured sample count.
    fn stop(&self) -> Result<AudioBuffer>;

    /// Whether a capture is currently active
    fn is_active(&self) -> bool;
}

/// State of one in-progress capture
struct ActiveCapture {
    samples: Arc<Mutex<Vec<f32>>>,
    stop_flag: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Microphone capture over a cpal input stream.
///
/// The cpal stream is not Send, so it lives on a dedicated capture
/// thread; the callback accumulates samples into a shared Vec that
/// `stop()` drains.
pub struct CpalCapture {
    /// Requested device name (None = default input device)
    device_name: Option<String>,
    channels: u16,
    sample_rate: u32,
    active: Mutex<Option<ActiveCapture>>,
}

impl CpalCapture {
    /// Create a capture handle for the named device (None = default).
    ///
    /// The device itself is opened lazily on `start`, so a missing
    /// microphone surfaces per-run rather than at service startup.
    pub fn new(device_name: Option<String>, channels: u16, sample_rate: u32) -> Self {
        Self {
            device_name,
            channels,
            sample_rate,
            active: Mutex::new(None),
        }
    }

    /// List available audio input devices.
    pub fn list_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();

        let devices: Vec<String> = host
            .input_devices()
            .map_err(|e| Error::NoCaptureDevice(format!("Failed to enumerate devices: {}", e)))?
            .filter_map(|device| device.name().ok())
            .collect();

        debug!("Found {} input devices", devices.len());
        Ok(devices)
    }

    /// Capture thread body: opens the device and stream, then idles
    /// until the stop flag is set. The stream is dropped on exit.
    fn run_stream(
        device_name: Option<String>,
        channels: u16,
        sample_rate: u32,
        max_samples: usize,
        samples: Arc<Mutex<Vec<f32>>>,
        stop_flag: Arc<AtomicBool>,
        ready_tx: mpsc::Sender<Result<()>>,
    ) {
        let host = cpal::default_host();

        let device = if let Some(name) = device_name.as_ref() {
            let found = host
                .input_devices()
                .ok()
                .and_then(|mut devices| devices.find(|d| d.name().ok().as_deref() == Some(name)));
            match found {
                Some(dev) => {
                    info!("Using requested input device: {}", name);
                    Some(dev)
                }
                None => {
                    warn!("Input device '{}' not found, falling back to default", name);
                    host.default_input_device()
                }
            }
        } else {
            host.default_input_device()
        };

        let device = match device {
            Some(dev) => dev,
            None => {
                let _ = ready_tx.send(Err(Error::NoCaptureDevice(
                    "no input device detected".to_string(),
                )));
                return;
            }
        };

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let callback_samples = Arc::clone(&samples);
        let callback_stop = Arc::clone(&stop_flag);
        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if callback_stop.load(Ordering::Relaxed) {
                    return;
                }
                if let Ok(mut buf) = callback_samples.lock() {
                    // Hard cap at the requested duration plus margin
                    let remaining = max_samples.saturating_sub(buf.len());
                    let take = remaining.min(data.len());
                    buf.extend_from_slice(&data[..take]);
                }
            },
            move |err| {
                warn!("Capture stream error: {}", err);
            },
            None,
        );

        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                let _ = ready_tx.send(Err(Error::NoCaptureDevice(format!(
                    "failed to open input stream: {}",
                    e
                ))));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready_tx.send(Err(Error::NoCaptureDevice(format!(
                "failed to start input stream: {}",
                e
            ))));
            return;
        }

        let _ = ready_tx.send(Ok(()));

        while !stop_flag.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_millis(10));
        }
        // Stream dropped here, releasing the device
    }
}

impl AudioCapture for CpalCapture {
    fn start(&self, max_duration: Duration) -> Result<()> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| Error::Internal("capture state poisoned".to_string()))?;
        if active.is_some() {
            return Err(Error::AlreadyRunning);
        }

        // One extra second of headroom, matching the requested-duration
        // cap discipline of the capture contract (trim on stop).
        let max_samples = ((max_duration.as_secs_f32() + 1.0)
            * self.sample_rate as f32
            * self.channels as f32) as usize;

        let samples = Arc::new(Mutex::new(Vec::new()));
        let stop_flag = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_samples = Arc::clone(&samples);
        let thread_stop = Arc::clone(&stop_flag);
        let device_name = self.device_name.clone();
        let channels = self.channels;
        let sample_rate = self.sample_rate;

        let thread = std::thread::spawn(move || {
            Self::run_stream(
                device_name,
                channels,
                sample_rate,
                max_samples,
                thread_samples,
                thread_stop,
                ready_tx,
            );
        });

        // Wait for the capture thread to confirm the stream is live
        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => {
                debug!(
                    "Capture started (max {:.1} s at {} Hz)",
                    max_duration.as_secs_f32(),
                    sample_rate
                );
                *active = Some(ActiveCapture {
                    samples,
                    stop_flag,
                    thread,
                });
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                stop_flag.store(true, Ordering::Relaxed);
                let _ = thread.join();
                Err(Error::NoCaptureDevice(
                    "capture device did not respond".to_string(),
                ))
            }
        }
    }

    fn stop(&self) -> Result<AudioBuffer> {
        let capture = self
            .active
            .lock()
            .map_err(|_| Error::Internal("capture state poisoned".to_string()))?
            .take()
            .ok_or_else(|| Error::Internal("no capture in progress".to_string()))?;

        capture.stop_flag.store(true, Ordering::Relaxed);
        if capture.thread.join().is_err() {
            warn!("Capture thread panicked during shutdown");
        }

        let samples = capture
            .samples
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default();

        debug!("Capture stopped: {} samples", samples.len());
        Ok(AudioBuffer::new(samples, self.channels, self.sample_rate))
    }

    fn is_active(&self) -> bool {
        self.active.lock().map(|a| a.is_some()).unwrap_or(false)
    }
}

/// Deterministic capture source producing a pre-set buffer.
///
/// Used by the pipeline test suites in place of a real microphone.
pub struct FakeCapture {
    buffer: AudioBuffer,
    active: AtomicBool,
}

impl FakeCapture {
    pub fn new(buffer: AudioBuffer) -> Self {
        Self {
            buffer,
            active: AtomicBool::new(false),
        }
    }

    /// A half-second 440 Hz sine buffer at 16 kHz mono
    pub fn sine() -> Self {
        let sample_rate = 16_000u32;
        let samples: Vec<f32> = (0..sample_rate / 2)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (t * 440.0 * 2.0 * std::f32::consts::PI).sin() * 0.5
            })
            .collect();
        Self::new(AudioBuffer::new(samples, 1, sample_rate))
    }
}

impl AudioCapture for FakeCapture {
    fn start(&self, _max_duration: Duration) -> Result<()> {
        if self.active.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyRunning);
        }
        Ok(())
    }

    fn stop(&self) -> Result<AudioBuffer> {
        if !self.active.swap(false, Ordering::SeqCst) {
            return Err(Error::Internal("no capture in progress".to_string()));
        }
        Ok(self.buffer.clone())
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}
