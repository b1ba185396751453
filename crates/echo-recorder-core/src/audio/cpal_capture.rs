use crate::{AudioCapture, CoreResult, PermissionStatus, SessionError};

use std::{
    collections::VecDeque,
    panic::Location,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use cpal::{
    Device, Stream, StreamConfig,
    traits::{DeviceTrait, HostTrait, StreamTrait},
};
use error_location::ErrorLocation;
use futures::future::{BoxFuture, FutureExt};
use hound::{SampleFormat, WavSpec, WavWriter};
use tracing::{debug, error, info, instrument};

/// Maximum samples to buffer (5 minutes at 48kHz mono).
/// Prevents unbounded memory growth during long recordings.
///
/// **Memory footprint at max capacity:**
/// - 48,000 Hz * 60s * 5 min * 4 bytes/f32 = ~58MB
/// - This is a hard upper bound; clips are expected to be short
pub(crate) const MAX_BUFFER_SAMPLES: usize = 48_000 * 60 * 5;

const BITS_PER_SAMPLE: u16 = 16;

/// Everything resolved by `prepare`.
struct PreparedDevice {
    device: Device,
    config: StreamConfig,
    destination: PathBuf,
}

/// Captures the default cpal input device into a 16-bit WAV file.
///
/// Holds a `cpal::Stream` while recording, which is `!Send`; keep it on the
/// controller's local task set.
#[derive(Default)]
pub struct CpalCapture {
    prepared: Option<PreparedDevice>,
    stream: Option<Stream>,
    samples: Arc<Mutex<VecDeque<f32>>>,
    /// Signals the audio callback to stop writing. Set to `true` before
    /// dropping the stream so no in-flight callback writes after the lock
    /// is acquired in `stop()`.
    shutdown: Arc<AtomicBool>,
}

impl CpalCapture {
    /// Create an unprepared capture. No device is opened until `prepare`.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioCapture for CpalCapture {
    // Desktop hosts have no runtime microphone prompt; a missing or blocked
    // device shows up as a `prepare` failure instead.
    fn check_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn request_permission(&self) -> BoxFuture<'static, bool> {
        futures::future::ready(true).boxed()
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn prepare(&mut self, destination: &Path) -> CoreResult<()> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(SessionError::DevicePrepareFailed {
                reason: "No microphone found".to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let config = device
            .default_input_config()
            .map_err(|e| SessionError::DevicePrepareFailed {
                reason: format!("Failed to get config: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(
            device = ?device.name().ok(),
            sample_rate = config.sample_rate().0,
            channels = config.channels(),
            destination = ?destination,
            "Capture device prepared"
        );

        self.prepared = Some(PreparedDevice {
            device,
            config: config.into(),
            destination: destination.to_path_buf(),
        });

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn start(&mut self) -> CoreResult<()> {
        let prepared = self.prepared.as_ref().ok_or(SessionError::DeviceError {
            reason: "Capture device not prepared".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let samples = Arc::clone(&self.samples);
        let shutdown = Arc::clone(&self.shutdown);

        self.shutdown.store(false, Ordering::Release);

        samples
            .lock()
            .map_err(|e| SessionError::DeviceError {
                reason: format!("Failed to lock samples: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .clear();

        let stream = prepared
            .device
            .build_input_stream(
                &prepared.config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if shutdown.load(Ordering::Acquire) {
                        return;
                    }
                    // A poisoned lock still holds valid samples.
                    let mut buf = samples.lock().unwrap_or_else(|e| {
                        error!("Sample buffer lock poisoned, recovering: {}", e);
                        e.into_inner()
                    });
                    buf.extend(data.iter().copied());
                    while buf.len() > MAX_BUFFER_SAMPLES {
                        buf.pop_front();
                    }
                },
                |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| SessionError::DeviceError {
                reason: format!("Failed to build stream: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        stream.play().map_err(|e| SessionError::DeviceError {
            reason: format!("Failed to start stream: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        self.stream = Some(stream);
        info!("Audio capture started");

        Ok(())
    }

    #[track_caller]
    #[instrument(skip(self))]
    fn stop(&mut self) -> CoreResult<()> {
        self.shutdown.store(true, Ordering::Release);

        let stream = self.stream.take().ok_or(SessionError::DeviceError {
            reason: "Capture is not running".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;
        drop(stream);
        // Some backends return from drop() before the final callback runs.
        std::thread::sleep(std::time::Duration::from_millis(5));

        let prepared = self.prepared.as_ref().ok_or(SessionError::DeviceError {
            reason: "Capture device not prepared".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let samples: Vec<f32> = self
            .samples
            .lock()
            .map_err(|e| SessionError::DeviceError {
                reason: format!("Failed to lock samples: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?
            .drain(..)
            .collect();

        write_wav(
            &prepared.destination,
            prepared.config.channels,
            prepared.config.sample_rate.0,
            &samples,
        )?;

        info!(
            sample_count = samples.len(),
            destination = ?prepared.destination,
            "Audio capture stopped"
        );

        Ok(())
    }
}

/// Encode f32 samples as 16-bit signed PCM WAV.
#[track_caller]
pub(crate) fn write_wav(
    path: &Path,
    channels: u16,
    sample_rate: u32,
    samples: &[f32],
) -> CoreResult<()> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let location = Location::caller();
    let to_io = |e: hound::Error| SessionError::ArtifactWriteFailed {
        name: "recording",
        source: std::io::Error::other(e),
        location: ErrorLocation::from(location),
    };

    let mut writer = WavWriter::create(path, spec).map_err(to_io)?;
    for &sample in samples {
        let amplitude = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(amplitude).map_err(to_io)?;
    }
    writer.finalize().map_err(to_io)?;

    debug!(path = ?path, sample_count = samples.len(), "WAV written");

    Ok(())
}
