//! Fixed-duration microphone capture using CPAL
//!
//! The capture source opens the default input device at the requested
//! channel count and sample rate, blocks for the configured duration, and
//! returns the recorded samples as 16-bit PCM. Whatever sample format the
//! device speaks natively is converted to i16 in the stream callback.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, SampleFormat, SampleRate, Stream, StreamConfig};

/// Extra time allowed after the capture timer elapses for buffered samples
/// still sitting in the hardware queue.
const TAIL_GRACE: Duration = Duration::from_millis(300);
const TAIL_POLL: Duration = Duration::from_millis(10);

/// Errors that can occur while opening a device or recording from it.
#[derive(Debug, Clone)]
pub enum CaptureError {
    NoInputDevice,
    InvalidConfig(String),
    UnsupportedFormat(String),
    StreamFailed(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoInputDevice => write!(f, "No audio input device found"),
            CaptureError::InvalidConfig(e) => write!(f, "Invalid capture configuration: {}", e),
            CaptureError::UnsupportedFormat(e) => write!(f, "Unsupported sample format: {}", e),
            CaptureError::StreamFailed(e) => write!(f, "Audio stream failed: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

/// How much audio to record and at what rate.
///
/// Constructed once per run and never persisted. Capture is mono only, so
/// `channels` must stay at 1.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Recording length in whole seconds.
    pub duration_secs: u32,
    /// Samples captured per second.
    pub sample_rate_hz: u32,
    /// Channel count, fixed at 1.
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            duration_secs: 5,
            sample_rate_hz: 44_100,
            channels: 1,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.duration_secs == 0 {
            return Err("duration must be positive".into());
        }
        if self.sample_rate_hz == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.channels != 1 {
            return Err(format!("unsupported channel count: {}", self.channels));
        }
        Ok(())
    }

    /// Exact number of samples a clip recorded with this config holds.
    pub fn sample_count(&self) -> usize {
        self.duration_secs as usize * self.sample_rate_hz as usize
    }
}

/// A completed mono recording: 16-bit PCM samples plus the rate they were
/// captured at. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    samples: Vec<i16>,
    sample_rate_hz: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<i16>, sample_rate_hz: u32) -> Self {
        Self {
            samples,
            sample_rate_hz,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Something that can record a clip.
///
/// The production implementation is [`CpalInput`]; tests substitute doubles
/// to exercise device failures without hardware.
pub trait CaptureSource {
    /// Human-readable name of the underlying device.
    fn describe(&self) -> String;

    /// Block until `config.duration_secs` of audio has been captured and
    /// return a clip of exactly `config.sample_count()` samples.
    fn record(&self, config: &CaptureConfig) -> Result<AudioClip, CaptureError>;
}

/// Capture source backed by a CPAL input device.
pub struct CpalInput {
    device: Device,
    sample_format: SampleFormat,
    name: String,
}

impl CpalInput {
    /// Open the default input device of the default host.
    pub fn default_input() -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = host
            .default_input_device()
            .ok_or(CaptureError::NoInputDevice)?;

        let name = device.name().unwrap_or_else(|_| String::from("<unknown>"));

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::UnsupportedFormat(e.to_string()))?;

        log::info!(
            "Default input device: {} (native format {:?})",
            name,
            supported.sample_format()
        );

        Ok(Self {
            device,
            sample_format: supported.sample_format(),
            name,
        })
    }

    fn build_stream(
        &self,
        config: &StreamConfig,
        samples: Arc<Mutex<Vec<i16>>>,
        target: usize,
        failure: Arc<Mutex<Option<String>>>,
    ) -> Result<Stream, CaptureError> {
        let err_fn = move |err: cpal::StreamError| {
            log::error!("Audio stream error: {}", err);
            let mut slot = failure.lock().unwrap();
            if slot.is_none() {
                *slot = Some(err.to_string());
            }
        };

        match self.sample_format {
            SampleFormat::I16 => self.build_stream_typed::<i16>(config, samples, target, err_fn),
            SampleFormat::U16 => self.build_stream_typed::<u16>(config, samples, target, err_fn),
            SampleFormat::F32 => self.build_stream_typed::<f32>(config, samples, target, err_fn),
            other => Err(CaptureError::UnsupportedFormat(format!("{:?}", other))),
        }
    }

    fn build_stream_typed<T>(
        &self,
        config: &StreamConfig,
        samples: Arc<Mutex<Vec<i16>>>,
        target: usize,
        err_fn: impl FnMut(cpal::StreamError) + Send + 'static,
    ) -> Result<Stream, CaptureError>
    where
        T: cpal::SizedSample + cpal::Sample<Float = f32> + Send + 'static,
    {
        let stream = self
            .device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    let mut buffer = samples.lock().unwrap();
                    for &sample in data {
                        if buffer.len() >= target {
                            break;
                        }
                        buffer.push(sample_to_i16(sample));
                    }
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

        Ok(stream)
    }
}

impl CaptureSource for CpalInput {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn record(&self, config: &CaptureConfig) -> Result<AudioClip, CaptureError> {
        config.validate().map_err(CaptureError::InvalidConfig)?;

        let target = config.sample_count();
        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: SampleRate(config.sample_rate_hz),
            buffer_size: BufferSize::Default,
        };

        let samples = Arc::new(Mutex::new(Vec::with_capacity(target)));
        let failure = Arc::new(Mutex::new(None));

        let stream = self.build_stream(&stream_config, samples.clone(), target, failure.clone())?;

        stream
            .play()
            .map_err(|e| CaptureError::StreamFailed(e.to_string()))?;

        log::info!(
            "Capturing {} samples at {} Hz from {}",
            target,
            config.sample_rate_hz,
            self.name
        );

        thread::sleep(Duration::from_secs(u64::from(config.duration_secs)));

        // The device delivers samples in buffers, so the tail may still be
        // in flight when the timer elapses.
        let deadline = Instant::now() + TAIL_GRACE;
        while samples.lock().unwrap().len() < target && Instant::now() < deadline {
            thread::sleep(TAIL_POLL);
        }

        // Dropping the stream releases the input device.
        drop(stream);

        if let Some(message) = failure.lock().unwrap().take() {
            return Err(CaptureError::StreamFailed(message));
        }

        let mut recorded = std::mem::take(&mut *samples.lock().unwrap());
        if recorded.len() < target {
            log::debug!(
                "Captured {} of {} samples, padding the shortfall with silence",
                recorded.len(),
                target
            );
        }
        recorded.resize(target, 0);

        Ok(AudioClip::new(recorded, config.sample_rate_hz))
    }
}

/// Convert any supported sample type to i16 for the clip buffer.
fn sample_to_i16<T: cpal::Sample<Float = f32>>(sample: T) -> i16 {
    let f32_sample: f32 = sample.to_float_sample();
    let clamped = f32_sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_to_i16() {
        // f32 conversion
        assert_eq!(sample_to_i16(0.0f32), 0);
        assert_eq!(sample_to_i16(1.0f32), i16::MAX);
        assert_eq!(sample_to_i16(-1.0f32), -i16::MAX);

        // Clamping
        assert_eq!(sample_to_i16(2.0f32), i16::MAX);
        assert_eq!(sample_to_i16(-2.0f32), -i16::MAX);

        // u16 midpoint is silence
        assert_eq!(sample_to_i16(32_768u16), 0);
    }

    #[test]
    fn default_config_is_five_seconds_mono_at_44100() {
        let config = CaptureConfig::default();
        assert_eq!(config.duration_secs, 5);
        assert_eq!(config.sample_rate_hz, 44_100);
        assert_eq!(config.channels, 1);
        assert_eq!(config.sample_count(), 220_500);
    }

    #[test]
    fn sample_count_is_duration_times_rate() {
        let config = CaptureConfig {
            duration_secs: 1,
            sample_rate_hz: 8_000,
            channels: 1,
        };
        assert_eq!(config.sample_count(), 8_000);
    }

    #[test]
    fn validate_rejects_degenerate_configs() {
        let zero_duration = CaptureConfig {
            duration_secs: 0,
            ..CaptureConfig::default()
        };
        assert!(zero_duration.validate().is_err());

        let zero_rate = CaptureConfig {
            sample_rate_hz: 0,
            ..CaptureConfig::default()
        };
        assert!(zero_rate.validate().is_err());

        let stereo = CaptureConfig {
            channels: 2,
            ..CaptureConfig::default()
        };
        assert!(stereo.validate().is_err());

        assert!(CaptureConfig::default().validate().is_ok());
    }

    #[test]
    fn clip_reports_length_and_rate() {
        let clip = AudioClip::new(vec![0i16; 16], 8_000);
        assert_eq!(clip.len(), 16);
        assert!(!clip.is_empty());
        assert_eq!(clip.sample_rate_hz(), 8_000);
        assert_eq!(clip.samples().len(), 16);
    }
}
