//! WAV persistence for captured clips
//!
//! Writes a clip to `recording_YYYYMMDD_HHMMSS.wav` in the requested
//! directory. The file is only created once the full clip is in hand, and a
//! failed write removes the partial file before the error propagates. Two
//! saves within the same second produce the same name and the second one
//! overwrites the first.

use std::fmt;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use hound::{WavSpec, WavWriter};

use crate::audio::AudioClip;

/// Errors that can occur while writing a WAV file.
#[derive(Debug, Clone)]
pub enum PersistenceError {
    CreateFailed(String),
    WriteFailed(String),
    FinalizeFailed(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::CreateFailed(e) => write!(f, "Failed to create WAV file: {}", e),
            PersistenceError::WriteFailed(e) => write!(f, "Failed to write audio data: {}", e),
            PersistenceError::FinalizeFailed(e) => {
                write!(f, "Failed to finalize WAV file: {}", e)
            }
        }
    }
}

impl std::error::Error for PersistenceError {}

/// Time source for recording filenames.
///
/// Production uses [`SystemClock`]; tests pin a fixed instant to get
/// deterministic names.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// Wall-clock local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Filename for a recording completed at `now`.
/// Format: `recording_YYYYMMDD_HHMMSS.wav`
pub fn recording_filename(now: &DateTime<Local>) -> String {
    format!("recording_{}.wav", now.format("%Y%m%d_%H%M%S"))
}

/// Write `clip` as a 16-bit mono PCM WAV file under `out_dir`.
///
/// The header sample rate equals the clip's capture rate. Returns the full
/// path of the file written.
pub fn save_clip(
    clip: &AudioClip,
    out_dir: &Path,
    clock: &dyn Clock,
) -> Result<PathBuf, PersistenceError> {
    let path = out_dir.join(recording_filename(&clock.now()));

    let spec = WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate_hz(),
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = WavWriter::create(&path, spec)
        .map_err(|e| PersistenceError::CreateFailed(e.to_string()))?;

    let result = write_samples(&mut writer, clip.samples()).and_then(|()| {
        writer
            .finalize()
            .map_err(|e| PersistenceError::FinalizeFailed(e.to_string()))
    });

    if let Err(err) = result {
        // Never leave a partial file behind.
        let _ = fs::remove_file(&path);
        return Err(err);
    }

    log::info!("Recording finalized: {:?}", path);
    Ok(path)
}

fn write_samples(
    writer: &mut WavWriter<BufWriter<fs::File>>,
    samples: &[i16],
) -> Result<(), PersistenceError> {
    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| PersistenceError::WriteFailed(e.to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 1, 15, 9, 30, 5).unwrap()
    }

    #[test]
    fn filename_formats_timestamp() {
        assert_eq!(
            recording_filename(&fixed_time()),
            "recording_20240115_093005.wav"
        );
    }

    #[test]
    fn filenames_within_the_same_second_collide() {
        assert_eq!(
            recording_filename(&fixed_time()),
            recording_filename(&fixed_time())
        );
    }

    #[test]
    fn saved_wav_reads_back_with_matching_header_and_samples() {
        struct TestClock;
        impl Clock for TestClock {
            fn now(&self) -> DateTime<Local> {
                fixed_time()
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let samples: Vec<i16> = (0..1_000).map(|i| (i % 200) as i16).collect();
        let clip = AudioClip::new(samples.clone(), 8_000);

        let path = save_clip(&clip, dir.path(), &TestClock).unwrap();
        assert_eq!(path, dir.path().join("recording_20240115_093005.wav"));

        let mut reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 8_000);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_format, hound::SampleFormat::Int);

        let read_back: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(read_back, samples);
    }

    #[test]
    fn missing_directory_reports_create_failure() {
        struct TestClock;
        impl Clock for TestClock {
            fn now(&self) -> DateTime<Local> {
                fixed_time()
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let clip = AudioClip::new(vec![0i16; 8], 8_000);

        let err = save_clip(&clip, &missing, &TestClock).unwrap_err();
        assert!(matches!(err, PersistenceError::CreateFailed(_)));
        assert!(!missing.exists());
    }
}
