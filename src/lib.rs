//! micrec: record a fixed-length clip from the default microphone and save
//! it as a timestamped WAV file in the current directory.
//!
//! The flow is strictly linear: list devices (informational), capture a
//! 5-second mono clip at 44.1 kHz, write it out as 16-bit PCM. Any capture
//! or persistence failure surfaces as a single error message and a nonzero
//! exit code; nothing is retried.

pub mod audio;
pub mod storage;

use std::fmt;
use std::path::{Path, PathBuf};

pub use audio::capture::{AudioClip, CaptureConfig, CaptureError, CaptureSource, CpalInput};
pub use audio::device::{list_devices, DeviceInfo, DeviceKind, EnumerationError};
pub use storage::wav::{recording_filename, save_clip, Clock, PersistenceError, SystemClock};

/// Top-level failure of a recording run.
#[derive(Debug, Clone)]
pub enum RunError {
    Capture(CaptureError),
    Persistence(PersistenceError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Capture(e) => e.fmt(f),
            RunError::Persistence(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for RunError {}

impl From<CaptureError> for RunError {
    fn from(err: CaptureError) -> Self {
        RunError::Capture(err)
    }
}

impl From<PersistenceError> for RunError {
    fn from(err: PersistenceError) -> Self {
        RunError::Persistence(err)
    }
}

/// Capture one clip from `source` and persist it under `out_dir`.
///
/// The clip is fully captured before the output file is created, so a
/// capture failure never leaves a file on disk.
pub fn record_and_save(
    source: &dyn CaptureSource,
    config: &CaptureConfig,
    out_dir: &Path,
    clock: &dyn Clock,
) -> Result<PathBuf, RunError> {
    let clip = source.record(config)?;
    log::debug!(
        "Captured {} samples at {} Hz",
        clip.len(),
        clip.sample_rate_hz()
    );

    let path = save_clip(&clip, out_dir, clock)?;
    Ok(path)
}

/// One full production run: device listing, default input device, default
/// config, current directory, system clock.
pub fn run() -> Result<PathBuf, RunError> {
    match list_devices() {
        Ok(devices) => {
            println!("Available audio devices:");
            for device in &devices {
                println!("  {}", device);
            }
        }
        // Listing is informational; capture reports the real failure if the
        // audio subsystem is gone.
        Err(err) => log::warn!("{}", err),
    }

    let config = CaptureConfig::default();
    let source = CpalInput::default_input()?;

    println!();
    println!("Using default input device: {}", source.describe());
    println!("Recording for {} seconds...", config.duration_secs);

    let path = record_and_save(&source, &config, Path::new("."), &SystemClock)?;
    println!("Recording saved as: {}", path.display());
    Ok(path)
}

/// Process exit status for a completed run: 0 on success, 1 on failure.
pub fn exit_code<T>(result: &Result<T, RunError>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
