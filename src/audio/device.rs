//! Audio device listing
//!
//! Enumerates the input and output devices known to the default CPAL host so
//! the CLI can show what is available before recording starts. Nothing here
//! feeds the capture path; the listing is purely informational.

use std::fmt;

use cpal::traits::{DeviceTrait, HostTrait};

/// Whether a device records or plays audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Input,
    Output,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Input => write!(f, "input"),
            DeviceKind::Output => write!(f, "output"),
        }
    }
}

/// One line of the device listing.
///
/// Channel count and sample rate come from the device's default config and
/// are absent when the host cannot report one.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub name: String,
    pub kind: DeviceKind,
    pub channels: Option<u16>,
    pub sample_rate_hz: Option<u32>,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.channels, self.sample_rate_hz) {
            (Some(channels), Some(rate)) => {
                write!(f, "[{}] {} ({} ch @ {} Hz)", self.kind, self.name, channels, rate)
            }
            _ => write!(f, "[{}] {}", self.kind, self.name),
        }
    }
}

/// The host audio subsystem refused to enumerate devices.
#[derive(Debug, Clone)]
pub struct EnumerationError(pub String);

impl fmt::Display for EnumerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to enumerate audio devices: {}", self.0)
    }
}

impl std::error::Error for EnumerationError {}

/// List every input and output device the default host knows about.
pub fn list_devices() -> Result<Vec<DeviceInfo>, EnumerationError> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    let inputs = host
        .input_devices()
        .map_err(|e| EnumerationError(e.to_string()))?;
    for device in inputs {
        devices.push(describe(&device, DeviceKind::Input));
    }

    let outputs = host
        .output_devices()
        .map_err(|e| EnumerationError(e.to_string()))?;
    for device in outputs {
        devices.push(describe(&device, DeviceKind::Output));
    }

    log::debug!("Enumerated {} audio devices", devices.len());
    Ok(devices)
}

fn describe(device: &cpal::Device, kind: DeviceKind) -> DeviceInfo {
    let name = device.name().unwrap_or_else(|_| String::from("<unknown>"));
    let config = match kind {
        DeviceKind::Input => device.default_input_config().ok(),
        DeviceKind::Output => device.default_output_config().ok(),
    };

    DeviceInfo {
        name,
        kind,
        channels: config.as_ref().map(|c| c.channels()),
        sample_rate_hz: config.as_ref().map(|c| c.sample_rate().0),
    }
}
