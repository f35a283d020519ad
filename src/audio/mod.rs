//! Audio capture module for micrec
//!
//! This module handles input device discovery and fixed-duration microphone
//! capture. Uses CPAL to talk to the host audio subsystem.

pub mod capture;
pub mod device;

pub use capture::{AudioClip, CaptureConfig, CaptureError, CaptureSource, CpalInput};
pub use device::{list_devices, DeviceInfo, DeviceKind, EnumerationError};
