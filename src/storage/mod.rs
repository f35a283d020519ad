//! Storage module for micrec
//!
//! Serializes captured clips to timestamped WAV files. Uses hound for WAV
//! encoding and chrono for the filename timestamp.

pub mod wav;

pub use wav::{recording_filename, save_clip, Clock, PersistenceError, SystemClock};
