//! External capture process
//!
//! This module describes how a stream URL becomes a capture subprocess.
//! The media engine itself is opaque: it reads a stream and writes encoded
//! bytes to stdout.

pub mod ffmpeg;
pub mod traits;

pub use ffmpeg::FfmpegBackend;
pub use traits::{CaptureBackend, CaptureCommand, MediaContainer};
