//! FFmpeg capture backend
//!
//! Pulls a network stream with FFmpeg and writes the encoded audio to stdout.

use super::traits::{CaptureBackend, CaptureCommand, MediaContainer};
use std::path::PathBuf;

/// Default program name, resolved through `PATH`
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Capture backend that runs FFmpeg
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    program: PathBuf,
}

impl FfmpegBackend {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new(DEFAULT_FFMPEG)
    }
}

impl CaptureBackend for FfmpegBackend {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn command(&self, url: &str, container: MediaContainer) -> CaptureCommand {
        let mut args: Vec<String> = vec![
            "-hide_banner".into(),
            "-nostdin".into(),
            "-loglevel".into(),
            "error".into(),
            "-i".into(),
            url.into(),
        ];

        match container {
            MediaContainer::Mp3 => {
                // Source is already MPEG audio, keep the original frames
                args.extend(["-c:a", "copy", "-f", "mp3"].map(String::from));
            }
            MediaContainer::Aac => {
                args.extend(["-c:a", "aac", "-f", "adts"].map(String::from));
            }
        }

        // stdout
        args.push("-".into());

        CaptureCommand {
            program: self.program.clone(),
            args,
        }
    }
}
