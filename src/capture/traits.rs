//! Capture trait definitions
//!
//! Backend-agnostic description of the external capture process.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Container written by the capture process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaContainer {
    /// MPEG audio, stream-copied
    Mp3,
    /// AAC in an ADTS container
    Aac,
}

impl MediaContainer {
    /// Pick the container from the stream locator.
    ///
    /// Only the URL path is inspected: query string and fragment are ignored.
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.to_ascii_lowercase().ends_with(".mp3") {
            MediaContainer::Mp3
        } else {
            MediaContainer::Aac
        }
    }

    /// File extension including the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            MediaContainer::Mp3 => ".mp3",
            MediaContainer::Aac => ".aac",
        }
    }
}

/// A fully resolved capture invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureCommand {
    /// Program to launch
    pub program: PathBuf,
    /// Arguments passed to the program
    pub args: Vec<String>,
}

/// Builds the external process that pulls a stream and writes encoded bytes to stdout.
///
/// Implementations must make the process:
/// - write the encoded stream to standard output
/// - report fatal argument errors on stderr containing `Invalid argument`
/// - exit with status 0 on a graceful stop
pub trait CaptureBackend: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Build the invocation for `url`, producing `container` on stdout
    fn command(&self, url: &str, container: MediaContainer) -> CaptureCommand;
}
