//! Recording state management
//!
//! Defines the per-stream state machine and session tracking.

use crate::config::StreamConfig;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Current state of one stream's recorder
///
/// `Idle -> Capturing -> (Rotating -> Capturing | Failed -> Cooldown -> Capturing)`,
/// until shutdown moves it to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// Not started yet
    #[default]
    Idle,
    /// Capture process running for the current hour
    Capturing,
    /// Hour changed, switching to the next file
    Rotating,
    /// Last run ended with an error
    Failed,
    /// Waiting before the next attempt
    Cooldown,
    /// Process is shutting down
    Stopped,
}

/// How the output file was prepared for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileDisposition {
    /// No file existed for this key
    Created,
    /// A recent file existed, new bytes are appended
    Continued,
    /// An expired file existed and was deleted first
    Replaced,
}

/// One hour of capture for one stream
#[derive(Debug, Clone)]
pub struct RecordingSession {
    /// Correlates log lines of a single run
    pub id: Uuid,
    pub stream: StreamConfig,
    /// Two-digit hour the session belongs to
    pub hour: String,
    /// Lowercase weekday the session belongs to
    pub day: String,
    pub output_path: PathBuf,
    pub started_at: DateTime<Tz>,
    pub disposition: FileDisposition,
}

impl RecordingSession {
    /// Whether `hour` is past this session's hour
    pub fn is_rolled_over(&self, hour: &str) -> bool {
        self.hour != hour
    }
}

/// Result of a run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The hour changed and the capture process was stopped
    Rotated,
    /// The capture process exited cleanly on its own
    Finished,
    /// Shutdown was requested
    Cancelled,
}

/// Observable snapshot of a stream's supervisor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamStatus {
    pub name: String,
    pub state: RecordingState,
    /// File currently being written, if any
    pub output_file: Option<PathBuf>,
    /// Runs started
    pub attempts: u64,
    /// Runs that ended with an error
    pub failures: u64,
    /// Hour rollovers completed
    pub rotations: u64,
    pub last_error: Option<String>,
}

impl StreamStatus {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RecordingState::Idle,
            output_file: None,
            attempts: 0,
            failures: 0,
            rotations: 0,
            last_error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_for_liveness_payload() {
        let mut status = StreamStatus::new("Radio One");
        status.state = RecordingState::Cooldown;
        status.failures = 2;

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["name"], "Radio One");
        assert_eq!(json["state"], "cooldown");
        assert_eq!(json["failures"], 2);
        assert!(json["outputFile"].is_null());
    }
}
