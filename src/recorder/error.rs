//! Recording errors

use std::path::PathBuf;
use thiserror::Error;

/// Marker the capture process prints on stderr when it rejects its input
pub const INVALID_ARGUMENT_MARKER: &str = "Invalid argument";

/// Errors ending a single recording run.
///
/// All of them are recoverable: the supervisor logs them and retries after a cool-down.
#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("failed to launch capture process {program:?}: {source}")]
    SpawnFailure {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid stream arguments: {0}")]
    InvalidStreamArgs(String),

    #[error("capture process exited with {}", describe_exit(.0))]
    SubprocessExit(Option<i32>),

    #[error("file system error on {path:?}: {source}")]
    FileSystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecordingError {
    pub(crate) fn fs(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecordingError::FileSystem {
            path: path.into(),
            source,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "a signal".to_string(),
    }
}

pub type RecordingResult<T> = Result<T, RecordingError>;
