//! Configuration loading
//!
//! Reads the JSON configuration file, applies defaults and validates the
//! stream list. Any error here is fatal: the process exits before recording.

pub mod loader;
pub mod schema;

pub use loader::load_from_file;
pub use schema::{validate_streams, AppConfig, StreamConfig};

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("no valid streams configured")]
    NoStreams,

    #[error("invalid stream {name:?}: {reason}")]
    InvalidStream { name: String, reason: String },

    #[error("streams {first:?} and {second:?} would both record to {slug:?}")]
    DuplicateStream {
        first: String,
        second: String,
        slug: String,
    },

    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),

    #[error("cannot create recordings directory {path:?}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
