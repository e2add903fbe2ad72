//! Recording system module
//!
//! This module implements the per-stream recording architecture:
//! - RecordingUnit records one stream for the current hour
//! - StreamSupervisor restarts it forever, with a cool-down after failures
//! - SupervisorPool runs one supervisor per configured stream

pub mod error;
pub mod output;
pub mod pool;
pub mod state;
pub mod supervisor;
pub mod unit;

pub use error::{RecordingError, RecordingResult};
pub use output::OutputFile;
pub use pool::{StatusBoard, SupervisorPool};
pub use state::{FileDisposition, RecordingSession, RecordingState, RunOutcome, StreamStatus};
pub use supervisor::{StreamSupervisor, RESTART_COOLDOWN};
pub use unit::{ActiveRecording, RecordingUnit};
