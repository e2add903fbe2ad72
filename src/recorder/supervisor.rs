//! Stream supervisor
//!
//! Keeps one stream recording for the lifetime of the process. A run that
//! ends without error is followed by the next one right away. Every failure
//! is logged and retried after a fixed cool-down, with no retry limit: a dead
//! stream must never take the process or its siblings down.

use super::error::RecordingResult;
use super::state::{RecordingState, RunOutcome, StreamStatus};
use super::unit::RecordingUnit;
use crate::config::StreamConfig;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Pause between a failed run and the next attempt
pub const RESTART_COOLDOWN: Duration = Duration::from_secs(5);

/// Restart loop around a [`RecordingUnit`] for one stream
pub struct StreamSupervisor {
    stream: StreamConfig,
    unit: Arc<RecordingUnit>,
    status: Arc<RwLock<StreamStatus>>,
    cooldown: Duration,
}

impl StreamSupervisor {
    pub fn new(stream: StreamConfig, unit: Arc<RecordingUnit>) -> Self {
        let status = Arc::new(RwLock::new(StreamStatus::new(stream.name.clone())));
        Self {
            stream,
            unit,
            status,
            cooldown: RESTART_COOLDOWN,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// Shared status cell, updated as the supervisor moves through its states
    pub fn status(&self) -> Arc<RwLock<StreamStatus>> {
        self.status.clone()
    }

    /// Record until `cancel` fires. Never returns early and never fails.
    pub async fn supervise_forever(self, cancel: CancellationToken) {
        let span = tracing::info_span!("stream", name = %self.stream.name);
        self.supervise(cancel).instrument(span).await
    }

    async fn supervise(self, cancel: CancellationToken) {
        tracing::info!("Starting continuous recording for {}", self.stream.name);

        while !cancel.is_cancelled() {
            self.status.write().attempts += 1;

            match self.run_once(&cancel).await {
                Ok(RunOutcome::Rotated) => {
                    let mut status = self.status.write();
                    status.rotations += 1;
                    status.state = RecordingState::Rotating;
                    continue;
                }
                Ok(RunOutcome::Finished) => {
                    tracing::info!("Capture of {} ended on its own, restarting", self.stream.name);
                    continue;
                }
                Ok(RunOutcome::Cancelled) => break,
                Err(e) => {
                    tracing::error!("Error during recording of {}: {}", self.stream.name, e);
                    let mut status = self.status.write();
                    status.failures += 1;
                    status.last_error = Some(e.to_string());
                    status.state = RecordingState::Failed;
                }
            }

            {
                let mut status = self.status.write();
                status.state = RecordingState::Cooldown;
                status.output_file = None;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.cooldown) => {}
                _ = cancel.cancelled() => break,
            }
        }

        let mut status = self.status.write();
        status.state = RecordingState::Stopped;
        status.output_file = None;
        tracing::info!("Stopped recording {}", self.stream.name);
    }

    async fn run_once(&self, cancel: &CancellationToken) -> RecordingResult<RunOutcome> {
        let active = self.unit.start(&self.stream).await?;
        {
            let mut status = self.status.write();
            status.state = RecordingState::Capturing;
            status.output_file = Some(active.session().output_path.clone());
        }
        active.run(cancel).await
    }
}
