//! Recording unit
//!
//! Records one stream for the remainder of the current wall-clock hour.
//! The capture process writes straight into the hour's output file; the unit
//! only watches the clock, the process and its diagnostics.

use super::error::{RecordingError, RecordingResult, INVALID_ARGUMENT_MARKER};
use super::output::OutputFile;
use super::state::{RecordingSession, RunOutcome};
use crate::capture::{CaptureBackend, MediaContainer};
use crate::clock::{day_key, hour_key, Clock};
use crate::config::StreamConfig;
use crate::retention::RetentionSweeper;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// How often the wall clock is checked for an hour change
pub const HOUR_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// How long a capture process gets to exit after SIGTERM before it is killed.
///
/// Together with [`HOUR_POLL_INTERVAL`] this bounds how long the previous hour's
/// file may still grow after the hour changed.
pub const STOP_GRACE_PERIOD: Duration = Duration::from_secs(1);

/// Starts hourly recordings into one output directory
pub struct RecordingUnit {
    output_dir: PathBuf,
    clock: Arc<dyn Clock>,
    backend: Arc<dyn CaptureBackend>,
    sweeper: Arc<RetentionSweeper>,
    poll_interval: Duration,
    stop_grace: Duration,
}

impl RecordingUnit {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        backend: Arc<dyn CaptureBackend>,
        sweeper: Arc<RetentionSweeper>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            clock,
            backend,
            sweeper,
            poll_interval: HOUR_POLL_INTERVAL,
            stop_grace: STOP_GRACE_PERIOD,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Record `stream` until the hour changes, the process exits or `cancel` fires
    pub async fn run_for_current_hour(
        &self,
        stream: &StreamConfig,
        cancel: &CancellationToken,
    ) -> RecordingResult<RunOutcome> {
        self.start(stream).await?.run(cancel).await
    }

    /// Prepare the hour's file and launch the capture process
    pub async fn start(&self, stream: &StreamConfig) -> RecordingResult<ActiveRecording> {
        if stream.url.trim().is_empty() {
            return Err(RecordingError::InvalidStreamArgs(format!(
                "stream {:?} has an empty url",
                stream.name
            )));
        }

        let now = self.clock.now();
        let hour = hour_key(&now);
        let day = day_key(&now);
        let container = MediaContainer::from_url(&stream.url);

        tracing::info!(
            "Recording started for {} at {}",
            stream.name,
            now.format("%Y-%m-%d %H:%M:%S")
        );

        let output = OutputFile::new(&self.output_dir, stream, &day, &hour, container);
        let disposition = output
            .prepare(SystemTime::from(now), self.sweeper.window())
            .await?;
        let file = output.open_append()?;

        let invocation = self.backend.command(&stream.url, container);
        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let spawned = command.spawn();
        // The command still holds the parent's copy of the file descriptor
        drop(command);

        let mut child = spawned.map_err(|e| RecordingError::SpawnFailure {
            program: invocation.program.clone(),
            source: e,
        })?;

        let session = RecordingSession {
            id: Uuid::new_v4(),
            stream: stream.clone(),
            hour,
            day,
            output_path: output.path().to_path_buf(),
            started_at: now,
            disposition,
        };

        tracing::debug!(
            "Launched {} (pid {:?}) for {} into {:?}",
            self.backend.name(),
            child.id(),
            stream.name,
            session.output_path
        );

        let (invalid_tx, invalid_rx) = oneshot::channel();
        let diagnostics = child.stderr.take().map(|stderr| {
            tokio::spawn(watch_diagnostics(stderr, stream.name.clone(), invalid_tx))
        });

        Ok(ActiveRecording {
            session,
            child,
            invalid_rx,
            diagnostics,
            clock: self.clock.clone(),
            sweeper: self.sweeper.clone(),
            poll_interval: self.poll_interval,
            stop_grace: self.stop_grace,
        })
    }
}

/// A running capture process and the session it writes
pub struct ActiveRecording {
    session: RecordingSession,
    child: Child,
    invalid_rx: oneshot::Receiver<String>,
    diagnostics: Option<JoinHandle<()>>,
    clock: Arc<dyn Clock>,
    sweeper: Arc<RetentionSweeper>,
    poll_interval: Duration,
    stop_grace: Duration,
}

impl ActiveRecording {
    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    /// Wait for rollover, process exit, an invalid-argument report or cancellation.
    ///
    /// The process is stopped and reaped before this returns, whatever the outcome.
    pub async fn run(self, cancel: &CancellationToken) -> RecordingResult<RunOutcome> {
        let span = tracing::info_span!(
            "session",
            id = %self.session.id,
            hour = %self.session.hour
        );
        self.watch(cancel).instrument(span).await
    }

    async fn watch(mut self, cancel: &CancellationToken) -> RecordingResult<RunOutcome> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut diagnostics_open = true;

        loop {
            tokio::select! {
                status = self.child.wait() => {
                    // A marker printed right before exiting still decides the outcome
                    self.drain_diagnostics().await;
                    if let Ok(line) = self.invalid_rx.try_recv() {
                        tracing::warn!("Error detected: invalid arguments. Restarting recording.");
                        return Err(RecordingError::InvalidStreamArgs(line));
                    }

                    return match status {
                        Ok(status) if status.success() => {
                            tracing::info!("Recording finished: {:?}", self.session.output_path);
                            Ok(RunOutcome::Finished)
                        }
                        Ok(status) => {
                            tracing::warn!("Capture process exited with code {:?}", status.code());
                            Err(RecordingError::SubprocessExit(status.code()))
                        }
                        Err(e) => {
                            tracing::error!("Lost track of capture process: {}", e);
                            Err(RecordingError::SubprocessExit(None))
                        }
                    };
                }
                report = &mut self.invalid_rx, if diagnostics_open => {
                    match report {
                        Ok(line) => {
                            tracing::warn!("Error detected: invalid arguments. Restarting recording.");
                            self.kill().await;
                            return Err(RecordingError::InvalidStreamArgs(line));
                        }
                        // stderr closed without a report
                        Err(_) => diagnostics_open = false,
                    }
                }
                _ = ticker.tick() => {
                    let current = self.clock.current_hour();
                    if self.session.is_rolled_over(&current) {
                        self.sweeper.sweep().await;
                        tracing::info!("New hour detected ({}): stopping current recording", current);
                        self.terminate().await;
                        return Ok(RunOutcome::Rotated);
                    }
                }
                _ = cancel.cancelled() => {
                    tracing::info!("Stopping recording of {}", self.session.stream.name);
                    self.terminate().await;
                    return Ok(RunOutcome::Cancelled);
                }
            }
        }
    }

    /// Wait for the stderr reader to reach end of file once the process is gone
    async fn drain_diagnostics(&mut self) {
        let Some(task) = self.diagnostics.take() else {
            return;
        };
        match tokio::time::timeout(self.stop_grace, task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!("Diagnostics reader ended abnormally: {}", e),
            // stderr is still held open by a descendant of the capture process
            Err(_) => tracing::debug!("Diagnostics still open after capture process exited"),
        }
    }

    /// Ask the process to stop, escalating to a kill after the grace period
    async fn terminate(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pid) = self.child.id() {
                // SAFETY: `pid` is our own child and has not been reaped yet
                let sent = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) } == 0;
                if sent {
                    match tokio::time::timeout(self.stop_grace, self.child.wait()).await {
                        Ok(Ok(status)) => {
                            tracing::debug!("Capture process stopped ({})", status);
                            return;
                        }
                        Ok(Err(e)) => tracing::warn!("Waiting for capture process failed: {}", e),
                        Err(_) => tracing::warn!(
                            "Capture process ignored SIGTERM for {:?}, killing it",
                            self.stop_grace
                        ),
                    }
                }
            }
        }

        self.kill().await;
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::debug!("Kill of capture process skipped: {}", e);
        }
    }
}

/// Drain the capture process's stderr, reporting the first invalid-argument line
async fn watch_diagnostics(
    stderr: ChildStderr,
    stream: String,
    invalid_tx: oneshot::Sender<String>,
) {
    let mut reader = BufReader::new(stderr);
    let mut invalid_tx = Some(invalid_tx);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end();
                tracing::debug!(stream = %stream, "capture: {}", line);

                if line.contains(INVALID_ARGUMENT_MARKER) {
                    if let Some(tx) = invalid_tx.take() {
                        let _ = tx.send(line.to_string());
                    }
                }
            }
            Err(e) => {
                tracing::debug!(stream = %stream, "stderr of capture process closed: {}", e);
                break;
            }
        }
    }
}
