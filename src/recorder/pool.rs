//! Supervisor pool
//!
//! Launches one independent [`StreamSupervisor`] per configured stream and
//! owns their tasks until shutdown.

use super::state::StreamStatus;
use super::supervisor::StreamSupervisor;
use super::unit::RecordingUnit;
use crate::config::{validate_streams, ConfigError, StreamConfig};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Read-only view of every stream's status
#[derive(Clone, Default)]
pub struct StatusBoard {
    cells: Arc<Vec<Arc<RwLock<StreamStatus>>>>,
}

impl StatusBoard {
    /// Copy of the current statuses, in configuration order
    pub fn snapshot(&self) -> Vec<StreamStatus> {
        self.cells.iter().map(|cell| cell.read().clone()).collect()
    }
}

struct SupervisorHandle {
    name: String,
    task: JoinHandle<()>,
}

/// Running supervisors, one per stream
pub struct SupervisorPool {
    cancel: CancellationToken,
    supervisors: Vec<SupervisorHandle>,
    board: StatusBoard,
}

impl SupervisorPool {
    /// Validate `streams` and start supervising each of them.
    ///
    /// Fails only when the configuration itself cannot be recorded; once started,
    /// supervisors never report errors back to the pool.
    pub async fn start(
        streams: &[StreamConfig],
        unit: Arc<RecordingUnit>,
        cooldown: Duration,
        cancel: CancellationToken,
    ) -> Result<Self, ConfigError> {
        validate_streams(streams)?;

        let output_dir = unit.output_dir().to_path_buf();
        tokio::fs::create_dir_all(&output_dir)
            .await
            .map_err(|e| ConfigError::OutputDir {
                path: output_dir.clone(),
                source: e,
            })?;

        let mut supervisors = Vec::with_capacity(streams.len());
        let mut cells = Vec::with_capacity(streams.len());

        for stream in streams {
            let supervisor =
                StreamSupervisor::new(stream.clone(), unit.clone()).with_cooldown(cooldown);
            cells.push(supervisor.status());

            let task = tokio::spawn(supervisor.supervise_forever(cancel.child_token()));
            supervisors.push(SupervisorHandle {
                name: stream.name.clone(),
                task,
            });
        }

        tracing::info!(
            "Supervising {} stream(s), recording into {:?}",
            supervisors.len(),
            output_dir
        );

        Ok(Self {
            cancel,
            supervisors,
            board: StatusBoard {
                cells: Arc::new(cells),
            },
        })
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    pub fn status_board(&self) -> StatusBoard {
        self.board.clone()
    }

    pub fn statuses(&self) -> Vec<StreamStatus> {
        self.board.snapshot()
    }

    /// Stop every supervisor and wait for their capture processes to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();

        for handle in self.supervisors {
            if let Err(e) = handle.task.await {
                tracing::error!("Supervisor for {} ended abnormally: {}", handle.name, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::CaptureBackend;
    use crate::clock::Clock;
    use crate::recorder::RecordingState;
    use crate::retention::RetentionSweeper;
    use crate::test_support::{wait_until, FailingUrlBackend, ManualClock, ScriptBackend};
    use std::path::Path;

    const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    fn unit(
        dir: &Path,
        clock: &Arc<ManualClock>,
        backend: Arc<dyn CaptureBackend>,
    ) -> Arc<RecordingUnit> {
        let clock: Arc<dyn Clock> = clock.clone();
        let sweeper = Arc::new(RetentionSweeper::new(dir, clock.clone()));
        Arc::new(
            RecordingUnit::new(dir, clock, backend, sweeper)
                .with_poll_interval(Duration::from_millis(20))
                .with_stop_grace(Duration::from_secs(2)),
        )
    }

    #[tokio::test]
    async fn test_empty_stream_list_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::monday_at(8, 0, 0);
        let result = SupervisorPool::start(
            &[],
            unit(dir.path(), &clock, ScriptBackend::streaming("a")),
            Duration::from_millis(20),
            CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(ConfigError::NoStreams)));
    }

    #[tokio::test]
    async fn test_colliding_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::monday_at(8, 0, 0);
        let streams = vec![
            StreamConfig::new("Radio One", "http://a/live.m3u8"),
            StreamConfig::new("Radio-One", "http://b/live.m3u8"),
        ];
        let result = SupervisorPool::start(
            &streams,
            unit(dir.path(), &clock, ScriptBackend::streaming("a")),
            Duration::from_millis(20),
            CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(ConfigError::DuplicateStream { .. })));
    }

    #[tokio::test]
    async fn test_creates_output_directory_and_records_each_stream() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("recordings");
        let clock = ManualClock::monday_at(8, 15, 0);
        let streams = vec![
            StreamConfig::new("Radio One", "http://a/live.m3u8"),
            StreamConfig::new("Jazz FM", "http://b/jazz.mp3"),
        ];

        let pool = SupervisorPool::start(
            &streams,
            unit(&dir, &clock, ScriptBackend::streaming("a")),
            Duration::from_millis(20),
            CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(pool.len(), 2);

        let one = dir.join("Radio-One-monday-08h.aac");
        let jazz = dir.join("Jazz-FM-monday-08h.mp3");
        assert!(wait_until(TEST_TIMEOUT, || one.exists() && jazz.exists()).await);
        assert!(
            wait_until(TEST_TIMEOUT, || pool
                .statuses()
                .iter()
                .all(|s| s.state == RecordingState::Capturing))
            .await
        );

        let board = pool.status_board();
        tokio::time::timeout(TEST_TIMEOUT, pool.shutdown()).await.unwrap();
        assert!(board
            .snapshot()
            .iter()
            .all(|s| s.state == RecordingState::Stopped));
    }

    #[tokio::test]
    async fn test_uncreatable_output_directory_is_fatal() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let clock = ManualClock::monday_at(8, 0, 0);

        let result = SupervisorPool::start(
            &[StreamConfig::new("Radio One", "http://a/live.m3u8")],
            unit(&blocker.join("recordings"), &clock, ScriptBackend::streaming("a")),
            Duration::from_millis(20),
            CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(ConfigError::OutputDir { .. })));
    }

    #[tokio::test]
    async fn test_failing_stream_does_not_affect_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::monday_at(8, 15, 0);
        let backend = FailingUrlBackend::new("http://b/broken.m3u8");
        let streams = vec![
            StreamConfig::new("Good", "http://a/live.m3u8"),
            StreamConfig::new("Bad", "http://b/broken.m3u8"),
        ];

        let pool = SupervisorPool::start(
            &streams,
            unit(dir.path(), &clock, backend),
            Duration::from_millis(20),
            CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(
            wait_until(TEST_TIMEOUT, || {
                let statuses = pool.statuses();
                statuses[0].state == RecordingState::Capturing && statuses[1].failures >= 3
            })
            .await
        );
        let statuses = pool.statuses();
        let good = &statuses[0];
        assert_eq!(good.name, "Good");
        assert_eq!(good.failures, 0);
        assert_eq!(good.attempts, 1);

        tokio::time::timeout(TEST_TIMEOUT, pool.shutdown()).await.unwrap();
    }
}
