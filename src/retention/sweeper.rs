//! Retention sweeper
//!
//! Deletes regular files in the recordings directory once their modification
//! time is at least [`RETENTION_WINDOW`] old. Sweeping is best-effort: a
//! failure on one entry is logged and the remaining entries are still visited.

use crate::clock::Clock;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Maximum age a recording may reach before it is deleted
pub const RETENTION_WINDOW: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Whether a file modified at `modified` has outlived `window` at `now`.
///
/// A modification time in the future is treated as fresh.
pub fn is_expired(now: SystemTime, modified: SystemTime, window: Duration) -> bool {
    now.duration_since(modified)
        .map(|age| age >= window)
        .unwrap_or(false)
}

/// Outcome of a single sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Regular files inspected
    pub scanned: usize,
    /// Files deleted
    pub deleted: usize,
    /// Entries that could not be read or deleted
    pub failed: usize,
}

/// Scans one directory and evicts expired recordings
pub struct RetentionSweeper {
    directory: PathBuf,
    window: Duration,
    clock: Arc<dyn Clock>,
    runs: AtomicU64,
}

impl RetentionSweeper {
    /// Create a sweeper for `directory` using the default retention window
    pub fn new(directory: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            directory: directory.into(),
            window: RETENTION_WINDOW,
            clock,
            runs: AtomicU64::new(0),
        }
    }

    /// Override the retention window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Number of sweeps started so far
    pub fn runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Whether `modified` is past the retention window according to this sweeper's clock
    pub fn is_expired(&self, modified: SystemTime) -> bool {
        is_expired(SystemTime::from(self.clock.now()), modified, self.window)
    }

    /// Delete every regular file in the directory whose age reached the window
    pub async fn sweep(&self) -> SweepReport {
        self.runs.fetch_add(1, Ordering::Relaxed);
        let mut report = SweepReport::default();

        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(
                    "Error reading recordings directory {:?}: {}",
                    self.directory,
                    e
                );
                report.failed += 1;
                return report;
            }
        };

        let now = SystemTime::from(self.clock.now());

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Error listing {:?}: {}", self.directory, e);
                    report.failed += 1;
                    break;
                }
            };

            let path = entry.path();

            // Does not follow symlinks, so only real files are eligible
            let metadata = match entry.metadata().await {
                Ok(metadata) => metadata,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!("Unable to stat {:?}: {}", path, e);
                    report.failed += 1;
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }
            report.scanned += 1;

            let modified = match metadata.modified() {
                Ok(modified) => modified,
                Err(e) => {
                    tracing::warn!("No modification time for {:?}: {}", path, e);
                    report.failed += 1;
                    continue;
                }
            };

            if !is_expired(now, modified, self.window) {
                continue;
            }

            match fs::remove_file(&path).await {
                Ok(()) => {
                    tracing::info!("Deleted old file: {:?}", path);
                    report.deleted += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!("{:?} vanished before it could be deleted", path);
                }
                Err(e) => {
                    tracing::error!("Error deleting old file {:?}: {}", path, e);
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            "Sweep of {:?} finished: {} scanned, {} deleted, {} failed",
            self.directory,
            report.scanned,
            report.deleted,
            report.failed
        );

        report
    }

    /// Sweep immediately, then every `interval` until `cancel` fires
    pub async fn run_periodic(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep().await;
                }
                _ = cancel.cancelled() => {
                    tracing::debug!("Periodic sweeper shutting down");
                    break;
                }
            }
        }
    }
}
