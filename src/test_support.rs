//! Test doubles shared by unit tests

use crate::capture::{CaptureBackend, CaptureCommand, MediaContainer};
use crate::clock::Clock;
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use parking_lot::Mutex;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Tz>>,
}

impl ManualClock {
    pub fn at(time: DateTime<Tz>) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(time),
        })
    }

    /// 2024-01-01 was a Monday
    pub fn monday_at(hour: u32, min: u32, sec: u32) -> Arc<Self> {
        Self::at(monday(hour, min, sec))
    }

    pub fn set(&self, time: DateTime<Tz>) {
        *self.now.lock() = time;
    }

    pub fn set_monday(&self, hour: u32, min: u32, sec: u32) {
        self.set(monday(hour, min, sec));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Tz> {
        *self.now.lock()
    }
}

fn monday(hour: u32, min: u32, sec: u32) -> DateTime<Tz> {
    Tz::UTC
        .with_ymd_and_hms(2024, 1, 1, hour, min, sec)
        .single()
        .expect("valid test time")
}

/// Set the mtime of `path` to `age` before the clock's current time
pub fn age_file(path: &Path, clock: &ManualClock, age: Duration) {
    let file = File::options()
        .write(true)
        .open(path)
        .expect("open file to age");
    file.set_modified(SystemTime::from(clock.now()) - age)
        .expect("set mtime");
}

/// Capture backend running a shell snippet in place of the media engine
pub struct ScriptBackend {
    script: String,
}

impl ScriptBackend {
    pub fn new(script: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            script: script.into(),
        })
    }

    /// Emits `chunk` every 50ms until stopped
    pub fn streaming(chunk: &str) -> Arc<Self> {
        Self::new(format!(
            "while :; do printf '{}'; sleep 0.05; done",
            chunk
        ))
    }
}

impl CaptureBackend for ScriptBackend {
    fn name(&self) -> &str {
        "script"
    }

    fn command(&self, _url: &str, _container: MediaContainer) -> CaptureCommand {
        CaptureCommand {
            program: "sh".into(),
            args: vec!["-c".into(), self.script.clone()],
        }
    }
}

/// Backend whose program does not exist
pub struct MissingBackend;

impl CaptureBackend for MissingBackend {
    fn name(&self) -> &str {
        "missing"
    }

    fn command(&self, _url: &str, _container: MediaContainer) -> CaptureCommand {
        CaptureCommand {
            program: "/nonexistent/stream-recorder-capture".into(),
            args: vec![],
        }
    }
}

/// Streams normally except for one URL, whose program cannot be launched
pub struct FailingUrlBackend {
    failing_url: String,
    healthy: Arc<ScriptBackend>,
}

impl FailingUrlBackend {
    pub fn new(failing_url: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            failing_url: failing_url.into(),
            healthy: ScriptBackend::streaming("a"),
        })
    }
}

impl CaptureBackend for FailingUrlBackend {
    fn name(&self) -> &str {
        "failing-url"
    }

    fn command(&self, url: &str, container: MediaContainer) -> CaptureCommand {
        if url == self.failing_url {
            MissingBackend.command(url, container)
        } else {
            self.healthy.command(url, container)
        }
    }
}

/// Poll `cond` every 10ms until it holds or `timeout` elapses
pub async fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
