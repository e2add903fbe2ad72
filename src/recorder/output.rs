//! Hourly output files
//!
//! A recording for stream `name` during hour `HH` of weekday `day` always
//! lands in `{name-with-dashes}-{day}-{HH}h{ext}`, so a run restarted within
//! the same hour finds and extends the file left by the previous one.

use super::error::{RecordingError, RecordingResult};
use super::state::FileDisposition;
use crate::capture::MediaContainer;
use crate::config::StreamConfig;
use crate::retention::is_expired;
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Output file of one `(stream, day, hour)` key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    path: PathBuf,
}

impl OutputFile {
    pub fn new(
        directory: &Path,
        stream: &StreamConfig,
        day: &str,
        hour: &str,
        container: MediaContainer,
    ) -> Self {
        Self {
            path: directory.join(Self::file_name(stream, day, hour, container)),
        }
    }

    /// `{slug}-{day}-{hour}h{ext}`
    pub fn file_name(
        stream: &StreamConfig,
        day: &str,
        hour: &str,
        container: MediaContainer,
    ) -> String {
        format!(
            "{}-{}-{}h{}",
            stream.slug(),
            day,
            hour,
            container.extension()
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file if it outlived `window`, otherwise leave it to be appended to
    pub async fn prepare(
        &self,
        now: SystemTime,
        window: Duration,
    ) -> RecordingResult<FileDisposition> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("Creating new file: {:?}", self.path);
                return Ok(FileDisposition::Created);
            }
            Err(e) => return Err(RecordingError::fs(&self.path, e)),
        };

        let modified = metadata
            .modified()
            .map_err(|e| RecordingError::fs(&self.path, e))?;

        if !is_expired(now, modified, window) {
            tracing::info!("Continuing recording in existing file: {:?}", self.path);
            return Ok(FileDisposition::Continued);
        }

        tracing::info!("Older than retention window: {:?}. Deleting...", self.path);
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(FileDisposition::Replaced),
            // Swept concurrently, same result
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileDisposition::Replaced),
            Err(e) => Err(RecordingError::fs(&self.path, e)),
        }
    }

    /// Open for appending, creating it if needed
    pub fn open_append(&self) -> RecordingResult<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| RecordingError::fs(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::RETENTION_WINDOW;
    use std::io::Write;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    fn radio_one() -> StreamConfig {
        StreamConfig::new("Radio One", "http://x/live.m3u8")
    }

    #[test]
    fn test_file_name_layout() {
        assert_eq!(
            OutputFile::file_name(&radio_one(), "monday", "14", MediaContainer::Aac),
            "Radio-One-monday-14h.aac"
        );
        assert_eq!(
            OutputFile::file_name(
                &StreamConfig::new("Talk", "http://x/talk.mp3"),
                "sunday",
                "00",
                MediaContainer::Mp3
            ),
            "Talk-sunday-00h.mp3"
        );
    }

    #[tokio::test]
    async fn test_prepare_dispositions() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputFile::new(dir.path(), &radio_one(), "monday", "14", MediaContainer::Aac);
        let now = SystemTime::now();

        assert_eq!(
            output.prepare(now, RETENTION_WINDOW).await.unwrap(),
            FileDisposition::Created
        );

        std::fs::write(output.path(), b"earlier").unwrap();
        assert_eq!(
            output.prepare(now, RETENTION_WINDOW).await.unwrap(),
            FileDisposition::Continued
        );
        assert!(output.path().exists());

        // Seen eight days later the same file has expired
        assert_eq!(
            output.prepare(now + 8 * DAY, RETENTION_WINDOW).await.unwrap(),
            FileDisposition::Replaced
        );
        assert!(!output.path().exists());
    }

    #[test]
    fn test_open_append_keeps_existing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputFile::new(dir.path(), &radio_one(), "monday", "14", MediaContainer::Aac);
        std::fs::write(output.path(), b"first-").unwrap();

        let mut file = output.open_append().unwrap();
        file.write_all(b"second").unwrap();
        drop(file);

        assert_eq!(std::fs::read(output.path()).unwrap(), b"first-second");
    }

    #[test]
    fn test_open_append_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = OutputFile::new(
            &dir.path().join("missing"),
            &radio_one(),
            "monday",
            "14",
            MediaContainer::Aac,
        );
        assert!(matches!(
            output.open_append(),
            Err(RecordingError::FileSystem { .. })
        ));
    }
}
