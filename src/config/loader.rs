//! Config file loading and resolution.

use super::schema::{
    parse_timezone, validate_streams, AppConfig, RawConfig, DEFAULT_RECORDING_FOLDER,
    DEFAULT_SWEEP_INTERVAL_SECS,
};
use super::ConfigError;
use crate::capture::ffmpeg::DEFAULT_FFMPEG;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Load and validate the configuration at `path`
pub fn load_from_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let raw = parse_json(&contents, path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    resolve(raw, base_dir)
}

/// Parse config from a JSON string
fn parse_json(contents: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Apply defaults, resolve relative paths against `base_dir` and validate
pub fn resolve(raw: RawConfig, base_dir: &Path) -> Result<AppConfig, ConfigError> {
    let streams = raw.streams.unwrap_or_default();
    validate_streams(&streams)?;

    let timezone = match raw.timezone.as_deref() {
        Some(name) => parse_timezone(name)?,
        None => Tz::UTC,
    };

    let folder = raw
        .recording_folder
        .unwrap_or_else(|| PathBuf::from(DEFAULT_RECORDING_FOLDER));
    let recording_dir = if folder.is_absolute() {
        folder
    } else {
        base_dir.join(folder)
    };

    let sweep_secs = raw
        .sweep_interval_secs
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);

    Ok(AppConfig {
        streams,
        timezone,
        port: raw.port,
        recording_dir,
        capture_program: raw
            .capture_program
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG)),
        sweep_interval: Duration::from_secs(sweep_secs),
    })
}
