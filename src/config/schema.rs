//! Configuration schema
//!
//! The on-disk format is a JSON object with upper-case keys (`STREAMS`,
//! `TIMEZONE`, `PORT`, `RECORDING_FOLDER`, ...). Lower-case aliases are
//! accepted as well.

use super::ConfigError;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{PathBuf, MAIN_SEPARATOR};
use std::time::Duration;

/// Default folder for recordings, relative to the config file
pub const DEFAULT_RECORDING_FOLDER: &str = "recordings";

/// Default interval of the safety-net retention sweep
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 3600;

/// A configured live stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Unique, human-readable name
    pub name: String,
    /// Network locator handed to the capture process
    pub url: String,
}

impl StreamConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// File name prefix: every space becomes a dash
    pub fn slug(&self) -> String {
        self.name.replace(' ', "-")
    }
}

/// Configuration file as written by the user
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    #[serde(rename = "STREAMS", alias = "streams", default)]
    pub streams: Option<Vec<StreamConfig>>,

    #[serde(rename = "TIMEZONE", alias = "timezone", default)]
    pub timezone: Option<String>,

    #[serde(rename = "PORT", alias = "port", default)]
    pub port: Option<u16>,

    #[serde(rename = "RECORDING_FOLDER", alias = "recording_folder", default)]
    pub recording_folder: Option<PathBuf>,

    #[serde(rename = "CAPTURE_PROGRAM", alias = "capture_program", default)]
    pub capture_program: Option<PathBuf>,

    #[serde(rename = "SWEEP_INTERVAL_SECS", alias = "sweep_interval_secs", default)]
    pub sweep_interval_secs: Option<u64>,
}

/// Validated, resolved application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub streams: Vec<StreamConfig>,
    pub timezone: Tz,
    /// Liveness listener port; no listener when absent
    pub port: Option<u16>,
    /// Absolute or config-relative-resolved output directory
    pub recording_dir: PathBuf,
    pub capture_program: PathBuf,
    pub sweep_interval: Duration,
}

/// Parse an IANA timezone identifier
pub fn parse_timezone(name: &str) -> Result<Tz, ConfigError> {
    name.parse::<Tz>()
        .map_err(|_| ConfigError::UnknownTimezone(name.to_string()))
}

/// Check that the stream list can be recorded without two writers sharing a file
pub fn validate_streams(streams: &[StreamConfig]) -> Result<(), ConfigError> {
    if streams.is_empty() {
        return Err(ConfigError::NoStreams);
    }

    let mut slugs: HashMap<String, &str> = HashMap::new();

    for stream in streams {
        if stream.name.trim().is_empty() {
            return Err(ConfigError::InvalidStream {
                name: stream.name.clone(),
                reason: "name is empty".to_string(),
            });
        }
        if stream.name.contains('/') || stream.name.contains(MAIN_SEPARATOR) {
            return Err(ConfigError::InvalidStream {
                name: stream.name.clone(),
                reason: "name contains a path separator".to_string(),
            });
        }
        if stream.url.trim().is_empty() {
            return Err(ConfigError::InvalidStream {
                name: stream.name.clone(),
                reason: "url is empty".to_string(),
            });
        }

        let slug = stream.slug();
        if let Some(first) = slugs.insert(slug.clone(), &stream.name) {
            return Err(ConfigError::DuplicateStream {
                first: first.to_string(),
                second: stream.name.clone(),
                slug,
            });
        }
    }

    Ok(())
}
