//! Logging setup
//!
//! Log lines carry a `YYYY-MM-DD HH:MM:SS` timestamp in the configured
//! timezone, matching the file names the recorder produces.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use std::fmt;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "stream_recorder_lib=info,stream_recorder=info";

/// Formats event timestamps in a fixed timezone
#[derive(Debug, Clone, Copy)]
pub struct ZonedTimer {
    timezone: Tz,
}

impl ZonedTimer {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl FormatTime for ZonedTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", format_timestamp(Utc::now(), self.timezone))
    }
}

/// Render `time` in `timezone` as `YYYY-MM-DD HH:MM:SS`
pub fn format_timestamp(time: DateTime<Utc>, timezone: Tz) -> String {
    time.with_timezone(&timezone)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Install the global subscriber. Timestamps are UTC until a timezone is known.
pub fn init(timezone: Option<Tz>) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(ZonedTimer::new(timezone.unwrap_or(Tz::UTC))),
        )
        .init();
}
