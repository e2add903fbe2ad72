//! Wall-clock time source
//!
//! Every time-dependent decision (file naming, hour rollover, retention age)
//! reads the clock through the [`Clock`] trait so it can be replaced in tests.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Source of the current wall-clock time in the configured timezone
pub trait Clock: Send + Sync {
    /// Current time in the configured timezone
    fn now(&self) -> DateTime<Tz>;

    /// Two-digit hour of `now()`, e.g. "07"
    fn current_hour(&self) -> String {
        hour_key(&self.now())
    }
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }
}

/// Two-digit hour used in file names and rollover checks
pub fn hour_key(time: &DateTime<Tz>) -> String {
    time.format("%H").to_string()
}

/// Lowercase English weekday name, e.g. "monday"
pub fn day_key(time: &DateTime<Tz>) -> String {
    time.format("%A").to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_keys_use_configured_timezone() {
        // 2024-01-01 23:30 UTC is already Tuesday 00:30 in Madrid
        let utc = Utc.with_ymd_and_hms(2024, 1, 1, 23, 30, 0).unwrap();
        let madrid = utc.with_timezone(&chrono_tz::Europe::Madrid);

        assert_eq!(hour_key(&madrid), "00");
        assert_eq!(day_key(&madrid), "tuesday");
    }

    #[test]
    fn test_hour_key_is_zero_padded() {
        let time = Tz::UTC.with_ymd_and_hms(2024, 1, 1, 7, 5, 0).unwrap();
        assert_eq!(hour_key(&time), "07");
        assert_eq!(day_key(&time), "monday");
    }

    #[test]
    fn test_system_clock_reports_its_timezone() {
        let clock = SystemClock::new(chrono_tz::America::New_York);
        assert_eq!(clock.now().timezone(), chrono_tz::America::New_York);
        assert_eq!(clock.current_hour().len(), 2);
    }
}
