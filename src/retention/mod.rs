//! Retention of recorded files
//!
//! Recordings older than the retention window are evicted by the sweeper,
//! both right before each hour rollover and on a periodic safety-net timer.

pub mod sweeper;

pub use sweeper::{is_expired, RetentionSweeper, SweepReport, RETENTION_WINDOW};
