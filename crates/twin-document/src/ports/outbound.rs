//! Outbound Ports (Driven Ports)
//!
//! The only thing the twin core needs from the outside world is the time,
//! used for metadata stamps and `statusUpdatedTime`.

use chrono::{DateTime, Utc};

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Current UTC time as `yyyy-MM-ddTHH:mm:ss.SSSSZ`
    fn now(&self) -> String;
}

/// Format a UTC instant with four fractional digits.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    format!(
        "{}.{:04}Z",
        instant.format("%Y-%m-%dT%H:%M:%S"),
        instant.timestamp_subsec_micros() / 100
    )
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> String {
        format_timestamp(Utc::now())
    }
}

/// Time source that always reports the same instant.
#[derive(Debug, Clone)]
pub struct FixedTimeSource {
    timestamp: String,
}

impl FixedTimeSource {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
        }
    }
}

impl TimeSource for FixedTimeSource {
    fn now(&self) -> String {
        self.timestamp.clone()
    }
}
