//! Time sources for message-control fields.
//!
//! Header timestamps, control IDs and fallback accessions are derived from "now". Encoders
//! take a [`Clock`] at construction so that output is reproducible under a [`FixedClock`].

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    /// Returns the current instant with the offset of the sending site.
    ///
    /// Wall-clock fields use [`DateTime::naive_local`]; epoch fields use
    /// [`DateTime::timestamp_millis`].
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Reads the host's local time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

/// Always returns the same instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedClock(DateTime<FixedOffset>);

impl FixedClock {
    pub fn new(instant: DateTime<FixedOffset>) -> Self {
        Self(instant)
    }

    /// Freezes the clock at a wall-clock time, interpreted as UTC.
    pub fn at(local: NaiveDateTime) -> Self {
        Self(local.and_utc().fixed_offset())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
