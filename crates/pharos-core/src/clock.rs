//! Creation-timestamp sources.
//!
//! `created_at` is part of every record's hash input, so the clock decides
//! whether two compiles of the same tree produce the same ids. Timestamps
//! are whole seconds since the Unix epoch.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of `created_at` values.
pub trait Clock: std::fmt::Debug {
    /// Current time in seconds since the Unix epoch.
    fn now(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock. Clones share the same reading, so a test can keep
/// one handle and advance the clock owned by a session.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    seconds: Arc<AtomicI64>,
}

impl ManualClock {
    #[must_use]
    pub fn new(seconds: i64) -> Self {
        Self {
            seconds: Arc::new(AtomicI64::new(seconds)),
        }
    }

    /// Move the clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        self.seconds.fetch_add(seconds, Ordering::Relaxed);
    }

    pub fn set(&self, seconds: i64) {
        self.seconds.store(seconds, Ordering::Relaxed);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.seconds.load(Ordering::Relaxed)
    }
}

/// Reads another clock but never reports less than `floor`.
#[derive(Debug, Clone, Copy)]
pub struct FloorClock<'a> {
    inner: &'a dyn Clock,
    floor: i64,
}

impl<'a> FloorClock<'a> {
    #[must_use]
    pub const fn new(inner: &'a dyn Clock, floor: i64) -> Self {
        Self { inner, floor }
    }
}

impl Clock for FloorClock<'_> {
    fn now(&self) -> i64 {
        self.inner.now().max(self.floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_clock_holds_back_a_lagging_reading() {
        let clock = ManualClock::new(100);
        let floored = FloorClock::new(&clock, 101);
        assert_eq!(floored.now(), 101);
        clock.advance(5);
        assert_eq!(floored.now(), 105);
    }

    #[test]
    fn manual_clock_clones_share_reading() {
        let clock = ManualClock::new(1_700_000_000);
        let handle = clock.clone();
        handle.advance(5);
        assert_eq!(clock.now(), 1_700_000_005);
        handle.set(42);
        assert_eq!(clock.now(), 42);
    }

    #[test]
    fn system_clock_is_in_seconds() {
        let now = SystemClock.now();
        // Seconds, not milliseconds: well below the year-3000 mark in seconds.
        assert!(now > 1_600_000_000);
        assert!(now < 32_503_680_000);
    }
}
