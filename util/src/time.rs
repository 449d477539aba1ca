//! General time utility functions
//!
//! All times handled by the control software are `f64` seconds since the UNIX epoch, matching the
//! `timestamp_sec` field of message headers. Code that needs the current time should take a
//! [`Clock`] rather than reading the system time directly so that it can be driven by a
//! [`SimClock`] in tests.

use chrono::{self, Utc};
use std::sync::{Arc, Mutex, PoisonError};

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of the current time.
pub trait Clock {
    /// Current time in seconds since the UNIX epoch.
    fn now_s(&self) -> f64;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Clock backed by the system's wall clock.
#[derive(Debug, Default, Copy, Clone)]
pub struct WallClock;

/// A manually driven clock.
///
/// Clones share the same time, so a test can keep one handle and advance the time seen by the
/// component which owns the other.
#[derive(Debug, Default, Clone)]
pub struct SimClock {
    now_s: Arc<Mutex<f64>>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Clock for WallClock {
    fn now_s(&self) -> f64 {
        let now = Utc::now();
        now.timestamp() as f64 + now.timestamp_subsec_nanos() as f64 / NANOS_PER_SECOND as f64
    }
}

impl SimClock {
    /// Create a new clock starting at the given time.
    pub fn new(start_s: f64) -> Self {
        Self {
            now_s: Arc::new(Mutex::new(start_s))
        }
    }

    /// Set the current time.
    pub fn set(&self, now_s: f64) {
        *self.now_s.lock().unwrap_or_else(PoisonError::into_inner) = now_s;
    }

    /// Move the current time forward by `dt_s` seconds.
    pub fn advance(&self, dt_s: f64) {
        *self.now_s.lock().unwrap_or_else(PoisonError::into_inner) += dt_s;
    }
}

impl Clock for SimClock {
    fn now_s(&self) -> f64 {
        *self.now_s.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}
