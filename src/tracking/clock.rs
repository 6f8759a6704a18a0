// ABOUTME: Wall-clock abstraction so session durations can be driven by tests
// ABOUTME: SystemClock reads Utc::now; ManualClock only moves when advanced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use chrono::{DateTime, Duration, Utc};
use std::fmt::Debug;
use std::sync::{Arc, Mutex, PoisonError};

/// Source of wall-clock time for session timestamps
pub trait Clock: Send + Sync + Debug {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// System time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Clock frozen at `start`
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }

    /// Move the clock to `instant`; earlier instants are ignored
    pub fn advance_to(&self, instant: DateTime<Utc>) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        if instant > *now {
            *now = instant;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_never_goes_backwards() {
        let start = Utc::now();
        let clock = ManualClock::new(start);
        clock.advance(Duration::seconds(30));
        clock.advance_to(start);
        assert_eq!(clock.now(), start + Duration::seconds(30));

        let shared = clock.clone();
        shared.advance_to(start + Duration::minutes(5));
        assert_eq!(clock.now(), start + Duration::minutes(5));
    }
}
