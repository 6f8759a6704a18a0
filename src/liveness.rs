// ABOUTME: Coordinator liveness tracking from heartbeats stamped by the event loop
// ABOUTME: Reports Alive, Stalled with the last beat, or Stopped once the task has exited
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Liveness
//!
//! The coordinator stamps a [`Heartbeat`] for every processed event and timer
//! tick. A [`LivenessMonitor`] compares the age of the last stamp against a
//! threshold. While the coordinator is not expecting ticks (paused, or waiting
//! for an explicit sync retry) silence is normal and is not reported as a stall.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Health of a coordinator task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessStatus {
    /// Heartbeat is fresh, or the coordinator is idle by design
    Alive,
    /// No heartbeat since `since` although ticks were expected
    Stalled {
        /// Time of the last heartbeat
        since: Instant,
    },
    /// The coordinator task has exited
    Stopped,
}

#[derive(Debug)]
struct HeartbeatState {
    last_beat: Mutex<Instant>,
    expecting_ticks: AtomicBool,
    stopped: AtomicBool,
}

/// Shared heartbeat written by the coordinator
#[derive(Debug, Clone)]
pub struct Heartbeat {
    state: Arc<HeartbeatState>,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self::new()
    }
}

impl Heartbeat {
    /// Fresh heartbeat stamped now, expecting ticks
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(HeartbeatState {
                last_beat: Mutex::new(Instant::now()),
                expecting_ticks: AtomicBool::new(true),
                stopped: AtomicBool::new(false),
            }),
        }
    }

    /// Stamp the current time
    pub fn beat(&self) {
        *self
            .state
            .last_beat
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Whether periodic ticks should keep arriving
    pub fn set_expecting_ticks(&self, expecting: bool) {
        self.state.expecting_ticks.store(expecting, Ordering::Release);
    }

    /// Mark the owning task as finished
    pub fn stop(&self) {
        self.state.stopped.store(true, Ordering::Release);
    }

    /// Guard that marks the heartbeat stopped when dropped, including on panic
    #[must_use]
    pub fn stop_on_drop(&self) -> StopGuard {
        StopGuard {
            heartbeat: self.clone(),
        }
    }

    fn last_beat(&self) -> Instant {
        *self
            .state
            .last_beat
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks a [`Heartbeat`] stopped on drop
#[derive(Debug)]
pub struct StopGuard {
    heartbeat: Heartbeat,
}

impl Drop for StopGuard {
    fn drop(&mut self) {
        self.heartbeat.stop();
    }
}

/// Read side of a coordinator heartbeat
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    heartbeat: Heartbeat,
    stale_after: Duration,
}

impl LivenessMonitor {
    /// Monitor flagging heartbeats older than `stale_after`
    #[must_use]
    pub const fn new(heartbeat: Heartbeat, stale_after: Duration) -> Self {
        Self {
            heartbeat,
            stale_after,
        }
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> LivenessStatus {
        let state = &self.heartbeat.state;
        if state.stopped.load(Ordering::Acquire) {
            return LivenessStatus::Stopped;
        }
        if !state.expecting_ticks.load(Ordering::Acquire) {
            return LivenessStatus::Alive;
        }
        let since = self.heartbeat.last_beat();
        if since.elapsed() > self.stale_after {
            LivenessStatus::Stalled { since }
        } else {
            LivenessStatus::Alive
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::advance;

    #[tokio::test(start_paused = true)]
    async fn test_stale_heartbeat_reported() {
        let heartbeat = Heartbeat::new();
        let monitor = LivenessMonitor::new(heartbeat.clone(), Duration::from_secs(120));
        assert_eq!(monitor.status(), LivenessStatus::Alive);

        advance(Duration::from_secs(121)).await;
        assert!(matches!(monitor.status(), LivenessStatus::Stalled { .. }));

        heartbeat.beat();
        assert_eq!(monitor.status(), LivenessStatus::Alive);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_coordinator_not_stalled() {
        let heartbeat = Heartbeat::new();
        let monitor = LivenessMonitor::new(heartbeat.clone(), Duration::from_secs(10));
        heartbeat.set_expecting_ticks(false);
        advance(Duration::from_secs(60)).await;
        assert_eq!(monitor.status(), LivenessStatus::Alive);
    }

    #[test]
    fn test_guard_marks_stopped() {
        let heartbeat = Heartbeat::new();
        let monitor = LivenessMonitor::new(heartbeat.clone(), Duration::from_secs(10));
        drop(heartbeat.stop_on_drop());
        assert_eq!(monitor.status(), LivenessStatus::Stopped);
    }
}
