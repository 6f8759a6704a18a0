// ABOUTME: Cancellable flush and retry timers keyed by session and purpose
// ABOUTME: Each timer is a tokio task delivering an event to the coordinator channel
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use dashmap::DashMap;
use ruck_core::models::SessionId;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::trace;

/// Purpose of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Periodic location flush
    LocationFlush,
    /// Periodic heart-rate flush
    HeartRateFlush,
    /// One-shot location retry after backoff
    LocationRetry,
    /// One-shot heart-rate retry after backoff
    HeartRateRetry,
}

type TimerKey = (SessionId, TimerKind);

/// Registry of running timers; scheduling a key replaces its previous timer
#[derive(Debug, Default)]
pub struct TimerRegistry {
    timers: DashMap<TimerKey, AbortHandle>,
}

impl TimerRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn install(&self, key: TimerKey, handle: AbortHandle) {
        if let Some(previous) = self.timers.insert(key, handle) {
            previous.abort();
        }
    }

    /// Deliver `make_event()` every `period`, first after one full period
    ///
    /// The timer holds a weak sender and ends once every strong sender is gone.
    pub fn schedule_every<E, F>(
        &self,
        session_id: &SessionId,
        kind: TimerKind,
        period: Duration,
        tx: mpsc::WeakSender<E>,
        make_event: F,
    ) where
        E: Send + 'static,
        F: Fn() -> E + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(tx) = tx.upgrade() else {
                    break;
                };
                if tx.send(make_event()).await.is_err() {
                    break;
                }
            }
        });
        trace!(session_id = %session_id, ?kind, ?period, "Scheduled periodic timer");
        self.install((session_id.clone(), kind), task.abort_handle());
    }

    /// Deliver `event` once after `delay`
    pub fn schedule_once<E>(
        &self,
        session_id: &SessionId,
        kind: TimerKind,
        delay: Duration,
        tx: mpsc::WeakSender<E>,
        event: E,
    ) where
        E: Send + 'static,
    {
        let task = tokio::spawn(async move {
            sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(event).await;
            }
        });
        trace!(session_id = %session_id, ?kind, ?delay, "Scheduled one-shot timer");
        self.install((session_id.clone(), kind), task.abort_handle());
    }

    /// Cancel one timer; returns whether it existed
    pub fn cancel(&self, session_id: &SessionId, kind: TimerKind) -> bool {
        self.timers
            .remove(&(session_id.clone(), kind))
            .map(|(_, handle)| handle.abort())
            .is_some()
    }

    /// Cancel every timer of a session; returns how many were cancelled
    pub fn cancel_session(&self, session_id: &SessionId) -> usize {
        let keys: Vec<TimerKey> = self
            .timers
            .iter()
            .filter(|entry| &entry.key().0 == session_id)
            .map(|entry| entry.key().clone())
            .collect();
        keys.into_iter()
            .filter_map(|key| self.timers.remove(&key))
            .map(|(_, handle)| handle.abort())
            .count()
    }

    /// Whether a timer of `kind` is registered for the session
    #[must_use]
    pub fn is_scheduled(&self, session_id: &SessionId, kind: TimerKind) -> bool {
        self.timers.contains_key(&(session_id.clone(), kind))
    }

    /// Number of registered timers
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether no timer is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Drop for TimerRegistry {
    fn drop(&mut self) {
        for entry in self.timers.iter() {
            entry.value().abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_periodic_timer_ticks_after_full_period() {
        let registry = TimerRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        let id = SessionId::from("s-1");
        registry.schedule_every(&id, TimerKind::LocationFlush, Duration::from_secs(30), tx.downgrade(), || 1_u8);

        sleep(Duration::from_secs(29)).await;
        assert!(rx.try_recv().is_err());
        sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.recv().await, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_replaces_previous_timer() {
        let registry = TimerRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        let id = SessionId::from("s-1");
        registry.schedule_once(&id, TimerKind::LocationRetry, Duration::from_secs(5), tx.downgrade(), "old");
        registry.schedule_once(&id, TimerKind::LocationRetry, Duration::from_secs(10), tx.downgrade(), "new");
        assert_eq!(registry.len(), 1);

        sleep(Duration::from_secs(11)).await;
        assert_eq!(rx.recv().await, Some("new"));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_session_stops_all_timers() {
        let registry = TimerRegistry::new();
        let (tx, mut rx) = mpsc::channel(8);
        let id = SessionId::from("s-1");
        let other = SessionId::from("s-2");
        registry.schedule_every(&id, TimerKind::LocationFlush, Duration::from_secs(1), tx.downgrade(), || 1_u8);
        registry.schedule_once(&id, TimerKind::HeartRateRetry, Duration::from_secs(1), tx.downgrade(), 2);
        registry.schedule_once(&other, TimerKind::HeartRateRetry, Duration::from_secs(100), tx.downgrade(), 3);

        assert_eq!(registry.cancel_session(&id), 2);
        assert!(registry.is_scheduled(&other, TimerKind::HeartRateRetry));

        sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
        drop(tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_ends_when_senders_dropped() {
        let registry = TimerRegistry::new();
        let (tx, mut rx) = mpsc::channel::<u8>(8);
        let id = SessionId::from("s-1");
        registry.schedule_every(&id, TimerKind::HeartRateFlush, Duration::from_secs(1), tx.downgrade(), || 1);
        drop(tx);

        sleep(Duration::from_secs(3)).await;
        assert_eq!(rx.recv().await, None);
    }
}
