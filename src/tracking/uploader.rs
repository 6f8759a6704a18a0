// ABOUTME: Buffered batch uploader with size and time triggers, backoff, and offline handling
// ABOUTME: A failed batch is retried byte-identically; items leave the buffer only after success
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Batch Uploader
//!
//! Items queue in FIFO order. A flush freezes up to `batch_size` items from the
//! front into a [`Batch`] with a fresh id and keeps that batch as the pending
//! payload until the sink accepts it. Later attempts resend the same batch, so
//! the server sees one idempotency key per group of items no matter how many
//! retries it took.
//!
//! While offline no request is made. Coming back online clears the backoff
//! deadline so the caller can sync everything immediately.
//!
//! Requests are bounded by `batch_size`; the buffer itself is not. A long
//! offline stretch keeps every item until it is uploaded or discarded, and a
//! warning is logged each time the backlog grows by another
//! `BACKLOG_WARN_ITEMS`.

use async_trait::async_trait;
use ruck_api::{Batch, RuckApi};
use ruck_core::constants::sync::BACKLOG_WARN_ITEMS;
use ruck_core::errors::NetworkError;
use ruck_core::models::{HeartRateSample, LocationPoint, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::backoff::BackoffPolicy;

/// Destination for one kind of batched item
#[async_trait]
pub trait BatchSink<T>: Send + Sync {
    /// Upload one batch for the session
    async fn upload(&self, session_id: &SessionId, batch: &Batch<T>) -> Result<(), NetworkError>;
}

#[async_trait]
impl<A: RuckApi + ?Sized> BatchSink<LocationPoint> for A {
    async fn upload(
        &self,
        session_id: &SessionId,
        batch: &Batch<LocationPoint>,
    ) -> Result<(), NetworkError> {
        self.append_location_batch(session_id, batch).await
    }
}

#[async_trait]
impl<A: RuckApi + ?Sized> BatchSink<HeartRateSample> for A {
    async fn upload(
        &self,
        session_id: &SessionId,
        batch: &Batch<HeartRateSample>,
    ) -> Result<(), NetworkError> {
        self.append_heart_rate_batch(session_id, batch).await
    }
}

/// Upload progress as reported to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Nothing left to send
    Synced,
    /// Items waiting for the next attempt
    Pending,
    /// Items waiting for connectivity
    Offline,
}

impl SyncStatus {
    /// Combine the status of two uploaders, the least synced one wins
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Offline, _) | (_, Self::Offline) => Self::Offline,
            (Self::Pending, _) | (_, Self::Pending) => Self::Pending,
            _ => Self::Synced,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Synced => "synced",
            Self::Pending => "pending",
            Self::Offline => "offline",
        };
        f.write_str(name)
    }
}

/// Cadence and retry settings for one uploader
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploaderConfig {
    /// Items per request and size-trigger threshold
    pub batch_size: usize,
    /// Time trigger period
    pub flush_interval: Duration,
    /// Retry delays after failures
    pub backoff: BackoffPolicy,
}

/// Result of a single flush attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Buffer was empty
    Empty,
    /// Device is offline, no request made
    Offline,
    /// Backoff deadline not reached, no request made
    BackingOff {
        /// Time left before the next attempt is allowed
        retry_in: Duration,
    },
    /// Batch accepted and removed from the buffer
    Uploaded {
        /// Items removed
        items: usize,
    },
    /// Batch rejected, buffer unchanged
    Failed {
        /// Why the upload failed
        error: NetworkError,
        /// Delay before the next attempt
        retry_in: Duration,
    },
}

/// Result of flushing until the buffer is empty or an attempt stops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushSummary {
    /// Items uploaded across all batches
    pub uploaded: usize,
    /// Outcome of the last attempt
    pub last: FlushOutcome,
}

/// FIFO buffer uploaded in bounded, idempotent batches
#[derive(Debug)]
pub struct BatchUploader<T> {
    label: &'static str,
    session_id: SessionId,
    config: UploaderConfig,
    buffer: VecDeque<T>,
    pending: Option<Batch<T>>,
    online: bool,
    consecutive_failures: u32,
    retry_at: Option<Instant>,
}

impl<T: Clone + Send + Sync> BatchUploader<T> {
    /// Empty, online uploader for `session_id`; `label` names it in logs
    #[must_use]
    pub fn new(label: &'static str, session_id: SessionId, config: UploaderConfig) -> Self {
        Self {
            label,
            session_id,
            config,
            buffer: VecDeque::new(),
            pending: None,
            online: true,
            consecutive_failures: 0,
            retry_at: None,
        }
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size.max(1)
    }

    /// Queue an item; returns `true` once the size trigger is reached
    pub fn push(&mut self, item: T) -> bool {
        self.buffer.push_back(item);
        let buffered = self.buffer.len();
        if buffered % BACKLOG_WARN_ITEMS == 0 {
            warn!(
                session_id = %self.session_id,
                uploader = self.label,
                buffered,
                online = self.online,
                "Upload backlog growing"
            );
        }
        buffered >= self.batch_size()
    }

    /// Buffered items, including those frozen in the pending batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is buffered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Batch frozen by a failed attempt, resent unchanged on retry
    #[must_use]
    pub const fn pending_payload(&self) -> Option<&Batch<T>> {
        self.pending.as_ref()
    }

    /// Failures since the last successful upload
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Time trigger period
    #[must_use]
    pub const fn flush_interval(&self) -> Duration {
        self.config.flush_interval
    }

    /// Whether requests may be made
    #[must_use]
    pub const fn is_online(&self) -> bool {
        self.online
    }

    /// Whether an attempt made at `now` would issue a request
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.online && !self.buffer.is_empty() && self.retry_at.is_none_or(|at| now >= at)
    }

    /// Current upload status
    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        if self.buffer.is_empty() {
            SyncStatus::Synced
        } else if self.online {
            SyncStatus::Pending
        } else {
            SyncStatus::Offline
        }
    }

    /// Record connectivity; returns `true` on the offline to online transition
    ///
    /// The transition clears the backoff deadline so a full sync can start at once.
    pub fn set_online(&mut self, online: bool) -> bool {
        let came_back = online && !self.online;
        self.online = online;
        if came_back {
            self.retry_at = None;
            info!(
                uploader = self.label,
                session_id = %self.session_id,
                buffered = self.buffer.len(),
                "Connectivity restored"
            );
        }
        came_back
    }

    /// Drop every buffered item and the pending batch; returns the number dropped
    pub fn discard(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        self.pending = None;
        self.consecutive_failures = 0;
        self.retry_at = None;
        if dropped > 0 {
            warn!(
                uploader = self.label,
                session_id = %self.session_id,
                dropped,
                "Discarded unsent items"
            );
        }
        dropped
    }

    /// Attempt one batch, honouring connectivity and the backoff deadline
    pub async fn flush_once<S>(&mut self, sink: &S, now: Instant) -> FlushOutcome
    where
        S: BatchSink<T> + ?Sized,
    {
        if self.buffer.is_empty() {
            return FlushOutcome::Empty;
        }
        if !self.online {
            debug!(uploader = self.label, "Skipping flush while offline");
            return FlushOutcome::Offline;
        }
        if let Some(at) = self.retry_at {
            if now < at {
                return FlushOutcome::BackingOff {
                    retry_in: at - now,
                };
            }
        }
        self.attempt(sink, now).await
    }

    async fn attempt<S>(&mut self, sink: &S, now: Instant) -> FlushOutcome
    where
        S: BatchSink<T> + ?Sized,
    {
        if self.pending.is_none() {
            let take = self.buffer.len().min(self.batch_size());
            let items = self.buffer.iter().take(take).cloned().collect();
            self.pending = Some(Batch::new(items));
        }
        let Some(batch) = self.pending.as_ref() else {
            return FlushOutcome::Empty;
        };
        let items = batch.len();
        let batch_id = batch.batch_id;

        match sink.upload(&self.session_id, batch).await {
            Ok(()) => {
                self.buffer.drain(..items);
                self.pending = None;
                self.consecutive_failures = 0;
                self.retry_at = None;
                debug!(
                    uploader = self.label,
                    session_id = %self.session_id,
                    %batch_id,
                    batch_size = items,
                    remaining = self.buffer.len(),
                    "Batch uploaded"
                );
                FlushOutcome::Uploaded { items }
            }
            Err(error) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                let retry_in = self.config.backoff.delay_for(self.consecutive_failures);
                self.retry_at = Some(now + retry_in);
                warn!(
                    uploader = self.label,
                    session_id = %self.session_id,
                    %batch_id,
                    attempt = self.consecutive_failures,
                    retry_in_ms = u64::try_from(retry_in.as_millis()).unwrap_or(u64::MAX),
                    retryable = error.is_retryable(),
                    error = %error,
                    "Batch upload failed"
                );
                FlushOutcome::Failed { error, retry_in }
            }
        }
    }

    /// Upload batches until the buffer is empty or an attempt does not succeed
    pub async fn flush_all<S>(&mut self, sink: &S, now: Instant) -> FlushSummary
    where
        S: BatchSink<T> + ?Sized,
    {
        let mut uploaded = 0;
        loop {
            match self.flush_once(sink, now).await {
                FlushOutcome::Uploaded { items } => uploaded += items,
                last => return FlushSummary { uploaded, last },
            }
        }
    }

    /// Full sync of every outstanding item, ignoring the backoff deadline
    pub async fn sync_pending<S>(&mut self, sink: &S, now: Instant) -> FlushSummary
    where
        S: BatchSink<T> + ?Sized,
    {
        self.retry_at = None;
        self.flush_all(sink, now).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedSink {
        fail_first: usize,
        calls: AtomicUsize,
        accepted: Mutex<Vec<Batch<u32>>>,
        attempted: Mutex<Vec<Batch<u32>>>,
    }

    #[async_trait]
    impl BatchSink<u32> for ScriptedSink {
        async fn upload(&self, _: &SessionId, batch: &Batch<u32>) -> Result<(), NetworkError> {
            self.attempted.lock().unwrap().push(batch.clone());
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_first {
                return Err(NetworkError::Status {
                    status: 503,
                    body: String::new(),
                });
            }
            self.accepted.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }

    fn uploader(batch_size: usize) -> BatchUploader<u32> {
        BatchUploader::new(
            "test",
            SessionId::from("s-1"),
            UploaderConfig {
                batch_size,
                flush_interval: Duration::from_secs(30),
                backoff: BackoffPolicy::fixed(Duration::from_secs(2), Duration::from_secs(60)),
            },
        )
    }

    #[tokio::test]
    async fn test_size_trigger_flushes_one_batch() {
        let sink = ScriptedSink::default();
        let mut up = uploader(2);
        assert!(!up.push(1));
        assert!(up.push(2));
        assert!(up.push(3));

        let outcome = up.flush_once(&sink, Instant::now()).await;
        assert_eq!(outcome, FlushOutcome::Uploaded { items: 2 });
        assert_eq!(up.len(), 1);
        assert_eq!(sink.accepted.lock().unwrap()[0].items, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_long_offline_backlog_is_never_trimmed() {
        let sink = ScriptedSink::default();
        let mut up = uploader(50);
        up.set_online(false);
        let total = BACKLOG_WARN_ITEMS * 2 + 10;
        for item in 0..total {
            up.push(u32::try_from(item).unwrap());
        }
        assert_eq!(up.len(), total);
        assert_eq!(up.flush_once(&sink, Instant::now()).await, FlushOutcome::Offline);

        up.set_online(true);
        let summary = up.sync_pending(&sink, Instant::now()).await;
        assert_eq!(summary.uploaded, total);
        let accepted = sink.accepted.lock().unwrap();
        assert_eq!(accepted.first().unwrap().items[0], 0);
        assert!(accepted.iter().all(|batch| batch.items.len() <= 50));
    }

    #[tokio::test]
    async fn test_failure_keeps_buffer_and_payload() {
        let sink = ScriptedSink {
            fail_first: 2,
            ..ScriptedSink::default()
        };
        let mut up = uploader(10);
        up.push(7);
        up.push(8);

        let t0 = Instant::now();
        let first = up.flush_once(&sink, t0).await;
        assert!(matches!(first, FlushOutcome::Failed { retry_in, .. } if retry_in == Duration::from_secs(2)));
        assert_eq!(up.len(), 2);
        let frozen = up.pending_payload().cloned().unwrap();

        // still inside the backoff window
        let early = up.flush_once(&sink, t0 + Duration::from_secs(1)).await;
        assert!(matches!(early, FlushOutcome::BackingOff { .. }));

        up.push(9);
        let second = up.flush_once(&sink, t0 + Duration::from_secs(2)).await;
        assert!(matches!(second, FlushOutcome::Failed { retry_in, .. } if retry_in == Duration::from_secs(4)));
        assert_eq!(up.pending_payload(), Some(&frozen));

        let third = up.flush_once(&sink, t0 + Duration::from_secs(6)).await;
        assert_eq!(third, FlushOutcome::Uploaded { items: 2 });
        assert_eq!(up.consecutive_failures(), 0);
        assert_eq!(up.len(), 1);

        let attempted = sink.attempted.lock().unwrap();
        assert!(attempted.iter().all(|b| *b == frozen));
        assert_eq!(sink.accepted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_offline_skips_and_reconnect_syncs_everything() {
        let sink = ScriptedSink::default();
        let mut up = uploader(2);
        up.set_online(false);
        for i in 0..5 {
            up.push(i);
        }
        assert_eq!(up.flush_once(&sink, Instant::now()).await, FlushOutcome::Offline);
        assert_eq!(up.sync_status(), SyncStatus::Offline);
        assert_eq!(sink.calls.load(Ordering::SeqCst), 0);

        assert!(up.set_online(true));
        assert!(!up.set_online(true));
        let summary = up.sync_pending(&sink, Instant::now()).await;
        assert_eq!(summary.uploaded, 5);
        assert_eq!(summary.last, FlushOutcome::Empty);
        assert_eq!(up.sync_status(), SyncStatus::Synced);
    }

    #[tokio::test]
    async fn test_reconnect_ignores_backoff_deadline() {
        let sink = ScriptedSink {
            fail_first: 1,
            ..ScriptedSink::default()
        };
        let mut up = uploader(5);
        up.push(1);
        let now = Instant::now();
        up.flush_once(&sink, now).await;
        assert!(!up.is_due(now));

        up.set_online(false);
        up.set_online(true);
        assert!(up.is_due(now));
        assert_eq!(up.flush_all(&sink, now).await.uploaded, 1);
    }

    #[test]
    fn test_discard_drops_everything() {
        let mut up = uploader(5);
        up.push(1);
        up.push(2);
        assert_eq!(up.discard(), 2);
        assert!(up.is_empty());
        assert!(up.pending_payload().is_none());
    }

    #[test]
    fn test_sync_status_merge() {
        assert_eq!(SyncStatus::Synced.merge(SyncStatus::Pending), SyncStatus::Pending);
        assert_eq!(SyncStatus::Pending.merge(SyncStatus::Offline), SyncStatus::Offline);
        assert_eq!(SyncStatus::Synced.merge(SyncStatus::Synced), SyncStatus::Synced);
    }
}
