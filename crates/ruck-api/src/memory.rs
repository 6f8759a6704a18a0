// ABOUTME: In-process RuckApi that records every call, for dry runs and tests
// ABOUTME: Deduplicates batches by id like the real backend and can inject failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use async_trait::async_trait;
use ruck_core::errors::NetworkError;
use ruck_core::models::{HeartRateSample, LocationPoint, NewSession, SessionId};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::client::RuckApi;
use crate::payloads::{Batch, CompletionPayload, RemoteSession};

/// Everything the in-memory backend has accepted
#[derive(Debug, Default, Clone)]
pub struct RecordedCalls {
    /// Sessions created, in order
    pub created: Vec<SessionId>,
    /// Lifecycle calls as `(session, action)`
    pub lifecycle: Vec<(SessionId, &'static str)>,
    /// Every location batch attempt that reached the backend, including duplicates
    pub location_attempts: Vec<Batch<LocationPoint>>,
    /// Location points stored after deduplication by batch id
    pub locations: Vec<LocationPoint>,
    /// Every heart-rate batch attempt that reached the backend
    pub heart_rate_attempts: Vec<Batch<HeartRateSample>>,
    /// Heart-rate samples stored after deduplication by batch id
    pub heart_rate: Vec<HeartRateSample>,
    /// Completion payloads accepted
    pub completions: Vec<(SessionId, CompletionPayload)>,
    /// Sessions deleted
    pub deleted: Vec<SessionId>,
}

/// `RuckApi` kept in memory
#[derive(Debug, Default)]
pub struct InMemoryRuckApi {
    calls: Mutex<RecordedCalls>,
    seen_batches: Mutex<HashSet<Uuid>>,
    next_id: AtomicU64,
    offline: AtomicBool,
    failures_remaining: AtomicU32,
}

impl InMemoryRuckApi {
    /// Backend accepting every call
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every call with `NetworkError::Offline` while set
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Fail the next `count` batch or completion calls with a 503
    pub fn fail_next(&self, count: u32) {
        self.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Copy of everything recorded so far
    #[must_use]
    pub fn calls(&self) -> RecordedCalls {
        self.lock_calls().clone()
    }

    fn lock_calls(&self) -> MutexGuard<'_, RecordedCalls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reachable(&self) -> Result<(), NetworkError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(NetworkError::Offline)
        } else {
            Ok(())
        }
    }

    fn injected_failure(&self) -> Result<(), NetworkError> {
        let consumed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed {
            Err(NetworkError::Status {
                status: 503,
                body: "injected failure".to_owned(),
            })
        } else {
            Ok(())
        }
    }

    /// Returns `false` when the batch id was already stored
    fn first_delivery(&self, batch_id: Uuid) -> bool {
        self.seen_batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(batch_id)
    }

    fn lifecycle(&self, session_id: &SessionId, action: &'static str) -> Result<(), NetworkError> {
        self.reachable()?;
        self.lock_calls().lifecycle.push((session_id.clone(), action));
        Ok(())
    }
}

#[async_trait]
impl RuckApi for InMemoryRuckApi {
    async fn create_session(&self, _params: &NewSession) -> Result<RemoteSession, NetworkError> {
        self.reachable()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let id = SessionId::new(format!("ruck-{n}"));
        self.lock_calls().created.push(id.clone());
        Ok(RemoteSession { id })
    }

    async fn start_session(&self, session_id: &SessionId) -> Result<(), NetworkError> {
        self.lifecycle(session_id, "start")
    }

    async fn pause_session(&self, session_id: &SessionId) -> Result<(), NetworkError> {
        self.lifecycle(session_id, "pause")
    }

    async fn resume_session(&self, session_id: &SessionId) -> Result<(), NetworkError> {
        self.lifecycle(session_id, "resume")
    }

    async fn append_location_batch(
        &self,
        _session_id: &SessionId,
        batch: &Batch<LocationPoint>,
    ) -> Result<(), NetworkError> {
        self.reachable()?;
        self.lock_calls().location_attempts.push(batch.clone());
        self.injected_failure()?;
        if self.first_delivery(batch.batch_id) {
            self.lock_calls().locations.extend(batch.items.iter().cloned());
        }
        Ok(())
    }

    async fn append_heart_rate_batch(
        &self,
        _session_id: &SessionId,
        batch: &Batch<HeartRateSample>,
    ) -> Result<(), NetworkError> {
        self.reachable()?;
        self.lock_calls().heart_rate_attempts.push(batch.clone());
        self.injected_failure()?;
        if self.first_delivery(batch.batch_id) {
            self.lock_calls().heart_rate.extend(batch.items.iter().copied());
        }
        Ok(())
    }

    async fn complete_session(
        &self,
        session_id: &SessionId,
        payload: &CompletionPayload,
    ) -> Result<(), NetworkError> {
        self.reachable()?;
        self.injected_failure()?;
        self.lock_calls()
            .completions
            .push((session_id.clone(), payload.clone()));
        Ok(())
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), NetworkError> {
        self.reachable()?;
        self.lock_calls().deleted.push(session_id.clone());
        Ok(())
    }
}
