// ABOUTME: Single-task session coordinator owning all mutable tracking state for one ruck
// ABOUTME: Processes sensor, connectivity, timer, and command events from one channel in order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Session Coordinator
//!
//! One tokio task per active session. Every input (location readings,
//! heart-rate samples, connectivity changes, timer ticks, and user commands)
//! arrives as a [`TrackingEvent`] on a single bounded channel, so the session,
//! its sampler, and both upload buffers are only ever touched by this task.
//!
//! Lifecycle calls (`pause`, `resume`) are mirrored to the backend on a best
//! effort basis. Completion performs a final full sync; when that cannot finish
//! the data stays here and the session reports a non-synced [`SyncStatus`]
//! until [`CoordinatorHandle::retry_sync`] or a reconnect gets it through.
//! The durable [`ActiveSessionRecord`] is kept until the session is deleted or
//! completed and fully synced, so [`SessionCoordinator::resume_stored`] can
//! pick up after a restart.

use ruck_api::{CompletionPayload, RuckApi};
use ruck_core::constants::sync::EVENT_CHANNEL_CAPACITY;
use ruck_core::errors::{TrackingError, TrackingResult};
use ruck_core::models::{
    HeartRateSample, LocationReading, NewSession, RuckSession, SessionId, SessionReview,
    SessionStatus,
};
use serde::Serialize;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::context::{SessionContext, SessionSnapshot};
use super::timers::{TimerKind, TimerRegistry};
use super::uploader::{FlushOutcome, FlushSummary, SyncStatus};
use crate::config::TrackingConfig;
use crate::liveness::{Heartbeat, LivenessMonitor};
use crate::persistence::{ActiveSessionRecord, ActiveSessionStore};

type Reply<T> = oneshot::Sender<TrackingResult<T>>;

/// Input processed by the coordinator
#[derive(Debug)]
pub enum TrackingEvent {
    /// Raw platform location fix
    Location(LocationReading),
    /// Heart-rate sample from the paired sensor
    HeartRate(HeartRateSample),
    /// Paired heart-rate sensor link changed
    HeartRateSensor {
        /// Whether the sensor is connected
        connected: bool,
    },
    /// Device connectivity changed
    Connectivity {
        /// Whether the network is reachable
        online: bool,
    },
    /// Flush or retry timer fired
    Timer(TimerKind),
    /// Pause recording
    Pause(Reply<()>),
    /// Resume recording
    Resume(Reply<()>),
    /// Complete the session
    Complete {
        /// Rating and notes
        review: SessionReview,
        /// Completion result
        reply: Reply<CompletionReport>,
    },
    /// Delete the session and discard unsent data
    Delete(Reply<bool>),
    /// Full sync ignoring backoff
    RetrySync(Reply<SyncStatus>),
    /// Current state
    Snapshot(Reply<SessionSnapshot>),
}

/// Outcome of completing a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionReport {
    /// Final frozen state
    pub snapshot: SessionSnapshot,
    /// Whether the backend accepted the completion call
    pub completion_acknowledged: bool,
}

impl CompletionReport {
    /// Everything reached the backend
    #[must_use]
    pub fn fully_synced(&self) -> bool {
        self.completion_acknowledged && self.snapshot.sync_status == SyncStatus::Synced
    }
}

/// Services the coordinator talks to
#[derive(Clone)]
pub struct CoordinatorDeps {
    /// Remote session API
    pub api: Arc<dyn RuckApi>,
    /// Durable active-session record
    pub store: Arc<dyn ActiveSessionStore>,
    /// Wall clock for session timestamps
    pub clock: Arc<dyn Clock>,
}

/// Cloneable sender side of a running coordinator
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    session_id: SessionId,
    tx: mpsc::Sender<TrackingEvent>,
}

impl CoordinatorHandle {
    /// Session served by the coordinator
    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Whether the coordinator has stopped
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Queue a raw event
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::CoordinatorClosed` once the coordinator has stopped.
    pub async fn send(&self, event: TrackingEvent) -> TrackingResult<()> {
        self.tx
            .send(event)
            .await
            .map_err(|_| TrackingError::CoordinatorClosed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> TrackingEvent + Send,
    ) -> TrackingResult<T> {
        let (reply, response) = oneshot::channel();
        self.send(make(reply)).await?;
        response
            .await
            .map_err(|_| TrackingError::CoordinatorClosed)?
    }

    /// Feed a location reading
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::CoordinatorClosed` once the coordinator has stopped.
    pub async fn location(&self, reading: LocationReading) -> TrackingResult<()> {
        self.send(TrackingEvent::Location(reading)).await
    }

    /// Feed a heart-rate sample
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::CoordinatorClosed` once the coordinator has stopped.
    pub async fn heart_rate(&self, sample: HeartRateSample) -> TrackingResult<()> {
        self.send(TrackingEvent::HeartRate(sample)).await
    }

    /// Report the heart-rate sensor link
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::CoordinatorClosed` once the coordinator has stopped.
    pub async fn heart_rate_sensor(&self, connected: bool) -> TrackingResult<()> {
        self.send(TrackingEvent::HeartRateSensor { connected }).await
    }

    /// Report device connectivity
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::CoordinatorClosed` once the coordinator has stopped.
    pub async fn connectivity(&self, online: bool) -> TrackingResult<()> {
        self.send(TrackingEvent::Connectivity { online }).await
    }

    /// Pause recording
    ///
    /// # Errors
    ///
    /// `TrackingError::State` unless the session is in progress.
    pub async fn pause(&self) -> TrackingResult<()> {
        self.request(TrackingEvent::Pause).await
    }

    /// Resume recording
    ///
    /// # Errors
    ///
    /// `TrackingError::State` unless the session is paused.
    pub async fn resume(&self) -> TrackingResult<()> {
        self.request(TrackingEvent::Resume).await
    }

    /// Complete the session with a review and run the final sync
    ///
    /// # Errors
    ///
    /// `TrackingError::State` from `created` or `completed`, `TrackingError::Validation`
    /// for an out-of-range review. Sync failures are reported in the report, not as errors.
    pub async fn complete(&self, review: SessionReview) -> TrackingResult<CompletionReport> {
        self.request(|reply| TrackingEvent::Complete { review, reply })
            .await
    }

    /// Delete the session; `Ok(true)` when the backend confirmed the deletion
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::CoordinatorClosed` once the coordinator has stopped.
    pub async fn delete(&self) -> TrackingResult<bool> {
        self.request(TrackingEvent::Delete).await
    }

    /// Sync every outstanding item now, ignoring backoff
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::CoordinatorClosed` once the coordinator has stopped.
    pub async fn retry_sync(&self) -> TrackingResult<SyncStatus> {
        self.request(TrackingEvent::RetrySync).await
    }

    /// Current state of the session
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::CoordinatorClosed` once the coordinator has stopped.
    pub async fn snapshot(&self) -> TrackingResult<SessionSnapshot> {
        self.request(TrackingEvent::Snapshot).await
    }
}

/// A started session: its handle, liveness monitor, and task
#[derive(Debug)]
pub struct ActiveSession {
    /// Sender side
    pub handle: CoordinatorHandle,
    /// Health of the coordinator task
    pub liveness: LivenessMonitor,
    /// Coordinator task, finishes after deletion or a fully synced completion
    pub task: JoinHandle<()>,
}

/// Event loop owning one session
pub struct SessionCoordinator {
    session_id: SessionId,
    deps: CoordinatorDeps,
    context: SessionContext,
    timers: TimerRegistry,
    heartbeat: Heartbeat,
    events: mpsc::WeakSender<TrackingEvent>,
    rx: mpsc::Receiver<TrackingEvent>,
    online: bool,
    completion_acknowledged: bool,
}

impl SessionCoordinator {
    /// Create and start a session on the backend, then spawn its coordinator
    ///
    /// # Errors
    ///
    /// `TrackingError::Validation` for bad parameters and `TrackingError::Network`
    /// when the backend cannot create or start the session.
    pub async fn start(
        deps: CoordinatorDeps,
        config: &TrackingConfig,
        params: &NewSession,
    ) -> TrackingResult<ActiveSession> {
        params.validate()?;
        let remote = deps.api.create_session(params).await?;
        let session = RuckSession::new(remote.id.clone(), params, deps.clock.now());
        deps.api.start_session(&remote.id).await?;

        let mut context = SessionContext::new(session, config);
        context.machine.start(deps.clock.now())?;

        let (coordinator, tx) = Self::assemble(deps, context);
        coordinator.persist().await;
        coordinator.schedule_flush_timers();

        info!(
            session_id = %remote.id,
            ruck_weight_kg = params.ruck_weight_kg,
            "Ruck session started"
        );
        Ok(coordinator.spawn(tx, config))
    }

    /// Rebuild the coordinator for a session recorded before a restart
    ///
    /// Nothing is created on the backend. A recording session gets its flush
    /// timers back, a paused one waits for `resume`, and a completed one
    /// retries the completion call before the task is spawned. A record that
    /// was never started is started now.
    ///
    /// Location and heart-rate items buffered before the restart are not part
    /// of the record and are lost with the process.
    ///
    /// # Errors
    ///
    /// `TrackingError::Validation` for a record with unusable weights,
    /// `TrackingError::Network` when a never-started session cannot be started.
    pub async fn resume_from(
        deps: CoordinatorDeps,
        config: &TrackingConfig,
        record: &ActiveSessionRecord,
    ) -> TrackingResult<ActiveSession> {
        record.params().validate()?;
        let now = deps.clock.now();
        let mut context = SessionContext::new(record.to_session(now), config);
        if context.machine.status() == SessionStatus::Created {
            deps.api.start_session(&record.session_id).await?;
            context.machine.start(now)?;
        }
        context.machine.refresh_duration(now);
        let status = context.machine.status();

        let (mut coordinator, tx) = Self::assemble(deps, context);
        if status.is_recording() {
            coordinator.schedule_flush_timers();
        } else {
            coordinator.heartbeat.set_expecting_ticks(false);
        }
        coordinator.persist().await;
        if status.is_terminal() {
            coordinator.sync_everything().await;
        }

        info!(
            session_id = %record.session_id,
            %status,
            finished = coordinator.is_finished(),
            "Ruck session resumed after restart"
        );
        Ok(coordinator.spawn(tx, config))
    }

    /// Resume whatever the store holds; `Ok(None)` when no session was active
    ///
    /// # Errors
    ///
    /// `TrackingError::Storage` when the record cannot be read, otherwise as
    /// [`Self::resume_from`].
    pub async fn resume_stored(
        deps: CoordinatorDeps,
        config: &TrackingConfig,
    ) -> TrackingResult<Option<ActiveSession>> {
        let Some(record) = deps.store.load().await? else {
            debug!("No active session to resume");
            return Ok(None);
        };
        Self::resume_from(deps, config, &record).await.map(Some)
    }

    fn assemble(
        deps: CoordinatorDeps,
        context: SessionContext,
    ) -> (Self, mpsc::Sender<TrackingEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let coordinator = Self {
            session_id: context.machine.session().id.clone(),
            deps,
            context,
            timers: TimerRegistry::new(),
            heartbeat: Heartbeat::new(),
            events: tx.downgrade(),
            rx,
            online: true,
            completion_acknowledged: false,
        };
        (coordinator, tx)
    }

    fn spawn(self, tx: mpsc::Sender<TrackingEvent>, config: &TrackingConfig) -> ActiveSession {
        let handle = CoordinatorHandle {
            session_id: self.session_id.clone(),
            tx,
        };
        let liveness = LivenessMonitor::new(self.heartbeat.clone(), config.liveness_stale_after);
        let task = tokio::spawn(self.run());
        ActiveSession {
            handle,
            liveness,
            task,
        }
    }

    async fn run(mut self) {
        let _stopped = self.heartbeat.stop_on_drop();
        debug!(session_id = %self.session_id, "Session coordinator running");

        // A completed session resumed after a restart may have nothing left to do
        if !self.is_finished() {
            while let Some(event) = self.rx.recv().await {
                self.heartbeat.beat();
                if self.handle(event).await.is_break() || self.is_finished() {
                    break;
                }
            }
        }

        self.timers.cancel_session(&self.session_id);
        info!(
            session_id = %self.session_id,
            status = %self.context.machine.status(),
            "Session coordinator stopped"
        );
    }

    async fn handle(&mut self, event: TrackingEvent) -> ControlFlow<()> {
        match event {
            TrackingEvent::Location(reading) => self.on_location(&reading).await,
            TrackingEvent::HeartRate(sample) => self.on_heart_rate(sample).await,
            TrackingEvent::HeartRateSensor { connected } => {
                if connected {
                    self.context.heart_rate.sensor_reconnected();
                } else {
                    self.context.heart_rate.sensor_disconnected();
                }
            }
            TrackingEvent::Connectivity { online } => self.on_connectivity(online).await,
            TrackingEvent::Timer(kind) => self.on_timer(kind).await,
            TrackingEvent::Pause(reply) => {
                let result = self.pause().await;
                let _ = reply.send(result);
            }
            TrackingEvent::Resume(reply) => {
                let result = self.resume().await;
                let _ = reply.send(result);
            }
            TrackingEvent::Complete { review, reply } => {
                let result = self.complete(review).await;
                let _ = reply.send(result);
            }
            TrackingEvent::Delete(reply) => {
                let result = self.delete().await;
                let _ = reply.send(Ok(result));
                return ControlFlow::Break(());
            }
            TrackingEvent::RetrySync(reply) => {
                let status = self.sync_everything().await;
                let _ = reply.send(Ok(status));
            }
            TrackingEvent::Snapshot(reply) => {
                let _ = reply.send(Ok(self.snapshot()));
            }
        }
        ControlFlow::Continue(())
    }

    async fn on_location(&mut self, reading: &LocationReading) {
        self.context.machine.refresh_duration(self.deps.clock.now());
        match self.context.ingest_location(reading) {
            Ok(true) => self.flush_locations(false).await,
            Err(TrackingError::State(reason)) => {
                debug!(session_id = %self.session_id, %reason, "Location reading ignored");
            }
            Ok(false) | Err(_) => {}
        }
    }

    async fn on_heart_rate(&mut self, sample: HeartRateSample) {
        match self.context.ingest_heart_rate(sample) {
            Ok(true) => self.flush_heart_rate(false).await,
            Ok(false) => {}
            Err(reason) => {
                debug!(session_id = %self.session_id, %reason, "Heart-rate sample dropped");
            }
        }
    }

    async fn on_connectivity(&mut self, online: bool) {
        if online == self.online {
            return;
        }
        self.online = online;
        let came_back = self.context.set_online(online);
        info!(session_id = %self.session_id, online, "Connectivity changed");
        if came_back {
            self.sync_everything().await;
        }
    }

    async fn on_timer(&mut self, kind: TimerKind) {
        self.context.machine.refresh_duration(self.deps.clock.now());
        if matches!(kind, TimerKind::LocationRetry | TimerKind::HeartRateRetry) {
            self.timers.cancel(&self.session_id, kind);
        }
        match kind {
            TimerKind::LocationFlush => {
                self.flush_locations(true).await;
                self.persist().await;
            }
            TimerKind::LocationRetry => self.flush_locations(true).await,
            TimerKind::HeartRateFlush | TimerKind::HeartRateRetry => {
                self.flush_heart_rate(true).await;
            }
        }
    }

    /// Size trigger flushes one batch, timers drain the buffer
    async fn flush_locations(&mut self, drain: bool) {
        let api = Arc::clone(&self.deps.api);
        let uploader = &mut self.context.locations;
        let now = Instant::now();
        let last = if drain {
            uploader.flush_all(api.as_ref(), now).await.last
        } else {
            uploader.flush_once(api.as_ref(), now).await
        };
        self.schedule_retry(TimerKind::LocationRetry, &last);
    }

    async fn flush_heart_rate(&mut self, drain: bool) {
        let api = Arc::clone(&self.deps.api);
        let uploader = self.context.heart_rate.uploader_mut();
        let now = Instant::now();
        let last = if drain {
            uploader.flush_all(api.as_ref(), now).await.last
        } else {
            uploader.flush_once(api.as_ref(), now).await
        };
        self.schedule_retry(TimerKind::HeartRateRetry, &last);
    }

    /// Retries run only while recording; paused or completed sessions wait for
    /// resume, reconnect, or an explicit retry
    fn schedule_retry(&self, kind: TimerKind, outcome: &FlushOutcome) {
        if !self.context.machine.status().is_recording() {
            return;
        }
        if let FlushOutcome::Failed { retry_in, .. } = outcome {
            self.timers.schedule_once(
                &self.session_id,
                kind,
                *retry_in,
                self.events.clone(),
                TrackingEvent::Timer(kind),
            );
        }
    }

    fn schedule_flush_timers(&self) {
        let location_period = self.context.locations.flush_interval();
        let heart_rate_period = self.context.heart_rate.uploader().flush_interval();
        self.timers.schedule_every(
            &self.session_id,
            TimerKind::LocationFlush,
            location_period,
            self.events.clone(),
            || TrackingEvent::Timer(TimerKind::LocationFlush),
        );
        self.timers.schedule_every(
            &self.session_id,
            TimerKind::HeartRateFlush,
            heart_rate_period,
            self.events.clone(),
            || TrackingEvent::Timer(TimerKind::HeartRateFlush),
        );
    }

    /// Full sync of both buffers, then the completion call when it is still owed
    async fn sync_everything(&mut self) -> SyncStatus {
        let api = Arc::clone(&self.deps.api);
        let now = Instant::now();

        let locations: FlushSummary = self
            .context
            .locations
            .sync_pending(api.as_ref(), now)
            .await;
        self.schedule_retry(TimerKind::LocationRetry, &locations.last);

        let heart_rate = self
            .context
            .heart_rate
            .uploader_mut()
            .sync_pending(api.as_ref(), now)
            .await;
        self.schedule_retry(TimerKind::HeartRateRetry, &heart_rate.last);

        if self.completion_owed() && self.online && self.context.sync_status() == SyncStatus::Synced
        {
            self.send_completion().await;
        }

        let status = self.sync_status();
        debug!(
            session_id = %self.session_id,
            uploaded = locations.uploaded + heart_rate.uploaded,
            %status,
            "Sync finished"
        );
        if self.is_finished() {
            self.forget().await;
        }
        status
    }

    fn completion_owed(&self) -> bool {
        self.context.machine.status().is_terminal() && !self.completion_acknowledged
    }

    async fn send_completion(&mut self) {
        let payload = CompletionPayload::from_session(
            self.context.machine.session(),
            self.context.heart_rate.summary(),
        );
        match self
            .deps
            .api
            .complete_session(&self.session_id, &payload)
            .await
        {
            Ok(()) => {
                self.completion_acknowledged = true;
                info!(
                    session_id = %self.session_id,
                    distance_km = payload.final_distance_km,
                    calories = payload.final_calories_burned,
                    "Session completion acknowledged"
                );
            }
            Err(error) => {
                warn!(session_id = %self.session_id, %error, "Session completion not delivered");
            }
        }
    }

    fn sync_status(&self) -> SyncStatus {
        let buffers = self.context.sync_status();
        if buffers != SyncStatus::Synced || !self.completion_owed() {
            return buffers;
        }
        if self.online {
            SyncStatus::Pending
        } else {
            SyncStatus::Offline
        }
    }

    fn is_finished(&self) -> bool {
        self.context.machine.status().is_terminal() && self.sync_status() == SyncStatus::Synced
    }

    fn snapshot(&mut self) -> SessionSnapshot {
        self.context.machine.refresh_duration(self.deps.clock.now());
        let mut snapshot = self.context.snapshot();
        snapshot.sync_status = self.sync_status();
        snapshot
    }

    async fn persist(&self) {
        let record = ActiveSessionRecord::from(self.context.machine.session());
        if let Err(error) = self.deps.store.save(&record).await {
            warn!(session_id = %self.session_id, %error, "Failed to persist active session");
        }
    }

    async fn forget(&self) {
        if let Err(error) = self.deps.store.clear().await {
            warn!(session_id = %self.session_id, %error, "Failed to clear active session");
        }
    }

    async fn pause(&mut self) -> TrackingResult<()> {
        self.context.machine.pause(self.deps.clock.now())?;
        self.timers.cancel_session(&self.session_id);
        self.heartbeat.set_expecting_ticks(false);

        self.flush_locations(true).await;
        self.flush_heart_rate(true).await;
        self.persist().await;

        if let Err(error) = self.deps.api.pause_session(&self.session_id).await {
            warn!(session_id = %self.session_id, %error, "Pause not mirrored to backend");
        }
        Ok(())
    }

    async fn resume(&mut self) -> TrackingResult<()> {
        self.context.machine.resume(self.deps.clock.now())?;
        self.schedule_flush_timers();
        self.heartbeat.set_expecting_ticks(true);
        self.persist().await;

        if let Err(error) = self.deps.api.resume_session(&self.session_id).await {
            warn!(session_id = %self.session_id, %error, "Resume not mirrored to backend");
        }
        Ok(())
    }

    async fn complete(&mut self, review: SessionReview) -> TrackingResult<CompletionReport> {
        self.context
            .machine
            .complete(self.deps.clock.now(), review)?;
        self.timers.cancel_session(&self.session_id);
        self.heartbeat.set_expecting_ticks(false);
        self.persist().await;

        let status = self.sync_everything().await;

        if status != SyncStatus::Synced {
            warn!(
                session_id = %self.session_id,
                %status,
                buffered_locations = self.context.locations.len(),
                buffered_heart_rate = self.context.heart_rate.uploader().len(),
                "Final sync incomplete, data kept for retry"
            );
        }

        Ok(CompletionReport {
            snapshot: self.snapshot(),
            completion_acknowledged: self.completion_acknowledged,
        })
    }

    /// Local cleanup always happens; returns whether the backend confirmed
    async fn delete(&mut self) -> bool {
        self.timers.cancel_session(&self.session_id);
        let discarded = self.context.discard();
        self.forget().await;

        let confirmed = match self.deps.api.delete_session(&self.session_id).await {
            Ok(()) => true,
            Err(error) => {
                warn!(session_id = %self.session_id, %error, "Backend deletion failed");
                false
            }
        };
        info!(
            session_id = %self.session_id,
            discarded,
            confirmed,
            status = %self.context.machine.status(),
            "Session deleted"
        );
        confirmed
    }
}
