// ABOUTME: Per-session tracking state created at start and dropped at completion or deletion
// ABOUTME: Bundles the state machine, location sampler, and both upload buffers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use ruck_core::errors::{StateError, TrackingResult};
use ruck_core::models::{
    HeartRateSample, HeartRateSummary, LocationPoint, LocationReading, RuckSession, SessionId,
};
use serde::Serialize;

use super::heart_rate::HeartRateAggregator;
use super::sampler::LocationSampler;
use super::session::SessionStateMachine;
use super::uploader::{BatchUploader, SyncStatus};
use crate::config::TrackingConfig;

/// Everything the coordinator mutates for one session
#[derive(Debug)]
pub struct SessionContext {
    /// Lifecycle and totals
    pub machine: SessionStateMachine,
    /// Accuracy filter and track
    pub sampler: LocationSampler,
    /// Location upload buffer
    pub locations: BatchUploader<LocationPoint>,
    /// Heart-rate buffer and summary
    pub heart_rate: HeartRateAggregator,
}

/// Point-in-time view of a session for callers and the CLI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Session with current totals
    pub session: RuckSession,
    /// Heart-rate aggregate
    pub heart_rate: HeartRateSummary,
    /// Combined upload status
    pub sync_status: SyncStatus,
    /// Location points not yet uploaded
    pub buffered_locations: usize,
    /// Heart-rate samples not yet uploaded
    pub buffered_heart_rate: usize,
    /// Readings accepted by the sampler
    pub accepted_points: usize,
    /// Readings dropped by the sampler
    pub rejected_readings: u64,
}

impl SessionContext {
    /// Context for a session just returned by the API
    #[must_use]
    pub fn new(session: RuckSession, config: &TrackingConfig) -> Self {
        let id = session.id.clone();
        Self {
            machine: SessionStateMachine::new(session),
            sampler: LocationSampler::new(config.accuracy_threshold_m),
            locations: BatchUploader::new("location", id.clone(), config.location_uploader()),
            heart_rate: HeartRateAggregator::new(id, config.heart_rate_uploader()),
        }
    }

    /// Session identifier
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.machine.session().id
    }

    /// Filter, accumulate, and buffer a location reading
    ///
    /// Returns `Ok(true)` once the location size trigger is reached.
    ///
    /// # Errors
    ///
    /// `StateError::NotRecording` when the session is not in progress (the
    /// reading is ignored) and `SensorError` when the sampler drops it.
    pub fn ingest_location(&mut self, reading: &LocationReading) -> TrackingResult<bool> {
        let status = self.machine.status();
        if !status.is_recording() {
            return Err(StateError::NotRecording(status).into());
        }
        let point = self.sampler.try_accept(reading)?;
        self.machine.record_point(&point)?;
        Ok(self.locations.push(point))
    }

    /// Buffer a heart-rate sample
    ///
    /// Returns `Ok(true)` once the heart-rate size trigger is reached.
    ///
    /// # Errors
    ///
    /// `StateError::NotRecording` outside `in_progress` and `SensorError` for
    /// implausible values or a disconnected sensor.
    pub fn ingest_heart_rate(&mut self, sample: HeartRateSample) -> TrackingResult<bool> {
        let status = self.machine.status();
        if !status.is_recording() {
            return Err(StateError::NotRecording(status).into());
        }
        Ok(self.heart_rate.accept(sample)?)
    }

    /// Apply connectivity to both buffers; `true` when either came back online
    pub fn set_online(&mut self, online: bool) -> bool {
        let locations = self.locations.set_online(online);
        let heart_rate = self.heart_rate.uploader_mut().set_online(online);
        locations || heart_rate
    }

    /// Combined upload status of both buffers
    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        self.locations
            .sync_status()
            .merge(self.heart_rate.uploader().sync_status())
    }

    /// Drop all unsent data; returns the number of items discarded
    pub fn discard(&mut self) -> usize {
        self.locations.discard() + self.heart_rate.uploader_mut().discard()
    }

    /// Current view of the session
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session: self.machine.session().clone(),
            heart_rate: *self.heart_rate.summary(),
            sync_status: self.sync_status(),
            buffered_locations: self.locations.len(),
            buffered_heart_rate: self.heart_rate.uploader().len(),
            accepted_points: self.sampler.accepted_count(),
            rejected_readings: self.sampler.rejected_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ruck_core::errors::{SensorError, TrackingError};
    use ruck_core::models::NewSession;

    fn context(batch_size: usize) -> SessionContext {
        let config = TrackingConfig {
            location_batch_size: batch_size,
            ..TrackingConfig::default()
        };
        let session = RuckSession::new(
            SessionId::from("ctx"),
            &NewSession::with_ruck_weight(10.0),
            Utc::now(),
        );
        SessionContext::new(session, &config)
    }

    fn reading(lon: f64, accuracy: f64) -> LocationReading {
        LocationReading {
            latitude: 0.0,
            longitude: lon,
            elevation: None,
            accuracy,
            timestamp: Utc::now(),
            speed: None,
        }
    }

    #[test]
    fn test_readings_before_start_are_ignored() {
        let mut ctx = context(5);
        assert!(matches!(
            ctx.ingest_location(&reading(0.0, 5.0)),
            Err(TrackingError::State(StateError::NotRecording(_)))
        ));
        assert_eq!(ctx.snapshot().accepted_points, 0);
    }

    #[test]
    fn test_inaccurate_reading_never_buffered() {
        let mut ctx = context(5);
        ctx.machine.start(Utc::now()).unwrap();
        assert!(ctx.ingest_location(&reading(0.0, 5.0)).is_ok());
        assert!(matches!(
            ctx.ingest_location(&reading(0.5, 50.0)),
            Err(TrackingError::Sensor(SensorError::AccuracyRejected { .. }))
        ));
        let snapshot = ctx.snapshot();
        assert_eq!(snapshot.buffered_locations, 1);
        assert_eq!(snapshot.rejected_readings, 1);
        assert!(snapshot.session.stats.distance_km.abs() < f64::EPSILON);
    }

    #[test]
    fn test_size_trigger_reported() {
        let mut ctx = context(2);
        ctx.machine.start(Utc::now()).unwrap();
        assert!(!ctx.ingest_location(&reading(0.0, 5.0)).unwrap());
        assert!(ctx.ingest_location(&reading(0.001, 5.0)).unwrap());
    }
}
