// ABOUTME: Session lifecycle state machine and incremental stat accumulation
// ABOUTME: created -> in_progress <-> paused -> completed, with frozen stats after completion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Session State Machine
//!
//! | from \ action | start | pause | resume | complete |
//! |---------------|-------|-------|--------|----------|
//! | created       | ok    | -     | -      | -        |
//! | in_progress   | -     | ok    | -      | ok       |
//! | paused        | -     | -     | ok     | ok       |
//! | completed     | -     | -     | -      | -        |
//!
//! A refused transition leaves the session untouched. Distance and elevation
//! accumulate between consecutive accepted points; the segment that spans a
//! pause is counted once tracking resumes, so pausing never changes totals for
//! the same accepted sequence.

use chrono::{DateTime, Utc};
use ruck_core::errors::{StateError, TrackingResult};
use ruck_core::models::{
    LocationPoint, RuckSession, RuckSessionStats, SessionReview, SessionStatus,
};
use tracing::info;

use crate::calories::{estimate_calories, pace_min_per_km, EffortInputs};
use crate::geo::{distance_between_km, elevation_delta_m};

/// Lifecycle and stat accumulator for one session
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    session: RuckSession,
    last_point: Option<LocationPoint>,
    paused_seconds: u64,
}

fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    u64::try_from((to - from).num_seconds()).unwrap_or(0)
}

impl SessionStateMachine {
    /// Wrap a session, carrying over any paused time it already recorded
    ///
    /// A session rebuilt after a restart has no last point, so the first
    /// reading afterwards starts a new segment.
    #[must_use]
    pub const fn new(session: RuckSession) -> Self {
        let paused_seconds = session.stats.paused_duration_seconds;
        Self {
            session,
            last_point: None,
            paused_seconds,
        }
    }

    /// Current lifecycle status
    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.session.status
    }

    /// Current totals
    #[must_use]
    pub const fn stats(&self) -> &RuckSessionStats {
        &self.session.stats
    }

    /// The underlying session
    #[must_use]
    pub const fn session(&self) -> &RuckSession {
        &self.session
    }

    fn refuse(&self, action: &'static str) -> StateError {
        StateError::InvalidTransition {
            from: self.session.status,
            action,
        }
    }

    /// `created -> in_progress`
    ///
    /// # Errors
    ///
    /// Returns `StateError::InvalidTransition` from any other status.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), StateError> {
        if self.session.status != SessionStatus::Created {
            return Err(self.refuse("start"));
        }
        self.session.status = SessionStatus::InProgress;
        self.session.started_at = Some(now);
        info!(session_id = %self.session.id, "Session started");
        Ok(())
    }

    /// `in_progress -> paused`
    ///
    /// # Errors
    ///
    /// Returns `StateError::InvalidTransition` unless the session is in progress.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), StateError> {
        if self.session.status != SessionStatus::InProgress {
            return Err(self.refuse("pause"));
        }
        self.refresh_duration(now);
        self.session.status = SessionStatus::Paused;
        self.session.paused_at = Some(now);
        info!(session_id = %self.session.id, "Session paused");
        Ok(())
    }

    /// `paused -> in_progress`
    ///
    /// # Errors
    ///
    /// Returns `StateError::InvalidTransition` unless the session is paused.
    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<(), StateError> {
        if self.session.status != SessionStatus::Paused {
            return Err(self.refuse("resume"));
        }
        self.close_pause(now);
        self.session.status = SessionStatus::InProgress;
        self.refresh_duration(now);
        info!(session_id = %self.session.id, "Session resumed");
        Ok(())
    }

    /// `in_progress | paused -> completed`, freezing stats
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::State` from `created` or `completed`, and
    /// `TrackingError::Validation` for an out-of-range review. Neither changes
    /// the session.
    pub fn complete(&mut self, now: DateTime<Utc>, review: SessionReview) -> TrackingResult<()> {
        if !matches!(
            self.session.status,
            SessionStatus::InProgress | SessionStatus::Paused
        ) {
            return Err(self.refuse("complete").into());
        }
        review.validate()?;

        if self.session.status == SessionStatus::Paused {
            self.close_pause(now);
        }
        self.session.status = SessionStatus::InProgress;
        self.refresh_duration(now);

        let notes = review.notes.clone().or_else(|| self.session.review.notes.take());
        self.session.review = SessionReview { notes, ..review };
        self.session.status = SessionStatus::Completed;
        self.session.completed_at = Some(now);
        info!(
            session_id = %self.session.id,
            distance_km = self.session.stats.distance_km,
            duration_seconds = self.session.stats.duration_seconds,
            "Session completed"
        );
        Ok(())
    }

    fn close_pause(&mut self, now: DateTime<Utc>) {
        if let Some(paused_at) = self.session.paused_at.take() {
            self.paused_seconds += seconds_between(paused_at, now);
        }
        self.session.stats.paused_duration_seconds = self.paused_seconds;
    }

    /// Fold an accepted point into distance and elevation totals
    ///
    /// # Errors
    ///
    /// Returns `StateError::NotRecording` unless the session is in progress.
    pub fn record_point(&mut self, point: &LocationPoint) -> Result<(), StateError> {
        if !self.session.status.is_recording() {
            return Err(StateError::NotRecording(self.session.status));
        }
        if let Some(previous) = &self.last_point {
            let (gain, loss) = elevation_delta_m(previous, point);
            let stats = &mut self.session.stats;
            stats.distance_km += distance_between_km(previous, point);
            stats.elevation_gain_m += gain;
            stats.elevation_loss_m += loss;
        }
        self.last_point = Some(point.clone());
        self.recompute_derived();
        Ok(())
    }

    /// Recompute active duration from the clock; no-op once completed
    ///
    /// While paused the duration stays at the value reached when the pause began.
    pub fn refresh_duration(&mut self, now: DateTime<Utc>) {
        if self.session.status.is_terminal() {
            return;
        }
        let Some(started_at) = self.session.started_at else {
            return;
        };
        let reference = self.session.paused_at.unwrap_or(now);
        let elapsed = seconds_between(started_at, reference);
        self.session.stats.duration_seconds = elapsed.saturating_sub(self.paused_seconds);
        self.session.stats.paused_duration_seconds = self.paused_seconds;
        self.recompute_derived();
    }

    fn recompute_derived(&mut self) {
        let session = &mut self.session;
        let stats = &mut session.stats;
        stats.calories_burned = estimate_calories(&EffortInputs {
            user_weight_kg: session.user_weight_kg,
            ruck_weight_kg: session.ruck_weight_kg,
            distance_km: stats.distance_km,
            elevation_gain_m: stats.elevation_gain_m,
            elevation_loss_m: stats.elevation_loss_m,
            duration_seconds: stats.duration_seconds,
            gender: session.gender,
            terrain_multiplier: session.terrain_multiplier,
        });
        stats.average_pace_min_per_km = pace_min_per_km(stats.distance_km, stats.duration_seconds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use ruck_core::errors::TrackingError;
    use ruck_core::models::{LocationReading, NewSession, SessionId};

    fn machine() -> SessionStateMachine {
        SessionStateMachine::new(RuckSession::new(
            SessionId::from("s-1"),
            &NewSession::with_ruck_weight(15.0),
            Utc::now(),
        ))
    }

    fn point(lon: f64, elevation: Option<f64>) -> LocationPoint {
        LocationPoint::from_reading(&LocationReading {
            latitude: 0.0,
            longitude: lon,
            elevation,
            accuracy: 5.0,
            timestamp: Utc::now(),
            speed: None,
        })
    }

    #[test]
    fn test_created_only_starts() {
        let now = Utc::now();
        let mut m = machine();
        assert!(m.pause(now).is_err());
        assert!(m.resume(now).is_err());
        assert!(matches!(
            m.complete(now, SessionReview::default()),
            Err(TrackingError::State(_))
        ));
        assert_eq!(m.status(), SessionStatus::Created);
        m.start(now).unwrap();
        assert_eq!(m.status(), SessionStatus::InProgress);
        assert!(m.start(now).is_err());
    }

    #[test]
    fn test_completed_is_terminal() {
        let now = Utc::now();
        let mut m = machine();
        m.start(now).unwrap();
        m.complete(now, SessionReview::default()).unwrap();

        let err = m.resume(now).unwrap_err();
        assert_eq!(
            err,
            StateError::InvalidTransition {
                from: SessionStatus::Completed,
                action: "resume",
            }
        );
        assert!(m.pause(now).is_err());
        assert!(m.record_point(&point(0.0, None)).is_err());
    }

    #[test]
    fn test_paused_ignores_points() {
        let now = Utc::now();
        let mut m = machine();
        m.start(now).unwrap();
        m.record_point(&point(0.0, None)).unwrap();
        m.pause(now).unwrap();
        assert_eq!(
            m.record_point(&point(0.01, None)),
            Err(StateError::NotRecording(SessionStatus::Paused))
        );
        assert!(m.stats().distance_km.abs() < f64::EPSILON);
    }

    #[test]
    fn test_duration_excludes_pauses() {
        let t0 = Utc::now();
        let mut m = machine();
        m.start(t0).unwrap();
        m.pause(t0 + Duration::seconds(600)).unwrap();
        m.refresh_duration(t0 + Duration::seconds(900));
        assert_eq!(m.stats().duration_seconds, 600);

        m.resume(t0 + Duration::seconds(900)).unwrap();
        m.refresh_duration(t0 + Duration::seconds(1200));
        assert_eq!(m.stats().duration_seconds, 900);
        assert_eq!(m.stats().paused_duration_seconds, 300);
    }

    #[test]
    fn test_rebuilt_session_keeps_paused_time() {
        let t0 = Utc::now();
        let mut m = machine();
        m.start(t0).unwrap();
        m.pause(t0 + Duration::seconds(100)).unwrap();
        m.resume(t0 + Duration::seconds(160)).unwrap();
        m.pause(t0 + Duration::seconds(300)).unwrap();

        let mut rebuilt = SessionStateMachine::new(m.session().clone());
        rebuilt.resume(t0 + Duration::seconds(400)).unwrap();
        rebuilt.refresh_duration(t0 + Duration::seconds(500));
        assert_eq!(rebuilt.stats().paused_duration_seconds, 160);
        assert_eq!(rebuilt.stats().duration_seconds, 340);
    }

    #[test]
    fn test_complete_while_paused_closes_pause() {
        let t0 = Utc::now();
        let mut m = machine();
        m.start(t0).unwrap();
        m.pause(t0 + Duration::seconds(60)).unwrap();
        m.complete(t0 + Duration::seconds(100), SessionReview::default())
            .unwrap();
        assert_eq!(m.stats().duration_seconds, 60);
        assert_eq!(m.stats().paused_duration_seconds, 40);
        assert_eq!(m.session().completed_at, Some(t0 + Duration::seconds(100)));
    }

    #[test]
    fn test_invalid_review_leaves_session_in_progress() {
        let now = Utc::now();
        let mut m = machine();
        m.start(now).unwrap();
        let review = SessionReview {
            rating: Some(9),
            ..SessionReview::default()
        };
        assert!(matches!(
            m.complete(now, review),
            Err(TrackingError::Validation(_))
        ));
        assert_eq!(m.status(), SessionStatus::InProgress);
    }

    #[test]
    fn test_stats_frozen_after_completion() {
        let t0 = Utc::now();
        let mut m = machine();
        m.start(t0).unwrap();
        m.record_point(&point(0.0, Some(100.0))).unwrap();
        m.record_point(&point(0.001, Some(105.0))).unwrap();
        m.complete(t0 + Duration::seconds(120), SessionReview::default())
            .unwrap();
        let frozen = *m.stats();
        m.refresh_duration(t0 + Duration::seconds(9000));
        assert_eq!(*m.stats(), frozen);
    }
}
