// ABOUTME: Ruck session, lifecycle status, derived stats, and completion review models
// ABOUTME: The session exclusively owns its stats; the remote API is the system of record
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::review::{
    MAX_PERCEIVED_EXERTION, MAX_RATING, MIN_PERCEIVED_EXERTION, MIN_RATING,
};
use crate::errors::TrackingError;

/// Identifier assigned to a session by the remote API
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an identifier returned by the API
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created on the server, tracking not yet started
    Created,
    /// Actively recording
    InProgress,
    /// Recording suspended by the user
    Paused,
    /// Finished; stats are frozen
    Completed,
}

impl SessionStatus {
    /// Whether location and heart-rate data are currently accumulated
    #[must_use]
    pub const fn is_recording(self) -> bool {
        matches!(self, Self::InProgress)
    }

    /// Whether the session can still change
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Wire name used by the remote API
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-reported sex, used to scale the calorie estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Baseline energy cost
    Male,
    /// About 15% lower energy cost
    Female,
}

impl Gender {
    /// Factor applied to the calorie estimate; unspecified sits between the two
    #[must_use]
    pub const fn calorie_factor(gender: Option<Self>) -> f64 {
        match gender {
            Some(Self::Male) => 1.0,
            Some(Self::Female) => 0.85,
            None => 0.925,
        }
    }
}

const fn default_terrain_multiplier() -> f64 {
    1.0
}

/// Parameters for creating a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSession {
    /// Weight carried in the pack
    pub ruck_weight_kg: f64,
    /// Body weight, used for the calorie estimate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_weight_kg: Option<f64>,
    /// Self-reported sex for the calorie estimate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// Energy cost of the surface, `1.0` for pavement
    #[serde(default = "default_terrain_multiplier")]
    pub terrain_multiplier: f64,
    /// Planned length of the session
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_duration_minutes: Option<u32>,
    /// Free-form notes entered before starting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewSession {
    /// Session carrying `ruck_weight_kg` with no other details
    #[must_use]
    pub const fn with_ruck_weight(ruck_weight_kg: f64) -> Self {
        Self {
            ruck_weight_kg,
            user_weight_kg: None,
            gender: None,
            terrain_multiplier: 1.0,
            planned_duration_minutes: None,
            notes: None,
        }
    }

    /// Reject negative or non-finite weights
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Validation` when a weight is not a usable measurement.
    pub fn validate(&self) -> Result<(), TrackingError> {
        if !self.ruck_weight_kg.is_finite() || self.ruck_weight_kg < 0.0 {
            return Err(TrackingError::Validation(format!(
                "ruck weight {} kg is invalid",
                self.ruck_weight_kg
            )));
        }
        if let Some(weight) = self.user_weight_kg {
            if !weight.is_finite() || weight <= 0.0 {
                return Err(TrackingError::Validation(format!(
                    "user weight {weight} kg is invalid"
                )));
            }
        }
        if !self.terrain_multiplier.is_finite() || self.terrain_multiplier <= 0.0 {
            return Err(TrackingError::Validation(format!(
                "terrain multiplier {} is invalid",
                self.terrain_multiplier
            )));
        }
        Ok(())
    }
}

/// Rating and notes captured when a session is completed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReview {
    /// 1-5 star rating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// 1-10 perceived exertion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceived_exertion: Option<u8>,
    /// Notes entered after finishing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// User-defined tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl SessionReview {
    /// Check score bounds
    ///
    /// # Errors
    ///
    /// Returns `TrackingError::Validation` when a score is outside its range.
    pub fn validate(&self) -> Result<(), TrackingError> {
        if let Some(rating) = self.rating {
            if !(MIN_RATING..=MAX_RATING).contains(&rating) {
                return Err(TrackingError::Validation(format!(
                    "rating {rating} outside {MIN_RATING}..={MAX_RATING}"
                )));
            }
        }
        if let Some(exertion) = self.perceived_exertion {
            if !(MIN_PERCEIVED_EXERTION..=MAX_PERCEIVED_EXERTION).contains(&exertion) {
                return Err(TrackingError::Validation(format!(
                    "perceived exertion {exertion} outside {MIN_PERCEIVED_EXERTION}..={MAX_PERCEIVED_EXERTION}"
                )));
            }
        }
        Ok(())
    }
}

/// Totals derived from the accepted location points of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RuckSessionStats {
    /// Cumulative great-circle distance
    pub distance_km: f64,
    /// Sum of positive altitude deltas
    pub elevation_gain_m: f64,
    /// Sum of absolute negative altitude deltas
    pub elevation_loss_m: f64,
    /// Estimated energy expenditure
    pub calories_burned: f64,
    /// Active time, excluding pauses
    pub duration_seconds: u64,
    /// Time spent paused
    pub paused_duration_seconds: u64,
    /// Minutes per kilometre over the active time
    pub average_pace_min_per_km: f64,
}

/// One tracked rucking activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuckSession {
    /// Identifier assigned by the API
    pub id: SessionId,
    /// Lifecycle status
    pub status: SessionStatus,
    /// Weight carried
    pub ruck_weight_kg: f64,
    /// Body weight
    pub user_weight_kg: Option<f64>,
    /// Self-reported sex
    pub gender: Option<Gender>,
    /// Surface energy multiplier
    pub terrain_multiplier: f64,
    /// Planned length
    pub planned_duration_minutes: Option<u32>,
    /// Review captured at completion
    pub review: SessionReview,
    /// When the API created the session
    pub created_at: DateTime<Utc>,
    /// When tracking started
    pub started_at: Option<DateTime<Utc>>,
    /// When the current pause began
    pub paused_at: Option<DateTime<Utc>>,
    /// When the session completed
    pub completed_at: Option<DateTime<Utc>>,
    /// Derived totals
    pub stats: RuckSessionStats,
}

impl RuckSession {
    /// Session in `created` status
    #[must_use]
    pub fn new(id: SessionId, params: &NewSession, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status: SessionStatus::Created,
            ruck_weight_kg: params.ruck_weight_kg,
            user_weight_kg: params.user_weight_kg,
            gender: params.gender,
            terrain_multiplier: params.terrain_multiplier,
            planned_duration_minutes: params.planned_duration_minutes,
            review: SessionReview {
                notes: params.notes.clone(),
                ..SessionReview::default()
            },
            created_at,
            started_at: None,
            paused_at: None,
            completed_at: None,
            stats: RuckSessionStats::default(),
        }
    }

    /// Pace at completion, `None` until the session is finished
    #[must_use]
    pub fn final_pace_min_per_km(&self) -> Option<f64> {
        self.status
            .is_terminal()
            .then_some(self.stats.average_pace_min_per_km)
    }

    /// Net elevation at completion, `None` until the session is finished
    #[must_use]
    pub fn final_net_elevation_m(&self) -> Option<f64> {
        self.status
            .is_terminal()
            .then(|| self.stats.elevation_gain_m - self.stats.elevation_loss_m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_review_bounds() {
        let ok = SessionReview {
            rating: Some(5),
            perceived_exertion: Some(7),
            ..SessionReview::default()
        };
        assert!(ok.validate().is_ok());

        let bad = SessionReview {
            rating: Some(6),
            ..SessionReview::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_new_session_rejects_negative_weight() {
        assert!(NewSession::with_ruck_weight(-1.0).validate().is_err());
        assert!(NewSession::with_ruck_weight(20.0).validate().is_ok());
    }

    #[test]
    fn test_new_session_rejects_non_positive_terrain() {
        let flat = NewSession {
            terrain_multiplier: 0.0,
            ..NewSession::with_ruck_weight(20.0)
        };
        assert!(flat.validate().is_err());
    }

    #[test]
    fn test_terrain_multiplier_defaults_when_absent() {
        let params: NewSession = serde_json::from_str(r#"{"ruck_weight_kg": 20.0}"#).unwrap();
        assert!((params.terrain_multiplier - 1.0).abs() < f64::EPSILON);
        assert_eq!(params.gender, None);
    }

    #[test]
    fn test_final_values_only_after_completion() {
        let mut session = RuckSession::new(
            SessionId::from("abc"),
            &NewSession::with_ruck_weight(10.0),
            Utc::now(),
        );
        assert_eq!(session.final_pace_min_per_km(), None);
        session.status = SessionStatus::Completed;
        session.stats.elevation_gain_m = 13.0;
        session.stats.elevation_loss_m = 3.0;
        assert_eq!(session.final_net_elevation_m(), Some(10.0));
    }
}
