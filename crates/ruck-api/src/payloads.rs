// ABOUTME: Request and response bodies exchanged with the remote session API
// ABOUTME: Batches carry a stable id so a retried upload is byte-identical to the first attempt
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use chrono::{DateTime, Utc};
use ruck_core::models::{
    HeartRateSample, HeartRateSummary, LocationPoint, RuckSession, SessionId,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Items frozen for one upload request
///
/// The `batch_id` is assigned when the batch is first attempted and reused on
/// every retry, letting the server discard duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch<T> {
    /// Idempotency key for the upload
    pub batch_id: Uuid,
    /// Items in buffer order
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    /// Batch with a fresh id
    #[must_use]
    pub fn new(items: Vec<T>) -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            items,
        }
    }

    /// Number of items in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the batch holds no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Wire body for `POST /api/rucks/{id}/location`
#[derive(Debug, Serialize)]
pub(crate) struct LocationBatchBody<'a> {
    pub batch_id: Uuid,
    pub points: &'a [LocationPoint],
}

impl<'a> From<&'a Batch<LocationPoint>> for LocationBatchBody<'a> {
    fn from(batch: &'a Batch<LocationPoint>) -> Self {
        Self {
            batch_id: batch.batch_id,
            points: &batch.items,
        }
    }
}

/// Wire body for `POST /api/rucks/{id}/heartrate`
#[derive(Debug, Serialize)]
pub(crate) struct HeartRateBatchBody<'a> {
    pub batch_id: Uuid,
    pub samples: &'a [HeartRateSample],
}

impl<'a> From<&'a Batch<HeartRateSample>> for HeartRateBatchBody<'a> {
    fn from(batch: &'a Batch<HeartRateSample>) -> Self {
        Self {
            batch_id: batch.batch_id,
            samples: &batch.items,
        }
    }
}

/// Session as returned by `POST /api/rucks`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteSession {
    /// Identifier assigned by the server
    pub id: SessionId,
}

/// Final stats sent with `POST /api/rucks/{id}/complete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionPayload {
    /// Completion time
    pub completed_at: DateTime<Utc>,
    /// Active seconds
    pub duration_seconds: u64,
    /// Seconds spent paused
    pub paused_duration_seconds: u64,
    /// Total distance
    pub final_distance_km: f64,
    /// Calorie estimate
    pub final_calories_burned: f64,
    /// Minutes per kilometre
    pub final_average_pace: f64,
    /// Total climb
    pub final_elevation_gain: f64,
    /// Total descent
    pub final_elevation_loss: f64,
    /// Mean heart rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_heart_rate: Option<f64>,
    /// Lowest heart rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_heart_rate: Option<u16>,
    /// Highest heart rate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_heart_rate: Option<u16>,
    /// 1-5 rating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// 1-10 exertion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub perceived_exertion: Option<u8>,
    /// Notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Tags
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl CompletionPayload {
    /// Build the payload from a completed session and its heart-rate aggregate
    #[must_use]
    pub fn from_session(session: &RuckSession, heart_rate: &HeartRateSummary) -> Self {
        let stats = &session.stats;
        Self {
            completed_at: session.completed_at.unwrap_or_else(Utc::now),
            duration_seconds: stats.duration_seconds,
            paused_duration_seconds: stats.paused_duration_seconds,
            final_distance_km: stats.distance_km,
            final_calories_burned: stats.calories_burned,
            final_average_pace: stats.average_pace_min_per_km,
            final_elevation_gain: stats.elevation_gain_m,
            final_elevation_loss: stats.elevation_loss_m,
            avg_heart_rate: heart_rate.average_bpm(),
            min_heart_rate: heart_rate.min_bpm,
            max_heart_rate: heart_rate.max_bpm,
            rating: session.review.rating,
            perceived_exertion: session.review.perceived_exertion,
            notes: session.review.notes.clone(),
            tags: session.review.tags.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruck_core::models::LocationReading;

    #[test]
    fn test_location_body_uses_points_field() {
        let point = LocationPoint::from_reading(&LocationReading {
            latitude: 1.0,
            longitude: 2.0,
            elevation: None,
            accuracy: 4.0,
            timestamp: Utc::now(),
            speed: None,
        });
        let batch = Batch::new(vec![point]);
        let json = serde_json::to_value(LocationBatchBody::from(&batch)).unwrap();

        assert_eq!(json["batch_id"], batch.batch_id.to_string());
        assert_eq!(json["points"].as_array().unwrap().len(), 1);
        assert!(json["points"][0].get("elevation").is_none());
    }

    #[test]
    fn test_cloned_batch_keeps_id() {
        let batch = Batch::new(vec![1_u32, 2, 3]);
        let retry = batch.clone();
        assert_eq!(batch, retry);
    }
}
