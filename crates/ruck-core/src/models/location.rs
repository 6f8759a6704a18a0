// ABOUTME: Location reading and accepted location point models
// ABOUTME: Raw platform fixes are validated into immutable points before entering a session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SensorError;

/// Raw position fix as delivered by the platform location service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationReading {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude in metres, absent when the fix has no vertical component
    #[serde(default)]
    pub elevation: Option<f64>,
    /// Horizontal accuracy radius in metres
    pub accuracy: f64,
    /// Time of the fix
    pub timestamp: DateTime<Utc>,
    /// Ground speed in metres per second
    #[serde(default)]
    pub speed: Option<f64>,
}

impl LocationReading {
    /// Check the reading for values no real receiver produces
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidReading` for non-finite or out-of-range
    /// coordinates and for a negative accuracy radius.
    pub fn validate(&self) -> Result<(), SensorError> {
        if !self.latitude.is_finite() || self.latitude.abs() > 90.0 {
            return Err(SensorError::InvalidReading(format!(
                "latitude {} out of range",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || self.longitude.abs() > 180.0 {
            return Err(SensorError::InvalidReading(format!(
                "longitude {} out of range",
                self.longitude
            )));
        }
        if !self.accuracy.is_finite() || self.accuracy < 0.0 {
            return Err(SensorError::InvalidReading(format!(
                "accuracy {} is not a non-negative measurement",
                self.accuracy
            )));
        }
        Ok(())
    }
}

/// Location point accepted into a session
///
/// Fields are only readable; a point never changes after the sampler accepts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    elevation: Option<f64>,
    timestamp: DateTime<Utc>,
    accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    speed: Option<f64>,
}

impl LocationPoint {
    /// Build a point from a reading that already passed validation
    #[must_use]
    pub fn from_reading(reading: &LocationReading) -> Self {
        Self {
            latitude: reading.latitude,
            longitude: reading.longitude,
            elevation: reading.elevation.filter(|e| e.is_finite()),
            timestamp: reading.timestamp,
            accuracy: reading.accuracy,
            speed: reading.speed.filter(|s| s.is_finite() && *s >= 0.0),
        }
    }

    /// Latitude in decimal degrees
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in decimal degrees
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Altitude in metres
    #[must_use]
    pub const fn elevation(&self) -> Option<f64> {
        self.elevation
    }

    /// Time of the fix
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Accuracy radius in metres
    #[must_use]
    pub const fn accuracy(&self) -> f64 {
        self.accuracy
    }

    /// Ground speed in metres per second
    #[must_use]
    pub const fn speed(&self) -> Option<f64> {
        self.speed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(lat: f64, lon: f64, accuracy: f64) -> LocationReading {
        LocationReading {
            latitude: lat,
            longitude: lon,
            elevation: Some(12.0),
            accuracy,
            timestamp: Utc::now(),
            speed: None,
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range_latitude() {
        assert!(reading(91.0, 0.0, 5.0).validate().is_err());
        assert!(reading(f64::NAN, 0.0, 5.0).validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_accuracy() {
        let err = reading(10.0, 10.0, -1.0).validate().unwrap_err();
        assert!(matches!(err, SensorError::InvalidReading(_)));
    }

    #[test]
    fn test_point_drops_non_finite_optional_fields() {
        let mut raw = reading(1.0, 2.0, 3.0);
        raw.elevation = Some(f64::INFINITY);
        raw.speed = Some(-2.0);
        let point = LocationPoint::from_reading(&raw);
        assert_eq!(point.elevation(), None);
        assert_eq!(point.speed(), None);
        assert!((point.latitude() - 1.0).abs() < f64::EPSILON);
    }
}
