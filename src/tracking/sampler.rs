// ABOUTME: Location sampler that filters raw platform fixes by accuracy before a session sees them
// ABOUTME: Accepted points form an append-only, arrival-ordered track for the active session
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use ruck_core::constants::sensors::DEFAULT_ACCURACY_THRESHOLD_M;
use ruck_core::errors::SensorError;
use ruck_core::models::{LocationPoint, LocationReading};
use tracing::debug;

/// Accuracy filter and arrival-ordered track
///
/// Poor-accuracy readings are dropped, never queued. Timestamps are not
/// reordered: consumers must tolerate non-monotonic timestamps from sensor jitter.
#[derive(Debug, Clone)]
pub struct LocationSampler {
    accuracy_threshold_m: f64,
    track: Vec<LocationPoint>,
    rejected: u64,
}

impl Default for LocationSampler {
    fn default() -> Self {
        Self::new(DEFAULT_ACCURACY_THRESHOLD_M)
    }
}

impl LocationSampler {
    /// Sampler dropping readings less accurate than `accuracy_threshold_m`
    #[must_use]
    pub const fn new(accuracy_threshold_m: f64) -> Self {
        Self {
            accuracy_threshold_m,
            track: Vec::new(),
            rejected: 0,
        }
    }

    /// Check a reading without recording it
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidReading` for malformed readings and
    /// `SensorError::AccuracyRejected` when accuracy exceeds the threshold.
    pub fn check(&self, reading: &LocationReading) -> Result<(), SensorError> {
        reading.validate()?;
        if reading.accuracy > self.accuracy_threshold_m {
            return Err(SensorError::AccuracyRejected {
                accuracy_m: reading.accuracy,
                threshold_m: self.accuracy_threshold_m,
            });
        }
        Ok(())
    }

    /// Filter a reading and append it to the track when accepted
    pub fn accept(&mut self, reading: &LocationReading) -> Option<LocationPoint> {
        self.try_accept(reading).ok()
    }

    /// Like [`Self::accept`] but reports why a reading was dropped
    ///
    /// # Errors
    ///
    /// Returns the `SensorError` from [`Self::check`]; the drop is counted.
    pub fn try_accept(&mut self, reading: &LocationReading) -> Result<LocationPoint, SensorError> {
        match self.check(reading) {
            Ok(()) => {
                let point = LocationPoint::from_reading(reading);
                self.track.push(point.clone());
                Ok(point)
            }
            Err(reason) => {
                self.rejected += 1;
                debug!(%reason, "Dropped location reading");
                Err(reason)
            }
        }
    }

    /// Accepted points in arrival order
    #[must_use]
    pub fn track(&self) -> &[LocationPoint] {
        &self.track
    }

    /// Number of accepted points
    #[must_use]
    pub fn accepted_count(&self) -> usize {
        self.track.len()
    }

    /// Number of dropped readings
    #[must_use]
    pub const fn rejected_count(&self) -> u64 {
        self.rejected
    }

    /// Configured accuracy threshold
    #[must_use]
    pub const fn accuracy_threshold_m(&self) -> f64 {
        self.accuracy_threshold_m
    }
}
