// ABOUTME: Heart-rate sample and per-session summary models
// ABOUTME: Samples are buffered for upload; the summary keeps average, minimum, and maximum
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::sensors::{MAX_HEART_RATE_BPM, MIN_HEART_RATE_BPM};
use crate::errors::SensorError;

/// Single heart-rate measurement from a paired sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    /// Beats per minute
    pub bpm: u16,
    /// Time of the measurement
    pub timestamp: DateTime<Utc>,
}

impl HeartRateSample {
    /// Create a sample
    #[must_use]
    pub const fn new(bpm: u16, timestamp: DateTime<Utc>) -> Self {
        Self { bpm, timestamp }
    }

    /// Reject values outside the physiological range
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidReading` when `bpm` is outside the plausible range.
    pub fn validate(&self) -> Result<(), SensorError> {
        if (MIN_HEART_RATE_BPM..=MAX_HEART_RATE_BPM).contains(&self.bpm) {
            Ok(())
        } else {
            Err(SensorError::InvalidReading(format!(
                "heart rate {} bpm outside {MIN_HEART_RATE_BPM}..={MAX_HEART_RATE_BPM}",
                self.bpm
            )))
        }
    }
}

/// Running aggregate over every accepted sample of a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartRateSummary {
    /// Number of samples folded in
    pub sample_count: u64,
    /// Lowest bpm seen
    pub min_bpm: Option<u16>,
    /// Highest bpm seen
    pub max_bpm: Option<u16>,
    /// Sum of bpm values, kept to derive the average without rounding drift
    #[serde(skip)]
    bpm_total: u64,
}

impl HeartRateSummary {
    /// Fold a sample into the aggregate
    pub fn record(&mut self, sample: &HeartRateSample) {
        self.sample_count += 1;
        self.bpm_total += u64::from(sample.bpm);
        self.min_bpm = Some(self.min_bpm.map_or(sample.bpm, |m| m.min(sample.bpm)));
        self.max_bpm = Some(self.max_bpm.map_or(sample.bpm, |m| m.max(sample.bpm)));
    }

    /// Mean bpm, `None` before the first sample
    #[must_use]
    pub fn average_bpm(&self) -> Option<f64> {
        (self.sample_count > 0).then(|| self.bpm_total as f64 / self.sample_count as f64)
    }
}
