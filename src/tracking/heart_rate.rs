// ABOUTME: Heart-rate sample buffering and summary, decoupled from location uploads
// ABOUTME: Stops accepting on sensor disconnect while keeping buffered samples for later flush
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use ruck_core::errors::SensorError;
use ruck_core::models::{HeartRateSample, HeartRateSummary, SessionId};
use tracing::{debug, info};

use super::uploader::{BatchUploader, UploaderConfig};

/// Heart-rate buffer with its own upload cadence
#[derive(Debug)]
pub struct HeartRateAggregator {
    uploader: BatchUploader<HeartRateSample>,
    summary: HeartRateSummary,
    connected: bool,
}

impl HeartRateAggregator {
    /// Aggregator for `session_id` with a connected sensor
    #[must_use]
    pub fn new(session_id: SessionId, config: UploaderConfig) -> Self {
        Self {
            uploader: BatchUploader::new("heart_rate", session_id, config),
            summary: HeartRateSummary::default(),
            connected: true,
        }
    }

    /// Accept a sample; `Ok(true)` when the size trigger is reached
    ///
    /// # Errors
    ///
    /// Returns `SensorError::Disconnected` while the sensor is disconnected and
    /// `SensorError::InvalidReading` for an implausible bpm.
    pub fn accept(&mut self, sample: HeartRateSample) -> Result<bool, SensorError> {
        if !self.connected {
            return Err(SensorError::Disconnected);
        }
        sample.validate()?;
        self.summary.record(&sample);
        Ok(self.uploader.push(sample))
    }

    /// Sensor link dropped; buffered samples are kept
    pub fn sensor_disconnected(&mut self) {
        if self.connected {
            self.connected = false;
            info!(buffered = self.uploader.len(), "Heart-rate sensor disconnected");
        }
    }

    /// Sensor link restored
    pub fn sensor_reconnected(&mut self) {
        if !self.connected {
            self.connected = true;
            debug!("Heart-rate sensor reconnected");
        }
    }

    /// Whether samples are currently accepted
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    /// Aggregate over every accepted sample
    #[must_use]
    pub const fn summary(&self) -> &HeartRateSummary {
        &self.summary
    }

    /// Underlying uploader
    #[must_use]
    pub const fn uploader(&self) -> &BatchUploader<HeartRateSample> {
        &self.uploader
    }

    /// Mutable access for connectivity changes and discards
    pub fn uploader_mut(&mut self) -> &mut BatchUploader<HeartRateSample> {
        &mut self.uploader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::backoff::BackoffPolicy;
    use chrono::Utc;
    use std::time::Duration;

    fn aggregator() -> HeartRateAggregator {
        HeartRateAggregator::new(
            SessionId::from("s-1"),
            UploaderConfig {
                batch_size: 3,
                flush_interval: Duration::from_secs(60),
                backoff: BackoffPolicy::fixed(Duration::from_secs(1), Duration::from_secs(8)),
            },
        )
    }

    #[test]
    fn test_disconnect_keeps_buffer_and_rejects_new_samples() {
        let mut hr = aggregator();
        let now = Utc::now();
        hr.accept(HeartRateSample::new(120, now)).unwrap();
        hr.sensor_disconnected();

        assert_eq!(
            hr.accept(HeartRateSample::new(121, now)),
            Err(SensorError::Disconnected)
        );
        assert_eq!(hr.uploader().len(), 1);

        hr.sensor_reconnected();
        assert!(hr.accept(HeartRateSample::new(122, now)).is_ok());
        assert_eq!(hr.summary().sample_count, 2);
    }

    #[test]
    fn test_implausible_bpm_not_buffered() {
        let mut hr = aggregator();
        assert!(hr.accept(HeartRateSample::new(0, Utc::now())).is_err());
        assert!(hr.uploader().is_empty());
        assert_eq!(hr.summary().sample_count, 0);
    }

    #[test]
    fn test_size_trigger() {
        let mut hr = aggregator();
        let now = Utc::now();
        assert_eq!(hr.accept(HeartRateSample::new(100, now)), Ok(false));
        assert_eq!(hr.accept(HeartRateSample::new(101, now)), Ok(false));
        assert_eq!(hr.accept(HeartRateSample::new(102, now)), Ok(true));
    }
}
