// ABOUTME: Error taxonomy for the session tracking core
// ABOUTME: Sensor errors are dropped, network errors retried, state errors returned to callers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Tracking Error Types
//!
//! - `SensorError`: a reading was rejected or the sensor went away. Recovered
//!   locally by dropping the reading.
//! - `NetworkError`: a flush failed. Recovered by retry with backoff.
//! - `StateError`: a lifecycle transition was refused. Returned synchronously.

use thiserror::Error;

use crate::models::SessionStatus;

/// Errors raised while validating sensor readings
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SensorError {
    /// Reported accuracy radius exceeds the configured threshold
    #[error("accuracy {accuracy_m:.1} m exceeds threshold {threshold_m:.1} m")]
    AccuracyRejected {
        /// Accuracy reported by the device
        accuracy_m: f64,
        /// Configured threshold
        threshold_m: f64,
    },
    /// Reading carries values no real sensor produces
    #[error("invalid reading: {0}")]
    InvalidReading(String),
    /// Paired sensor is no longer delivering data
    #[error("sensor disconnected")]
    Disconnected,
}

/// Errors raised while flushing buffered data to the remote API
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NetworkError {
    /// Device reports no connectivity
    #[error("device is offline")]
    Offline,
    /// Request never produced a response
    #[error("transport failure: {0}")]
    Transport(String),
    /// Request exceeded the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),
    /// Remote API answered with a non-success status
    #[error("remote API returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },
    /// Payload could not be encoded or the response decoded
    #[error("payload encoding failed: {0}")]
    Encoding(String),
}

impl NetworkError {
    /// Whether the same request may succeed if sent again later
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Offline | Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::Encoding(_) => false,
        }
    }
}

/// Lifecycle transition refused by the session state machine
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StateError {
    /// The requested action is not legal from the current status
    #[error("cannot {action} a session that is {from}")]
    InvalidTransition {
        /// Status the session was in
        from: SessionStatus,
        /// Action that was requested
        action: &'static str,
    },
    /// A location or heart-rate event arrived for a session that is not recording
    #[error("session is {0}, not recording")]
    NotRecording(SessionStatus),
}

/// Umbrella error for the tracking core
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TrackingError {
    /// Sensor reading rejected
    #[error(transparent)]
    Sensor(#[from] SensorError),
    /// Flush failed
    #[error(transparent)]
    Network(#[from] NetworkError),
    /// Lifecycle transition refused
    #[error(transparent)]
    State(#[from] StateError),
    /// Caller supplied invalid data (review scores, weights)
    #[error("validation failed: {0}")]
    Validation(String),
    /// Durable active-session record could not be written or read
    #[error("storage failed: {0}")]
    Storage(String),
    /// Coordinator task has already shut down
    #[error("session coordinator is no longer running")]
    CoordinatorClosed,
}

impl TrackingError {
    /// Whether retrying the operation later may succeed
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            Self::Storage(_) => true,
            Self::Sensor(_) | Self::State(_) | Self::Validation(_) | Self::CoordinatorClosed => {
                false
            }
        }
    }
}

/// Result alias for tracking operations
pub type TrackingResult<T> = Result<T, TrackingError>;
