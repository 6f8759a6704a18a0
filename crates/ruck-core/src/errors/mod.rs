// ABOUTME: Unified application error type with standard codes for configuration and storage
// ABOUTME: Re-exports the sensor, network, and lifecycle error taxonomy used by tracking
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Unified Error Handling System
//!
//! `AppError` carries an `ErrorCode`, a message, and optional context. It is
//! used at the boundaries (configuration, durable storage, the CLI). The
//! tracking core speaks the narrower taxonomy in [`tracking`].

/// Sensor, network, and lifecycle errors raised by the tracking core
pub mod tracking;

pub use tracking::{NetworkError, SensorError, StateError, TrackingError, TrackingResult};

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Validation (3000-3999)
    /// Input failed validation
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,

    // Resource Management (4000-4999)
    /// Lifecycle transition not allowed from the current state
    #[serde(rename = "INVALID_STATE")]
    InvalidState = 4004,

    // External Services (5000-5999)
    /// Remote API returned an error
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// Remote API could not be reached
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,

    // Configuration (6000-6999)
    /// Configuration holds an invalid value
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Durable storage failed
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9002,
    /// Encoding or decoding failed
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::InvalidInput => "The provided input is invalid",
            Self::InvalidState => "The operation is not allowed in the current state",
            Self::ExternalServiceError => "The remote API encountered an error",
            Self::ExternalServiceUnavailable => "The remote API is currently unavailable",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal error occurred",
            Self::StorageError => "Storage operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Session the error relates to, when known
    pub session_id: Option<String>,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            session_id: None,
            source: None,
        }
    }

    /// Attach the session the error relates to
    #[must_use]
    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

impl From<io::Error> for AppError {
    fn from(error: io::Error) -> Self {
        Self::storage(error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

impl From<TrackingError> for AppError {
    fn from(error: TrackingError) -> Self {
        let code = match &error {
            TrackingError::State(_) => ErrorCode::InvalidState,
            TrackingError::Validation(_) => ErrorCode::InvalidInput,
            TrackingError::Network(
                NetworkError::Offline | NetworkError::Transport(_) | NetworkError::Timeout(_),
            ) => {
                ErrorCode::ExternalServiceUnavailable
            }
            TrackingError::Network(_) => ErrorCode::ExternalServiceError,
            TrackingError::Storage(_) => ErrorCode::StorageError,
            TrackingError::Sensor(_) | TrackingError::CoordinatorClosed => {
                ErrorCode::InternalError
            }
        };
        Self::new(code, error.to_string())
    }
}

/// Store failures reach the tracking core as `TrackingError::Storage`
impl From<AppError> for TrackingError {
    fn from(error: AppError) -> Self {
        Self::Storage(error.to_string())
    }
}
