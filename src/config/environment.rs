// ABOUTME: Environment-driven configuration for tracking cadence, the remote API, and local storage
// ABOUTME: Every value has a default; RUCK_* variables override it and validate() rejects unusable values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use ruck_core::constants::env_keys;
use ruck_core::constants::sensors::DEFAULT_ACCURACY_THRESHOLD_M;
use ruck_core::constants::sync::{
    DEFAULT_HEART_RATE_BATCH_SIZE, DEFAULT_HEART_RATE_FLUSH_INTERVAL_SECS,
    DEFAULT_LIVENESS_STALE_SECS, DEFAULT_LOCATION_BATCH_SIZE,
    DEFAULT_LOCATION_FLUSH_INTERVAL_SECS, DEFAULT_RETRY_BASE_DELAY_MS,
    DEFAULT_RETRY_JITTER_FACTOR, DEFAULT_RETRY_MAX_DELAY_MS,
};
use ruck_core::errors::{AppError, AppResult};
use ruck_api::http_client::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::tracking::backoff::BackoffPolicy;
use crate::tracking::uploader::UploaderConfig;

/// Default backend when `RUCK_API_BASE_URL` is unset
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// File name of the durable active-session record
const ACTIVE_SESSION_FILE: &str = "active_session.json";

/// Parse `key` when set, falling back to `default` when unset or malformed
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparseable environment value");
            default
        }),
        Err(_) => default,
    }
}

/// Sampling, batching, and retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingConfig {
    /// Readings less accurate than this are dropped
    pub accuracy_threshold_m: f64,
    /// Location points per upload
    pub location_batch_size: usize,
    /// Period of the location time trigger
    pub location_flush_interval: Duration,
    /// Heart-rate samples per upload
    pub heart_rate_batch_size: usize,
    /// Period of the heart-rate time trigger
    pub heart_rate_flush_interval: Duration,
    /// First retry delay
    pub retry_base_delay: Duration,
    /// Retry delay cap
    pub retry_max_delay: Duration,
    /// Random spread applied to retry delays
    pub retry_jitter_factor: f64,
    /// Heartbeat age after which the coordinator counts as stalled
    pub liveness_stale_after: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            accuracy_threshold_m: DEFAULT_ACCURACY_THRESHOLD_M,
            location_batch_size: DEFAULT_LOCATION_BATCH_SIZE,
            location_flush_interval: Duration::from_secs(DEFAULT_LOCATION_FLUSH_INTERVAL_SECS),
            heart_rate_batch_size: DEFAULT_HEART_RATE_BATCH_SIZE,
            heart_rate_flush_interval: Duration::from_secs(DEFAULT_HEART_RATE_FLUSH_INTERVAL_SECS),
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            retry_max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            retry_jitter_factor: DEFAULT_RETRY_JITTER_FACTOR,
            liveness_stale_after: Duration::from_secs(DEFAULT_LIVENESS_STALE_SECS),
        }
    }
}

impl TrackingConfig {
    /// Load from `RUCK_*` variables over the defaults
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            accuracy_threshold_m: env_parse(
                env_keys::ACCURACY_THRESHOLD_M,
                defaults.accuracy_threshold_m,
            ),
            location_batch_size: env_parse(
                env_keys::LOCATION_BATCH_SIZE,
                defaults.location_batch_size,
            ),
            location_flush_interval: Duration::from_secs(env_parse(
                env_keys::LOCATION_FLUSH_INTERVAL_SECS,
                DEFAULT_LOCATION_FLUSH_INTERVAL_SECS,
            )),
            heart_rate_batch_size: env_parse(
                env_keys::HEART_RATE_BATCH_SIZE,
                defaults.heart_rate_batch_size,
            ),
            heart_rate_flush_interval: Duration::from_secs(env_parse(
                env_keys::HEART_RATE_FLUSH_INTERVAL_SECS,
                DEFAULT_HEART_RATE_FLUSH_INTERVAL_SECS,
            )),
            retry_base_delay: Duration::from_millis(env_parse(
                env_keys::RETRY_BASE_DELAY_MS,
                DEFAULT_RETRY_BASE_DELAY_MS,
            )),
            retry_max_delay: Duration::from_millis(env_parse(
                env_keys::RETRY_MAX_DELAY_MS,
                DEFAULT_RETRY_MAX_DELAY_MS,
            )),
            retry_jitter_factor: env_parse(
                env_keys::RETRY_JITTER_FACTOR,
                defaults.retry_jitter_factor,
            ),
            liveness_stale_after: Duration::from_secs(env_parse(
                env_keys::LIVENESS_STALE_SECS,
                DEFAULT_LIVENESS_STALE_SECS,
            )),
        }
    }

    /// Reject values the tracker cannot run with
    ///
    /// # Errors
    ///
    /// Returns `AppError` with `ErrorCode::ConfigInvalid` naming the first bad value.
    pub fn validate(&self) -> AppResult<()> {
        if !self.accuracy_threshold_m.is_finite() || self.accuracy_threshold_m <= 0.0 {
            return Err(AppError::config(format!(
                "accuracy threshold must be positive, got {}",
                self.accuracy_threshold_m
            )));
        }
        if self.location_batch_size == 0 || self.heart_rate_batch_size == 0 {
            return Err(AppError::config("batch sizes must be at least 1"));
        }
        if self.location_flush_interval.is_zero() || self.heart_rate_flush_interval.is_zero() {
            return Err(AppError::config("flush intervals must be non-zero"));
        }
        if self.retry_base_delay.is_zero() || self.retry_max_delay < self.retry_base_delay {
            return Err(AppError::config(
                "retry base delay must be non-zero and not exceed the max delay",
            ));
        }
        if !(0.0..=1.0).contains(&self.retry_jitter_factor) {
            return Err(AppError::config(format!(
                "retry jitter factor must be within 0.0..=1.0, got {}",
                self.retry_jitter_factor
            )));
        }
        if self.liveness_stale_after.is_zero() {
            return Err(AppError::config("liveness stale threshold must be non-zero"));
        }
        Ok(())
    }

    /// Retry delay policy shared by both uploaders
    #[must_use]
    pub const fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy {
            base: self.retry_base_delay,
            max: self.retry_max_delay,
            jitter_factor: self.retry_jitter_factor,
        }
    }

    /// Location uploader settings
    #[must_use]
    pub const fn location_uploader(&self) -> UploaderConfig {
        UploaderConfig {
            batch_size: self.location_batch_size,
            flush_interval: self.location_flush_interval,
            backoff: self.backoff(),
        }
    }

    /// Heart-rate uploader settings
    #[must_use]
    pub const fn heart_rate_uploader(&self) -> UploaderConfig {
        UploaderConfig {
            batch_size: self.heart_rate_batch_size,
            flush_interval: self.heart_rate_flush_interval,
            backoff: self.backoff(),
        }
    }
}

/// Remote API connection settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Backend root, without trailing slash
    pub base_url: String,
    /// Bearer token sent with every request
    pub token: Option<String>,
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    pub connect_timeout_secs: u64,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Load from `RUCK_API_*` variables over the defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            base_url: env::var(env_keys::API_BASE_URL)
                .unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned()),
            token: env::var(env_keys::API_TOKEN).ok().filter(|t| !t.is_empty()),
            timeout_secs: env_parse(env_keys::API_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS),
            connect_timeout_secs: env_parse(
                env_keys::API_CONNECT_TIMEOUT_SECS,
                DEFAULT_CONNECT_TIMEOUT_SECS,
            ),
        }
    }

    /// Reject unusable URLs and timeouts
    ///
    /// # Errors
    ///
    /// Returns `AppError` with `ErrorCode::ConfigInvalid`.
    pub fn validate(&self) -> AppResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(AppError::config(format!(
                "API base URL must start with http:// or https://, got {}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(AppError::config("API timeouts must be non-zero"));
        }
        Ok(())
    }
}

/// Local persistence settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the active-session record
    pub active_session_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(env::temp_dir);
        Self {
            active_session_path: base.join("ruck-tracker").join(ACTIVE_SESSION_FILE),
        }
    }
}

impl StorageConfig {
    /// Load from `RUCK_ACTIVE_SESSION_PATH` over the platform data directory
    #[must_use]
    pub fn from_env() -> Self {
        env::var_os(env_keys::ACTIVE_SESSION_PATH)
            .filter(|p| !p.is_empty())
            .map_or_else(Self::default, |path| Self {
                active_session_path: PathBuf::from(path),
            })
    }

    /// Reject a path that cannot name a file
    ///
    /// # Errors
    ///
    /// Returns `AppError` with `ErrorCode::ConfigInvalid`.
    pub fn validate(&self) -> AppResult<()> {
        if self.active_session_path.file_name().is_none() {
            return Err(AppError::config(format!(
                "active session path {} does not name a file",
                self.active_session_path.display()
            )));
        }
        Ok(())
    }
}

/// Complete tracker configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuckConfig {
    /// Sampling and upload cadence
    pub tracking: TrackingConfig,
    /// Remote API
    pub api: ApiConfig,
    /// Local persistence
    pub storage: StorageConfig,
}

impl RuckConfig {
    /// Load and validate every section from the environment
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn from_env() -> AppResult<Self> {
        let config = Self {
            tracking: TrackingConfig::from_env(),
            api: ApiConfig::from_env(),
            storage: StorageConfig::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn validate(&self) -> AppResult<()> {
        self.tracking.validate()?;
        self.api.validate()?;
        self.storage.validate()
    }
}
