// ABOUTME: Tracking defaults and environment variable names for the ruck session tracker
// ABOUTME: Accuracy thresholds, batch cadences, backoff bounds, and physical constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Constants Module
//!
//! Hardcoded defaults used when no environment override is present.

/// Physical and unit-conversion constants
pub mod physics {
    /// Mean Earth radius used for great-circle distance
    pub const EARTH_RADIUS_KM: f64 = 6371.0;

    /// Kilometres per hour to miles per hour
    pub const KMH_TO_MPH: f64 = 0.621_371;

    /// Kilograms to pounds
    pub const KG_TO_LBS: f64 = 2.204_62;

    /// Body weight assumed when the user has not recorded one
    pub const DEFAULT_USER_WEIGHT_KG: f64 = 70.0;
}

/// Sensor acceptance limits
pub mod sensors {
    /// Maximum GPS error radius in metres for a point to be trusted
    pub const DEFAULT_ACCURACY_THRESHOLD_M: f64 = 10.0;

    /// Lowest plausible heart rate from a paired sensor
    pub const MIN_HEART_RATE_BPM: u16 = 20;

    /// Highest plausible heart rate from a paired sensor
    pub const MAX_HEART_RATE_BPM: u16 = 250;
}

/// Batch upload cadence and retry defaults
pub mod sync {
    /// Location points per upload request
    pub const DEFAULT_LOCATION_BATCH_SIZE: usize = 20;

    /// Seconds between timed location flushes
    pub const DEFAULT_LOCATION_FLUSH_INTERVAL_SECS: u64 = 30;

    /// Heart-rate samples per upload request
    pub const DEFAULT_HEART_RATE_BATCH_SIZE: usize = 60;

    /// Seconds between timed heart-rate flushes
    pub const DEFAULT_HEART_RATE_FLUSH_INTERVAL_SECS: u64 = 60;

    /// First retry delay after a failed flush
    pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 2_000;

    /// Upper bound on the retry delay
    pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 300_000;

    /// Fraction of the computed delay added as random jitter
    pub const DEFAULT_RETRY_JITTER_FACTOR: f64 = 0.1;

    /// Seconds without a heartbeat before a coordinator counts as stalled
    pub const DEFAULT_LIVENESS_STALE_SECS: u64 = 120;

    /// Capacity of the coordinator event channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 256;

    /// Buffered items per uploader between backlog warnings
    pub const BACKLOG_WARN_ITEMS: usize = 5_000;
}

/// Session review bounds
pub mod review {
    /// Lowest star rating
    pub const MIN_RATING: u8 = 1;
    /// Highest star rating
    pub const MAX_RATING: u8 = 5;
    /// Lowest perceived exertion score
    pub const MIN_PERCEIVED_EXERTION: u8 = 1;
    /// Highest perceived exertion score
    pub const MAX_PERCEIVED_EXERTION: u8 = 10;
}

/// Environment variable names read by the configuration layer
pub mod env_keys {
    /// Accuracy threshold in metres
    pub const ACCURACY_THRESHOLD_M: &str = "RUCK_ACCURACY_THRESHOLD_M";
    /// Location batch size
    pub const LOCATION_BATCH_SIZE: &str = "RUCK_LOCATION_BATCH_SIZE";
    /// Location flush interval in seconds
    pub const LOCATION_FLUSH_INTERVAL_SECS: &str = "RUCK_LOCATION_FLUSH_INTERVAL_SECS";
    /// Heart-rate batch size
    pub const HEART_RATE_BATCH_SIZE: &str = "RUCK_HEART_RATE_BATCH_SIZE";
    /// Heart-rate flush interval in seconds
    pub const HEART_RATE_FLUSH_INTERVAL_SECS: &str = "RUCK_HEART_RATE_FLUSH_INTERVAL_SECS";
    /// Retry base delay in milliseconds
    pub const RETRY_BASE_DELAY_MS: &str = "RUCK_RETRY_BASE_DELAY_MS";
    /// Retry delay cap in milliseconds
    pub const RETRY_MAX_DELAY_MS: &str = "RUCK_RETRY_MAX_DELAY_MS";
    /// Retry jitter factor
    pub const RETRY_JITTER_FACTOR: &str = "RUCK_RETRY_JITTER_FACTOR";
    /// Liveness stale threshold in seconds
    pub const LIVENESS_STALE_SECS: &str = "RUCK_LIVENESS_STALE_SECS";
    /// Remote API base URL
    pub const API_BASE_URL: &str = "RUCK_API_BASE_URL";
    /// Bearer token for the remote API
    pub const API_TOKEN: &str = "RUCK_API_TOKEN";
    /// HTTP request timeout in seconds
    pub const API_TIMEOUT_SECS: &str = "RUCK_API_TIMEOUT_SECS";
    /// HTTP connect timeout in seconds
    pub const API_CONNECT_TIMEOUT_SECS: &str = "RUCK_API_CONNECT_TIMEOUT_SECS";
    /// Path of the durable active-session record
    pub const ACTIVE_SESSION_PATH: &str = "RUCK_ACTIVE_SESSION_PATH";
}

/// Service identity used in logs and HTTP headers
pub mod service_names {
    /// Name reported in structured logs
    pub const RUCK_TRACKER: &str = "ruck-tracker";
}
