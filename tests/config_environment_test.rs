// ABOUTME: Tests for environment-driven tracker configuration
// ABOUTME: Serialized because they mutate process-wide RUCK_* variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use ruck_tracker::config::{RuckConfig, TrackingConfig};
use ruck_tracker::constants::env_keys;
use ruck_tracker::errors::ErrorCode;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

const ALL_KEYS: &[&str] = &[
    env_keys::ACCURACY_THRESHOLD_M,
    env_keys::LOCATION_BATCH_SIZE,
    env_keys::LOCATION_FLUSH_INTERVAL_SECS,
    env_keys::HEART_RATE_BATCH_SIZE,
    env_keys::HEART_RATE_FLUSH_INTERVAL_SECS,
    env_keys::RETRY_BASE_DELAY_MS,
    env_keys::RETRY_MAX_DELAY_MS,
    env_keys::RETRY_JITTER_FACTOR,
    env_keys::LIVENESS_STALE_SECS,
    env_keys::API_BASE_URL,
    env_keys::API_TOKEN,
    env_keys::API_TIMEOUT_SECS,
    env_keys::API_CONNECT_TIMEOUT_SECS,
    env_keys::ACTIVE_SESSION_PATH,
];

fn clear_env() {
    for key in ALL_KEYS {
        env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_unset_environment_yields_defaults() {
    clear_env();
    let config = RuckConfig::from_env().unwrap();
    assert_eq!(config.tracking, TrackingConfig::default());
    assert!(config.api.token.is_none());
    assert!(config.storage.active_session_path.ends_with("active_session.json"));
}

#[test]
#[serial]
fn test_overrides_are_applied() {
    clear_env();
    env::set_var(env_keys::ACCURACY_THRESHOLD_M, "15.5");
    env::set_var(env_keys::LOCATION_BATCH_SIZE, "5");
    env::set_var(env_keys::LOCATION_FLUSH_INTERVAL_SECS, "12");
    env::set_var(env_keys::RETRY_BASE_DELAY_MS, "500");
    env::set_var(env_keys::API_BASE_URL, "https://api.example.test");
    env::set_var(env_keys::API_TOKEN, "abc");
    env::set_var(env_keys::ACTIVE_SESSION_PATH, "/tmp/ruck/active.json");

    let config = RuckConfig::from_env().unwrap();
    assert!((config.tracking.accuracy_threshold_m - 15.5).abs() < f64::EPSILON);
    assert_eq!(config.tracking.location_batch_size, 5);
    assert_eq!(
        config.tracking.location_flush_interval,
        Duration::from_secs(12)
    );
    assert_eq!(config.tracking.retry_base_delay, Duration::from_millis(500));
    assert_eq!(config.api.base_url, "https://api.example.test");
    assert_eq!(config.api.token.as_deref(), Some("abc"));
    assert_eq!(
        config.storage.active_session_path,
        PathBuf::from("/tmp/ruck/active.json")
    );
    clear_env();
}

#[test]
#[serial]
fn test_malformed_value_falls_back_to_default() {
    clear_env();
    env::set_var(env_keys::HEART_RATE_BATCH_SIZE, "lots");
    let config = TrackingConfig::from_env();
    assert_eq!(
        config.heart_rate_batch_size,
        TrackingConfig::default().heart_rate_batch_size
    );
    clear_env();
}

#[test]
#[serial]
fn test_invalid_value_fails_validation() {
    clear_env();
    env::set_var(env_keys::LOCATION_BATCH_SIZE, "0");
    let error = RuckConfig::from_env().unwrap_err();
    assert_eq!(error.code, ErrorCode::ConfigInvalid);
    clear_env();
}

#[test]
#[serial]
fn test_empty_token_is_treated_as_absent() {
    clear_env();
    env::set_var(env_keys::API_TOKEN, "");
    assert!(RuckConfig::from_env().unwrap().api.token.is_none());
    clear_env();
}
