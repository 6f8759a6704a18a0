// ABOUTME: Shared test utilities and fixtures for ruck tracker integration tests
// ABOUTME: Quiet logging setup, reading builders, and an in-memory coordinator harness
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `ruck_tracker`

use chrono::{DateTime, Duration, TimeZone, Utc};
use ruck_tracker::api::InMemoryRuckApi;
use ruck_tracker::config::TrackingConfig;
use ruck_tracker::models::{HeartRateSample, LocationReading, NewSession};
use ruck_tracker::persistence::MemoryStore;
use ruck_tracker::tracking::{ActiveSession, CoordinatorDeps, ManualClock, SessionCoordinator};
use std::env;
use std::sync::{Arc, Once};
use tracing::Level;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => Level::TRACE,
            Ok("DEBUG") => Level::DEBUG,
            Ok("INFO") => Level::INFO,
            _ => Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fixed start time for deterministic durations
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
}

/// Reading with good accuracy at `seconds` after [`t0`]
pub fn reading(latitude: f64, elevation: Option<f64>, seconds: i64) -> LocationReading {
    LocationReading {
        latitude,
        longitude: 0.0,
        elevation,
        accuracy: 5.0,
        timestamp: t0() + Duration::seconds(seconds),
        speed: None,
    }
}

/// Heart-rate sample at `seconds` after [`t0`]
pub fn pulse(bpm: u16, seconds: i64) -> HeartRateSample {
    HeartRateSample::new(bpm, t0() + Duration::seconds(seconds))
}

/// Tracking config whose size triggers never fire in small tests
pub fn quiet_config() -> TrackingConfig {
    TrackingConfig {
        location_batch_size: 100,
        heart_rate_batch_size: 100,
        ..TrackingConfig::default()
    }
}

/// Coordinator wired to in-memory services
pub struct Harness {
    pub api: Arc<InMemoryRuckApi>,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
    pub active: ActiveSession,
}

impl Harness {
    /// Start a 20 kg session with `config`
    pub async fn start(config: &TrackingConfig) -> Self {
        init_test_logging();
        let api = Arc::new(InMemoryRuckApi::new());
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(t0());
        let deps = CoordinatorDeps {
            api: api.clone(),
            store: store.clone(),
            clock: Arc::new(clock.clone()),
        };
        let params = NewSession {
            user_weight_kg: Some(80.0),
            ..NewSession::with_ruck_weight(20.0)
        };
        let active = SessionCoordinator::start(deps, config, &params)
            .await
            .unwrap();
        Self {
            api,
            store,
            clock,
            active,
        }
    }

    /// Fresh services sharing this harness's backend, store, and clock
    pub fn deps(&self) -> CoordinatorDeps {
        CoordinatorDeps {
            api: self.api.clone(),
            store: self.store.clone(),
            clock: Arc::new(self.clock.clone()),
        }
    }
}
