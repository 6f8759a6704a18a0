// ABOUTME: Main library entry point for the ruck session tracker
// ABOUTME: Samples location and heart rate, tracks session stats, and batches uploads to the backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

#![deny(unsafe_code)]

//! # Ruck Tracker
//!
//! Session-tracking core for rucking (walking with a weighted pack).
//!
//! ## Features
//!
//! - **Accuracy filtering**: low-quality GPS fixes never reach stats or uploads
//! - **Session lifecycle**: start, pause, resume, and complete with frozen final stats
//! - **Derived stats**: great-circle distance, elevation gain and loss, pace, calories
//! - **Offline tolerant uploads**: bounded, idempotent batches with exponential backoff
//! - **Heart rate**: independent buffering with min, max, and average summary
//!
//! ## Architecture
//!
//! - **Tracking**: sampler, state machine, uploaders, and the per-session coordinator
//! - **Sensors**: capability traits for location and heart-rate sources
//! - **Persistence**: durable record of the active session
//! - **Liveness**: heartbeat monitoring of the coordinator task
//! - **Config**: environment-driven settings
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ruck_tracker::api::HttpRuckApi;
//! use ruck_tracker::config::RuckConfig;
//! use ruck_tracker::models::NewSession;
//! use ruck_tracker::persistence::JsonFileStore;
//! use ruck_tracker::tracking::{CoordinatorDeps, SessionCoordinator, SystemClock};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = RuckConfig::from_env()?;
//! let deps = CoordinatorDeps {
//!     api: Arc::new(HttpRuckApi::new(&config.api.base_url, config.api.token.clone())),
//!     store: Arc::new(JsonFileStore::new(&config.storage.active_session_path)),
//!     clock: Arc::new(SystemClock),
//! };
//! let active =
//!     SessionCoordinator::start(deps, &config.tracking, &NewSession::with_ruck_weight(20.0))
//!         .await?;
//! let report = active.handle.complete(Default::default()).await?;
//! println!("{} km", report.snapshot.session.stats.distance_km);
//! # Ok(())
//! # }
//! ```

/// Calorie and pace estimates
pub mod calories;
/// Environment-driven configuration
pub mod config;
/// Great-circle distance and elevation deltas
pub mod geo;
/// Coordinator heartbeat monitoring
pub mod liveness;
/// Logging setup
pub mod logging;
/// Durable active-session record
pub mod persistence;
/// Location and heart-rate source traits
pub mod sensors;
/// Session tracking engine
pub mod tracking;

/// Remote API client
pub use ruck_api as api;
/// Error taxonomy
pub use ruck_core::errors;
/// Domain models
pub use ruck_core::models;
/// Defaults and environment keys
pub use ruck_core::constants;
