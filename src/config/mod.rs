// ABOUTME: Configuration module for the ruck session tracker
// ABOUTME: Environment-driven tracking, API, and storage settings with validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors
//! Configuration module for the ruck session tracker
//!
//! - **Tracking**: accuracy threshold, batch sizes, flush cadence, retry backoff
//! - **API**: backend URL, bearer token, HTTP timeouts
//! - **Storage**: location of the durable active-session record

/// Environment-driven configuration structs
pub mod environment;

pub use environment::{ApiConfig, RuckConfig, StorageConfig, TrackingConfig};
