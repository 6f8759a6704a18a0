// ABOUTME: Core types and constants for the ruck session tracker
// ABOUTME: Foundation crate with error taxonomy, session models, and tracking defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

#![deny(unsafe_code)]

//! # Ruck Core
//!
//! Foundation crate providing the shared types for the ruck session tracker.
//! It changes rarely so the tracking engine and the API client can compile
//! against a stable base.
//!
//! ## Modules
//!
//! - **errors**: `AppError`/`ErrorCode` plus the sensor, network, and state error taxonomy
//! - **models**: location points, heart-rate samples, sessions, and their derived stats
//! - **constants**: tracking defaults and environment variable names

/// Unified error handling and the tracking error taxonomy
pub mod errors;

/// Tracking defaults and configuration keys
pub mod constants;

/// Session, location, and heart-rate data models
pub mod models;
