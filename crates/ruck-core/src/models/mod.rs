// ABOUTME: Core data models for the ruck session tracker
// ABOUTME: Re-exports location points, heart-rate samples, sessions, and derived stats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Data Models
//!
//! - `LocationReading` / `LocationPoint`: raw device fix and the accepted point
//! - `HeartRateSample` / `HeartRateSummary`: paired-sensor data
//! - `RuckSession` / `RuckSessionStats`: one tracked activity and its totals
//! - `SessionReview`: rating, exertion, notes, and tags captured at completion

mod heart_rate;
mod location;
mod session;

pub use heart_rate::{HeartRateSample, HeartRateSummary};
pub use location::{LocationPoint, LocationReading};
pub use session::{
    Gender, NewSession, RuckSession, RuckSessionStats, SessionId, SessionReview, SessionStatus,
};
