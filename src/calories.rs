// ABOUTME: Calorie and pace estimates for a rucking session
// ABOUTME: MET-based model adjusted for speed, net grade, and carried load
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

//! # Rucking energy model
//!
//! The MET value starts from a speed band, adds a grade term (uphill scales
//! with speed, gentle downhill helps, steep downhill costs braking effort) and
//! a load term of `0.05` MET per pound carried, capped at `5.0`. The result is
//! clamped to `[2.0, 15.0]` and multiplied by total moved mass and hours, then
//! scaled by the terrain multiplier and a sex factor (`1.0` male, `0.85`
//! female, `0.925` when unspecified).

use ruck_core::constants::physics::{DEFAULT_USER_WEIGHT_KG, KG_TO_LBS, KMH_TO_MPH};
use ruck_core::models::Gender;

/// Walking speed assumed when no duration is known
const FALLBACK_SPEED_KMH: f64 = 5.0;

const MIN_MET: f64 = 2.0;
const MAX_MET: f64 = 15.0;
const MAX_LOAD_MET: f64 = 5.0;

/// Inputs to the energy estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffortInputs {
    /// Body weight; the default is used when absent
    pub user_weight_kg: Option<f64>,
    /// Pack weight
    pub ruck_weight_kg: f64,
    /// Distance covered
    pub distance_km: f64,
    /// Total climb
    pub elevation_gain_m: f64,
    /// Total descent
    pub elevation_loss_m: f64,
    /// Active seconds, zero when unknown
    pub duration_seconds: u64,
    /// Self-reported sex, `None` when not given
    pub gender: Option<Gender>,
    /// Surface energy cost, `1.0` for pavement
    pub terrain_multiplier: f64,
}

fn base_met_for_speed(speed_mph: f64) -> f64 {
    match speed_mph {
        s if s < 2.0 => 2.5,
        s if s < 2.5 => 3.0,
        s if s < 3.0 => 3.5,
        s if s < 3.5 => 4.0,
        s if s < 4.0 => 4.5,
        s if s < 5.0 => 5.0,
        _ => 6.0,
    }
}

fn grade_adjustment(speed_mph: f64, grade_percent: f64) -> f64 {
    if grade_percent > 0.0 {
        grade_percent * 0.6 * (speed_mph / 4.0)
    } else if grade_percent < 0.0 {
        let descent = grade_percent.abs();
        if descent <= 10.0 {
            -descent * 0.1
        } else {
            (descent - 10.0) * 0.15
        }
    } else {
        0.0
    }
}

/// MET for walking at `speed_mph` on `grade_percent` carrying `ruck_lbs`
#[must_use]
pub fn rucking_met(speed_mph: f64, grade_percent: f64, ruck_lbs: f64) -> f64 {
    let load = if ruck_lbs > 0.0 {
        (ruck_lbs * 0.05).min(MAX_LOAD_MET)
    } else {
        0.0
    };
    (base_met_for_speed(speed_mph) + grade_adjustment(speed_mph, grade_percent) + load)
        .clamp(MIN_MET, MAX_MET)
}

/// Estimated kilocalories for the effort
///
/// Returns `0.0` for a non-positive body weight or negative distance.
#[must_use]
pub fn estimate_calories(inputs: &EffortInputs) -> f64 {
    let user_weight_kg = inputs.user_weight_kg.unwrap_or(DEFAULT_USER_WEIGHT_KG);
    if user_weight_kg <= 0.0 || inputs.distance_km < 0.0 || inputs.ruck_weight_kg < 0.0 {
        return 0.0;
    }

    let (speed_kmh, hours) = if inputs.duration_seconds > 0 {
        let hours = inputs.duration_seconds as f64 / 3600.0;
        (inputs.distance_km / hours, hours)
    } else {
        (FALLBACK_SPEED_KMH, inputs.distance_km / FALLBACK_SPEED_KMH)
    };

    let grade_percent = if inputs.distance_km > 0.0 {
        (inputs.elevation_gain_m - inputs.elevation_loss_m) / (inputs.distance_km * 1000.0)
            * 100.0
    } else {
        0.0
    };

    let met = rucking_met(
        speed_kmh * KMH_TO_MPH,
        grade_percent,
        inputs.ruck_weight_kg * KG_TO_LBS,
    );
    let calories = met
        * (user_weight_kg + inputs.ruck_weight_kg)
        * hours
        * inputs.terrain_multiplier
        * Gender::calorie_factor(inputs.gender);
    calories.max(0.0)
}

/// Minutes per kilometre, `0.0` when either input is zero
#[must_use]
pub fn pace_min_per_km(distance_km: f64, duration_seconds: u64) -> f64 {
    if distance_km <= 0.0 || duration_seconds == 0 {
        return 0.0;
    }
    (duration_seconds as f64 / 60.0) / distance_km
}
