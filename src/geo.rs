// ABOUTME: Great-circle distance and elevation delta helpers for accepted location points
// ABOUTME: Haversine on a spherical Earth; missing altitudes contribute no climb or descent
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use ruck_core::constants::physics::EARTH_RADIUS_KM;
use ruck_core::models::LocationPoint;

/// Haversine distance between two coordinates in kilometres
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Distance between two accepted points in kilometres
#[must_use]
pub fn distance_between_km(from: &LocationPoint, to: &LocationPoint) -> f64 {
    haversine_km(from.latitude(), from.longitude(), to.latitude(), to.longitude())
}

/// Climb and descent between two points as `(gain_m, loss_m)`
///
/// Both values are non-negative. If either point lacks an altitude the
/// transition contributes `(0.0, 0.0)`.
#[must_use]
pub fn elevation_delta_m(from: &LocationPoint, to: &LocationPoint) -> (f64, f64) {
    match (from.elevation(), to.elevation()) {
        (Some(a), Some(b)) => {
            let delta = b - a;
            if delta > 0.0 {
                (delta, 0.0)
            } else {
                (0.0, -delta)
            }
        }
        _ => (0.0, 0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let dist = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((dist - 111.195).abs() < 0.01);
    }

    #[test]
    fn test_same_point_is_zero() {
        assert!(haversine_km(51.5, -0.12, 51.5, -0.12).abs() < f64::EPSILON);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = haversine_km(40.0, -105.0, 40.01, -105.02);
        let b = haversine_km(40.01, -105.02, 40.0, -105.0);
        assert!((a - b).abs() < 1e-12);
    }
}
