// ABOUTME: Exponential retry backoff for batch uploads
// ABOUTME: base x 2^(failures-1), capped at a maximum, with optional proportional jitter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ruck Tracker Contributors

use rand::Rng;
use std::time::Duration;

use ruck_core::constants::sync::{
    DEFAULT_RETRY_BASE_DELAY_MS, DEFAULT_RETRY_JITTER_FACTOR, DEFAULT_RETRY_MAX_DELAY_MS,
};

/// Largest exponent applied before the cap takes over
const MAX_EXPONENT: u32 = 20;

/// Retry delay policy
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failure
    pub base: Duration,
    /// Upper bound on the delay, jitter included
    pub max: Duration,
    /// Fraction of the delay added or removed at random, `0.0` disables jitter
    pub jitter_factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
            max: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            jitter_factor: DEFAULT_RETRY_JITTER_FACTOR,
        }
    }
}

impl BackoffPolicy {
    /// Deterministic policy without jitter
    #[must_use]
    pub const fn fixed(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max,
            jitter_factor: 0.0,
        }
    }

    /// Delay before the next attempt after `consecutive_failures` failures
    ///
    /// Zero failures means no delay.
    #[must_use]
    pub fn delay_for(&self, consecutive_failures: u32) -> Duration {
        if consecutive_failures == 0 {
            return Duration::ZERO;
        }
        let exponent = (consecutive_failures - 1).min(MAX_EXPONENT);
        let delay = self
            .base
            .saturating_mul(2_u32.pow(exponent))
            .min(self.max);

        if self.jitter_factor <= 0.0 {
            return delay;
        }
        let spread = self.jitter_factor.min(1.0);
        let scale = rand::thread_rng().gen_range((1.0 - spread)..=(1.0 + spread));
        delay.mul_f64(scale).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doubles_per_failure() {
        let policy = BackoffPolicy::fixed(Duration::from_secs(2), Duration::from_secs(300));
        assert_eq!(policy.delay_for(0), Duration::ZERO);
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));
    }

    #[test]
    fn test_capped_at_max() {
        let policy = BackoffPolicy::fixed(Duration::from_secs(2), Duration::from_secs(30));
        assert_eq!(policy.delay_for(5), Duration::from_secs(30));
        assert_eq!(policy.delay_for(400), Duration::from_secs(30));
    }

    #[test]
    fn test_jitter_stays_in_band() {
        let policy = BackoffPolicy {
            base: Duration::from_secs(10),
            max: Duration::from_secs(300),
            jitter_factor: 0.1,
        };
        for _ in 0..50 {
            let delay = policy.delay_for(1);
            assert!(delay >= Duration::from_secs(9));
            assert!(delay <= Duration::from_secs(11));
        }
    }
}
