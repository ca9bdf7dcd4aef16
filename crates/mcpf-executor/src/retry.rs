// SPDX-License-Identifier: MIT OR Apache-2.0
//! Exponential backoff with two-sided jitter for the retry-eligible
//! transport error kinds.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// Retry knobs: how many extra attempts, and the backoff curve between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Extra attempts after the first. `0` disables retrying.
    pub count: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay per additional attempt.
    pub backoff: f64,
    /// Jitter fraction in `[0.0, 1.0]`; the nominal delay is scaled by
    /// `1 + U(-jitter, jitter)`.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            count: 3,
            base_delay: Duration::from_millis(100),
            backoff: 2.0,
            jitter: 0.2,
        }
    }
}

/// `base_delay · backoff^attempt · (1 ± jitter)`, seeded deterministically
/// from `seed` and `attempt` so a replayed case backs off identically.
pub fn compute_delay(policy: &RetryPolicy, attempt: u32, seed: u64) -> Duration {
    let nominal_ms = (policy.base_delay.as_millis() as f64) * policy.backoff.powi(attempt as i32);
    let jitter = policy.jitter.clamp(0.0, 1.0);
    let factor = if jitter > 0.0 {
        let mut rng = StdRng::seed_from_u64(mix(seed, attempt));
        1.0 + rng.random_range(-jitter..=jitter)
    } else {
        1.0
    };
    let delay_ms = (nominal_ms * factor.max(0.0)).round();
    Duration::from_millis(delay_ms as u64)
}

fn mix(seed: u64, attempt: u32) -> u64 {
    let mut z = seed.wrapping_add((attempt as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
