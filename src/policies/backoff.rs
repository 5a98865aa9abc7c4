//! # Backoff between polls after store failures.
//!
//! When a blocking pop fails at the store boundary the poller logs the error
//! and keeps going. [`BackoffPolicy`] decides how long it sleeps first, so a
//! store that is down does not turn the loop into a hot spin.
//!
//! The delay for the `n`-th consecutive failure (0-indexed) is
//! `first × factor^n`, clamped to `max`, then jittered. The base is derived
//! from `n` alone, so jitter never feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use cumin::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(5),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_millis(100));
//! assert_eq!(backoff.next(1), Duration::from_millis(200));
//! assert_eq!(backoff.next(10), Duration::from_secs(5));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delay policy for consecutive pop failures.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Multiplicative growth per consecutive failure (`>= 1.0` recommended).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant 100ms (`factor = 1.0`), capped at 30s, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_millis(100),
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Computes the delay for the given consecutive failure count (0-indexed).
    pub fn next(&self, failures: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = failures.min(i32::MAX as u32) as i32;
        let unclamped = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped)
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(first_ms: u64, max_ms: u64, factor: f64, jitter: JitterPolicy) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter,
        }
    }

    #[test]
    fn first_failure_uses_first() {
        let p = policy(100, 30_000, 2.0, JitterPolicy::None);
        assert_eq!(p.next(0), Duration::from_millis(100));
    }

    #[test]
    fn doubles_until_capped() {
        let p = policy(100, 1_000, 2.0, JitterPolicy::None);
        assert_eq!(p.next(1), Duration::from_millis(200));
        assert_eq!(p.next(2), Duration::from_millis(400));
        assert_eq!(p.next(3), Duration::from_millis(800));
        assert_eq!(p.next(4), Duration::from_secs(1));
        assert_eq!(p.next(u32::MAX), Duration::from_secs(1));
    }

    #[test]
    fn first_larger_than_max_is_clamped() {
        let p = policy(10_000, 5_000, 2.0, JitterPolicy::None);
        assert_eq!(p.next(0), Duration::from_secs(5));
    }

    #[test]
    fn equal_jitter_stays_in_upper_half() {
        let p = policy(1_000, 30_000, 1.0, JitterPolicy::Equal);
        for n in 0..50 {
            let d = p.next(n);
            assert!(d >= Duration::from_millis(500), "{d:?} below half");
            assert!(d <= Duration::from_millis(1_000), "{d:?} above base");
        }
    }

    #[test]
    fn full_jitter_never_exceeds_base() {
        let p = policy(100, 30_000, 2.0, JitterPolicy::Full);
        for n in 0..15 {
            let base = Duration::from_millis(100u64 << n).min(Duration::from_secs(30));
            assert!(p.next(n) <= base);
        }
    }
}
