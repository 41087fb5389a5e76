//! Injectable randomness for identity selection and timing jitter.
//!
//! Components never reach for a global generator. They receive a
//! [`RandomSource`] at construction, which production code seeds from
//! entropy and tests seed with a fixed value.

use crate::config::ConfigError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Shared handle to a seedable random generator.
///
/// Cloning is cheap and clones draw from the same underlying sequence.
#[derive(Debug, Clone)]
pub struct RandomSource(Arc<Mutex<StdRng>>);

impl RandomSource {
    /// Generator seeded from operating system entropy.
    pub fn from_entropy() -> Self {
        Self(Arc::new(Mutex::new(StdRng::from_entropy())))
    }

    /// Deterministic generator for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }

    /// Uniform index in `0..len`. Returns `None` for an empty range.
    pub fn index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.with_rng(|rng| rng.gen_range(0..len)))
    }

    /// Pick one element uniformly.
    pub fn choose<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|i| &items[i])
    }

    /// Sample a duration uniformly from `range` (both ends inclusive).
    pub fn duration_in(&self, range: &DelayRange) -> Duration {
        let (min, max) = (range.min.as_secs_f64(), range.max.as_secs_f64());
        if max <= min {
            return range.min;
        }
        let secs = self.with_rng(|rng| rng.gen_range(min..=max));
        Duration::from_secs_f64(secs)
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Closed interval of delays to draw jitter from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    min: Duration,
    max: Duration,
}

impl DelayRange {
    /// Build a range, rejecting `min > max`.
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidDelayRange {
                min_ms: min.as_millis(),
                max_ms: max.as_millis(),
            });
        }
        Ok(Self { min, max })
    }

    /// Range in whole seconds. Used for the compile-time defaults.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`; in a `const` item this is a compile error.
    pub const fn from_secs(min: u64, max: u64) -> Self {
        assert!(min <= max, "DelayRange::from_secs: min exceeds max");
        Self {
            min: Duration::from_secs(min),
            max: Duration::from_secs(max),
        }
    }

    /// Lower bound.
    pub fn min(&self) -> Duration {
        self.min
    }

    /// Upper bound.
    pub fn max(&self) -> Duration {
        self.max
    }

    /// Whether `delay` falls inside the range.
    pub fn contains(&self, delay: Duration) -> bool {
        delay >= self.min && delay <= self.max
    }
}
