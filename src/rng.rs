//! Random-number source boundary.
//!
//! Number guess needs an unpredictable target. Randomness is an injected
//! capability so tests can script it; the production source is a properly
//! seeded PRNG, never time-derived arithmetic (predictable and
//! low-entropy across rapid successive calls).

use rand::Rng;
use std::sync::Mutex;

/// Uniform integer generation over an inclusive range.
pub trait RandomSource: Send + Sync {
    fn int_in_range(&self, min: i64, max: i64) -> i64;
}

/// Production source backed by the thread-local PRNG.
#[derive(Debug, Default)]
pub struct StdRandomSource;

impl RandomSource for StdRandomSource {
    fn int_in_range(&self, min: i64, max: i64) -> i64 {
        rand::thread_rng().gen_range(min..=max)
    }
}

/// Scripted source for deterministic tests: returns the queued values in
/// order, then falls back to `min`.
#[derive(Debug, Default)]
pub struct FixedRandomSource {
    values: Mutex<Vec<i64>>,
}

impl FixedRandomSource {
    pub fn new(values: Vec<i64>) -> Self {
        Self {
            values: Mutex::new(values),
        }
    }
}

impl RandomSource for FixedRandomSource {
    fn int_in_range(&self, min: i64, _max: i64) -> i64 {
        let mut values = self.values.lock().expect("fixed rng lock poisoned");
        if values.is_empty() {
            min
        } else {
            values.remove(0)
        }
    }
}
