//! Injectable randomness for the expansion gate.
//!
//! Expansion recurses into a child only when the drawn value exceeds
//! [`RECURSION_GATE`], so graph size varies from run to run. Tests pin the
//! shape with [`SeededRandom::new`] or [`ConstantRandom`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Values strictly above this recurse.
pub const RECURSION_GATE: f64 = 0.5;

/// Source of uniformly distributed values in `[0.0, 1.0)`.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send {
    /// Draw the next value.
    fn next_f64(&mut self) -> f64;
}

/// `StdRng`-backed source; reproducible when seeded.
#[derive(Debug)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Deterministic source for a given seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Always yields the same value. `ConstantRandom(0.0)` never recurses,
/// `ConstantRandom(1.0)` always does.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRandom(pub f64);

impl RandomSource for ConstantRandom {
    fn next_f64(&mut self) -> f64 {
        self.0
    }
}

/// Boxed source for an optional seed.
pub fn source_for(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(SeededRandom::from_entropy()),
    }
}
