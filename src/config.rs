//! Simulation parameters and random source construction.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::convergence::ConvergenceConfig;
use crate::sequence::ScrambleMode;

pub const DEFAULT_N: usize = 4;
pub const DEFAULT_BATCH_SIZE: usize = 1 << 16;
pub const DEFAULT_MAX_ITERATIONS: usize = 1 << 10;
pub const DEFAULT_EPSILON: f64 = 0.1;

/// Above this `n` full convergence takes too long; the driver only explores
/// how many distinct balanced sequences show up.
pub const EXPLORATION_THRESHOLD: usize = 10;

/// Errors for parameter combinations the simulation cannot run with
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("batch size must be at least 1")]
    EmptyBatch,

    #[error("iteration budget must be at least 1")]
    NoIterations,

    #[error("epsilon must be a positive finite number, got {0}")]
    InvalidEpsilon(f64),
}

/// Top-level configuration for one simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Half-length parameter: sequences have `n` up-steps and `n + 1` down-steps
    pub n: usize,

    /// Sequences sampled per iteration
    pub batch_size: usize,

    /// Iteration budget before declaring non-convergence
    pub max_iterations: usize,

    /// Tolerance; the acceptance bound is `epsilon / distinct_count`
    pub epsilon: f64,

    /// Fixed seed for reproducible runs; entropy-seeded when `None`
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            batch_size: DEFAULT_BATCH_SIZE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            epsilon: DEFAULT_EPSILON,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::EmptyBatch);
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::NoIterations);
        }
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        Ok(())
    }

    /// Whether `n` is small enough to run the full convergence loop.
    pub fn runs_to_convergence(&self) -> bool {
        self.n <= EXPLORATION_THRESHOLD
    }

    /// The random source for this run, created once and shared by every draw.
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }

    pub fn convergence(&self) -> ConvergenceConfig {
        ConvergenceConfig {
            n: self.n,
            batch_size: self.batch_size,
            epsilon: self.epsilon,
            max_iterations: self.max_iterations,
            mode: ScrambleMode::Uniform,
        }
    }
}
