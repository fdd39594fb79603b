//! # Balance
//!
//! Empirical check of the cycle lemma: scramble `n` up-steps and `n + 1`
//! down-steps uniformly, rotate the result at its lowest valley while dropping
//! the valley step, and test whether the balanced sequences that come out are
//! uniformly distributed.
//!
//! Randomness flows through an explicit generator passed `&mut` into every
//! operation that draws, so a fixed seed reproduces a run exactly.

pub mod prefix;
pub mod sequence;
pub mod frequency;
pub mod stats;
pub mod convergence;
pub mod config;
pub mod render;

// Re-export core types for easy access
pub use prefix::{non_neg_prefix_sum, non_pos_prefix_sum};
pub use sequence::{ScrambleMode, Sequence, SequenceError, SequenceKey, Step, MAX_HALF_LENGTH};
pub use frequency::FrequencyTable;
pub use convergence::{
    explore, run_iteration, run_to_convergence, threshold, Converged, ConvergenceConfig,
    ConvergenceError, ConvergenceRunner, ConvergenceStats, ExplorationReport, IterationReport,
};
pub use config::{ConfigError, SimulationConfig, EXPLORATION_THRESHOLD};
