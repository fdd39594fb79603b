//! # Convergence loop
//!
//! Repeatedly samples batches of scrambled-then-rebalanced sequences into a
//! [`FrequencyTable`] and checks whether the observed distribution over distinct
//! balanced sequences has become uniform.
//!
//! Uniformity is judged by the sample standard deviation of the per-sequence
//! proportions against `epsilon / distinct_count`. The bound tightens as more
//! distinct sequences are discovered, and a run must also last at least `2n`
//! iterations so the support has a chance to fill in before convergence is
//! declared.
//!
//! Running out of iterations is an expected outcome of a probabilistic check,
//! so it comes back as [`ConvergenceError`] in a `Result` rather than a panic.

use log::{debug, info, warn};
use rand::Rng;

use crate::config::{DEFAULT_BATCH_SIZE, DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS, DEFAULT_N};
use crate::frequency::FrequencyTable;
use crate::sequence::{ScrambleMode, Sequence, SequenceError};
use crate::stats::stddev;

/// Why a convergence run stopped without success
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConvergenceError {
    #[error("distribution did not converge after {iterations} iterations")]
    MaxIterations {
        iterations: usize,
        last_stddev: Option<f64>,
        threshold: f64,
    },

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Parameters of a single convergence run
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceConfig {
    pub n: usize,

    /// Sequences sampled per iteration
    pub batch_size: usize,

    pub epsilon: f64,

    /// Iteration budget; exceeding it is a [`ConvergenceError`]
    pub max_iterations: usize,

    pub mode: ScrambleMode,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            n: DEFAULT_N,
            batch_size: DEFAULT_BATCH_SIZE,
            epsilon: DEFAULT_EPSILON,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            mode: ScrambleMode::Uniform,
        }
    }
}

impl ConvergenceConfig {
    /// Fewest iterations a run may declare convergence at.
    pub fn min_iterations(&self) -> usize {
        2 * self.n
    }
}

/// Result of one sampling batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationReport {
    /// Sample stddev of the table's proportions; `None` while fewer than two
    /// distinct sequences have been seen
    pub stddev: Option<f64>,

    /// Total sequences recorded in the table so far
    pub total_observed: u64,

    /// Distinct sequences in the table
    pub distinct: usize,
}

/// A run that met the uniformity criterion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Converged {
    pub stddev: f64,
    pub total_observed: u64,
    pub iterations: usize,
    pub distinct: usize,
}

/// Bookkeeping collected while a run progresses
#[derive(Debug, Clone, Default)]
pub struct ConvergenceStats {
    /// Iterations completed
    pub iterations: usize,

    /// Acceptance bound after each iteration, oldest first
    pub thresholds: Vec<f64>,

    /// Standard deviation after the latest iteration
    pub last_stddev: Option<f64>,

    pub total_observed: u64,

    pub distinct: usize,
}

/// Acceptance bound for a table holding `distinct` sequences.
pub fn threshold(epsilon: f64, distinct: usize) -> f64 {
    if distinct == 0 {
        f64::INFINITY
    } else {
        epsilon / distinct as f64
    }
}

/// Sample `batch_size` fresh sequences, rebalance each once, and fold them
/// into `table`.
pub fn run_iteration<R: Rng + ?Sized>(
    table: &mut FrequencyTable,
    n: usize,
    batch_size: usize,
    mode: ScrambleMode,
    rng: &mut R,
) -> Result<IterationReport, SequenceError> {
    let canonical = Sequence::new(n)?;
    for _ in 0..batch_size {
        let mut sequence = canonical.clone();
        sequence.scramble(rng, mode);
        table.record(sequence.cut_and_splice());
    }

    Ok(IterationReport {
        stddev: stddev(table.proportions()),
        total_observed: table.total_count(),
        distinct: table.len(),
    })
}

/// Drives [`run_iteration`] until the distribution looks uniform
#[derive(Debug)]
pub struct ConvergenceRunner {
    pub config: ConvergenceConfig,
    pub stats: ConvergenceStats,
}

impl ConvergenceRunner {
    pub fn new(config: ConvergenceConfig) -> Self {
        Self {
            config,
            stats: ConvergenceStats::default(),
        }
    }

    /// Iterate until `stddev <= epsilon / distinct` holds after at least `2n`
    /// iterations, or fail once `max_iterations` have run.
    pub fn run<R: Rng + ?Sized>(
        &mut self,
        table: &mut FrequencyTable,
        rng: &mut R,
    ) -> Result<Converged, ConvergenceError> {
        debug!(
            "starting convergence run: n={} batch_size={} epsilon={} max_iterations={} mode={:?}",
            self.config.n,
            self.config.batch_size,
            self.config.epsilon,
            self.config.max_iterations,
            self.config.mode
        );

        loop {
            let report = run_iteration(table, self.config.n, self.config.batch_size, self.config.mode, rng)?;
            let bound = threshold(self.config.epsilon, report.distinct);

            self.stats.iterations += 1;
            self.stats.thresholds.push(bound);
            self.stats.last_stddev = report.stddev;
            self.stats.total_observed = report.total_observed;
            self.stats.distinct = report.distinct;

            debug!(
                "iteration {}: stddev={:?} threshold={} distinct={} observed={}",
                self.stats.iterations, report.stddev, bound, report.distinct, report.total_observed
            );

            if let Some(sd) = report.stddev.filter(|&sd| sd <= bound) {
                if self.stats.iterations >= self.config.min_iterations() {
                    info!(
                        "converged after {} iterations: stddev={} over {} distinct sequences",
                        self.stats.iterations, sd, report.distinct
                    );
                    return Ok(Converged {
                        stddev: sd,
                        total_observed: report.total_observed,
                        iterations: self.stats.iterations,
                        distinct: report.distinct,
                    });
                }
            }

            if self.stats.iterations >= self.config.max_iterations {
                warn!(
                    "no convergence within {} iterations (stddev={:?}, threshold={})",
                    self.stats.iterations, report.stddev, bound
                );
                return Err(ConvergenceError::MaxIterations {
                    iterations: self.stats.iterations,
                    last_stddev: report.stddev,
                    threshold: bound,
                });
            }
        }
    }
}

/// Run a fresh [`ConvergenceRunner`] over `table`.
pub fn run_to_convergence<R: Rng + ?Sized>(
    table: &mut FrequencyTable,
    config: &ConvergenceConfig,
    rng: &mut R,
) -> Result<Converged, ConvergenceError> {
    ConvergenceRunner::new(config.clone()).run(table, rng)
}

/// Outcome of an exploratory run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExplorationReport {
    pub distinct: usize,
    pub total_observed: u64,
    pub iterations: usize,
}

/// Sample batches until two consecutive batches leave the distinct count
/// unchanged.
///
/// Used for large `n`, where reaching convergence is impractical but a lower
/// bound on the number of distinct balanced sequences is still informative.
pub fn explore<R: Rng + ?Sized>(
    table: &mut FrequencyTable,
    n: usize,
    batch_size: usize,
    rng: &mut R,
) -> Result<ExplorationReport, SequenceError> {
    let mut report = run_iteration(table, n, batch_size, ScrambleMode::Uniform, rng)?;
    let mut iterations = 1;
    let mut previous = report.distinct;

    loop {
        report = run_iteration(table, n, batch_size, ScrambleMode::Uniform, rng)?;
        iterations += 1;
        debug!("exploration batch {}: distinct={}", iterations, report.distinct);
        if report.distinct == previous {
            break;
        }
        previous = report.distinct;
    }

    info!(
        "distinct count stable at {} after {} batches",
        report.distinct, iterations
    );
    Ok(ExplorationReport {
        distinct: report.distinct,
        total_observed: report.total_observed,
        iterations,
    })
}
