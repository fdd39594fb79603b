//! # Convergence Loop Test Suite
//!
//! Exercises the statistical side of the sampler: a uniform scramble must reach
//! the uniformity criterion within budget, and a deliberately biased scramble
//! must not.
//!
//! The n = 10 runs take a long time in debug builds and are ignored by default;
//! run them with `cargo test -- --ignored`.

use balance::{
    run_to_convergence, threshold, ConvergenceConfig, ConvergenceError, ConvergenceRunner,
    FrequencyTable, ScrambleMode, SimulationConfig,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Test helper to create a convergence configuration like the reference runs
fn reference_config(n: usize, batch_size: usize, max_iterations: usize, mode: ScrambleMode) -> ConvergenceConfig {
    ConvergenceConfig {
        n,
        batch_size,
        epsilon: 0.1,
        max_iterations,
        mode,
    }
}

// === N = 4 ===

#[test]
fn test_n4_converges() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut table = FrequencyTable::new();
    let config = reference_config(4, 1 << 13, 50, ScrambleMode::Uniform);

    let converged = run_to_convergence(&mut table, &config, &mut rng).unwrap();

    // Catalan(4) distinct balanced sequences
    assert_eq!(converged.distinct, 14);
    assert_eq!(table.len(), 14);
    assert!(converged.iterations >= 8);
    assert!(converged.iterations <= 50);
    assert!(converged.stddev <= threshold(0.1, 14));
    assert_eq!(converged.total_observed, (converged.iterations as u64) << 13);
    assert_eq!(table.total_count(), converged.total_observed);
}

#[test]
fn test_n4_biased_does_not_converge() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    let mut table = FrequencyTable::new();
    let config = reference_config(4, 1 << 13, 50, ScrambleMode::Biased);

    let err = run_to_convergence(&mut table, &config, &mut rng).unwrap_err();
    match err {
        ConvergenceError::MaxIterations { iterations, last_stddev, threshold } => {
            assert_eq!(iterations, 50);
            assert!(last_stddev.unwrap() > threshold);
        }
        other => panic!("expected iteration budget to run out, got {}", other),
    }
    assert!(table.iter().all(|(sequence, _)| sequence.is_balanced()));
}

#[test]
fn test_thresholds_tighten_as_support_grows() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut table = FrequencyTable::new();
    let mut runner = ConvergenceRunner::new(reference_config(5, 8, 30, ScrambleMode::Uniform));

    let _ = runner.run(&mut table, &mut rng);

    let thresholds = &runner.stats.thresholds;
    assert_eq!(thresholds.len(), runner.stats.iterations);
    assert!(thresholds.windows(2).all(|pair| pair[1] <= pair[0]));
    assert_eq!(*thresholds.last().unwrap(), threshold(0.1, table.len()));
}

#[test]
fn test_default_simulation_converges() {
    let config = SimulationConfig {
        seed: Some(7),
        batch_size: 1 << 12,
        ..Default::default()
    };
    let mut rng = config.rng();
    let mut table = FrequencyTable::new();

    let converged = ConvergenceRunner::new(config.convergence())
        .run(&mut table, &mut rng)
        .unwrap();
    assert_eq!(converged.distinct, 14);
}

#[test]
fn test_same_seed_same_run() {
    let config = reference_config(3, 1000, 40, ScrambleMode::Uniform);

    let mut first_table = FrequencyTable::new();
    let first = run_to_convergence(&mut first_table, &config, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();

    let mut second_table = FrequencyTable::new();
    let second = run_to_convergence(&mut second_table, &config, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();

    assert_eq!(first, second);
    for (sequence, count) in &first_table {
        assert_eq!(second_table.count_of(sequence), *count);
    }
}

// === N = 10 ===

#[test]
#[ignore]
fn test_n10_converges() {
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let mut table = FrequencyTable::new();
    let config = reference_config(10, 1 << 16, 75, ScrambleMode::Uniform);

    let converged = run_to_convergence(&mut table, &config, &mut rng).unwrap();
    assert_eq!(converged.distinct, 16796);
}

#[test]
#[ignore]
fn test_n10_biased_does_not_converge() {
    let mut rng = ChaCha8Rng::seed_from_u64(10);
    let mut table = FrequencyTable::new();
    let config = reference_config(10, 1 << 16, 75, ScrambleMode::Biased);

    assert!(run_to_convergence(&mut table, &config, &mut rng).is_err());
}
