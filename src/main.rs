//! Balance CLI
//!
//! Samples rebalanced step sequences and reports whether their distribution
//! converged to uniform. For `n` above the exploration threshold it only
//! counts how many distinct balanced sequences turn up.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use balance::config::{
    SimulationConfig, DEFAULT_BATCH_SIZE, DEFAULT_EPSILON, DEFAULT_MAX_ITERATIONS, DEFAULT_N,
};
use balance::render::{columns_for, paste_graphs, select};
use balance::{explore, ConvergenceError, ConvergenceRunner, FrequencyTable, Sequence};

/// Check that cycle-lemma rebalancing of uniformly scrambled sequences is uniform
#[derive(Parser, Debug)]
#[command(name = "balance")]
#[command(version)]
#[command(about = "Check that cycle-lemma rebalancing of scrambled sequences is uniform", long_about = None)]
struct Cli {
    /// Sequences have N up-steps and N + 1 down-steps
    #[arg(value_name = "N", default_value_t = DEFAULT_N)]
    n: usize,

    /// Sequences sampled per iteration
    #[arg(value_name = "NSYMS", default_value_t = DEFAULT_BATCH_SIZE)]
    nsyms: usize,

    /// Iterations allowed before giving up on convergence
    #[arg(value_name = "MAXITERS", default_value_t = DEFAULT_MAX_ITERATIONS)]
    maxiters: usize,

    /// Tolerance; the stddev of frequencies must fall below EPS / unique_count
    #[arg(value_name = "EPS", default_value_t = DEFAULT_EPSILON)]
    eps: f64,

    /// Seed the generator for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Number of unique balanced sequences to draw afterwards (0 disables)
    #[arg(long, default_value_t = 20)]
    show: usize,
}

impl Cli {
    fn config(&self) -> SimulationConfig {
        SimulationConfig {
            n: self.n,
            batch_size: self.nsyms,
            max_iterations: self.maxiters,
            epsilon: self.eps,
            seed: self.seed,
        }
    }

    /// The simulation config, with invalid values reported as clap usage errors.
    fn validated_config(&self) -> Result<SimulationConfig, clap::Error> {
        let config = self.config();
        config
            .validate()
            .map_err(|err| Cli::command().error(ErrorKind::ValueValidation, err))?;
        Ok(config)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // log records from the library are bridged in by the tracing-log feature
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = cli.validated_config().unwrap_or_else(|err| err.exit());

    run(&config, cli.show)
}

fn run(config: &SimulationConfig, show: usize) -> Result<()> {
    let mut rng = config.rng();
    let mut table = FrequencyTable::new();

    let total_observed = if config.runs_to_convergence() {
        let mut runner = ConvergenceRunner::new(config.convergence());
        match runner.run(&mut table, &mut rng) {
            Ok(converged) => {
                println!(
                    "convergence for (n={}, nsyms={}, eps={:.6}):",
                    config.n, config.batch_size, config.epsilon
                );
                println!("unique lists\t= {}", table.len());
                println!("total samples\t= {}", converged.total_observed);
                println!("uniform freq.\t= {:.6}", 1.0 / table.len() as f64);
                println!("stddev(freqs)\t= {:.6}", converged.stddev);
                converged.total_observed
            }
            Err(ConvergenceError::MaxIterations { iterations, .. }) => {
                println!("distribution did not converge after {} iterations", iterations);
                return Ok(());
            }
            Err(err) => return Err(err).context("convergence run failed"),
        }
    } else {
        explore(&mut table, config.n, config.batch_size, &mut rng)
            .context("exploration run failed")?
            .total_observed
    };

    println!("result for (n={}, nsyms={}):", config.n, config.batch_size);
    println!("unique lists\t= {}", table.len());
    println!("total samples\t= {}", total_observed);

    let picked = select(&table, show, &mut rng);
    if let Some(&(first, _)) = picked.first() {
        println!("\n({}/{}) unique lists:\n", picked.len(), table.len());
        let sequences: Vec<&Sequence> = picked.iter().map(|&(sequence, _)| sequence).collect();
        println!("{}", paste_graphs(&sequences, columns_for(first.len())));
    }

    Ok(())
}
