//! Configuration sweeps.
//!
//! A sweep simulates many cache configurations against one trace. It performs:
//! 1. **Expansion:** The cartesian product of a [`SweepConfig`], minus invalid combinations.
//! 2. **Execution:** One job per configuration on a rayon pool. Each job owns its
//!    simulator; the trace is shared read-only.
//! 3. **Collection:** Reports come back in expansion order regardless of completion order.

use rayon::prelude::*;
use tracing::{info, warn};

use super::simulator::Simulator;
use crate::common::data::Access;
use crate::common::error::{ConfigError, SimError};
use crate::config::{CacheConfig, SweepConfig};
use crate::stats::RunReport;

/// Builds a rayon pool with `threads` workers, or one per core for `None`.
///
/// # Errors
///
/// Returns the pool builder's error if the threads cannot be spawned.
pub fn rayon_pool(threads: Option<usize>) -> Result<rayon::ThreadPool, rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .thread_name(|idx| format!("cachesim-worker-{idx}"))
        .build()
}

impl SweepConfig {
    /// Expands the sweep into concrete configurations.
    ///
    /// Order is block size, replacement, write-hit, write-miss, associativity
    /// (fully-associative first), way prediction, victim size. Combinations that
    /// fail validation are logged and skipped; duplicates are dropped.
    pub fn expand(&self) -> Vec<CacheConfig> {
        let mut configs = Vec::new();
        for &block_bytes in &self.block_sizes {
            let full = (self.fully_associative && block_bytes > 0)
                .then(|| self.capacity_bytes / block_bytes);
            let assocs: Vec<usize> = full
                .into_iter()
                .chain(self.associativities.iter().copied())
                .collect();

            for &replacement in &self.replacement {
                for &write_hit in &self.write_hit {
                    for &write_miss in &self.write_miss {
                        for &assoc in &assocs {
                            for &way_prediction in &self.way_prediction {
                                for &victim_entries in &self.victim_entries {
                                    let config = CacheConfig {
                                        capacity_bytes: self.capacity_bytes,
                                        block_bytes,
                                        assoc,
                                        replacement,
                                        way_prediction,
                                        victim_entries,
                                        write_hit,
                                        write_miss,
                                    };
                                    match config.geometry() {
                                        Ok(_) if !configs.contains(&config) => configs.push(config),
                                        Ok(_) => {}
                                        Err(err) => {
                                            warn!(config = %config.label(), %err, "skipping configuration");
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
        configs
    }
}

/// Runs every configuration against `accesses` in parallel.
///
/// `job` drives one simulator to completion; it is where callers attach
/// per-access output. Results are returned in the order of `configs`.
///
/// # Errors
///
/// Returns the first error produced by pool construction, simulator
/// construction or any job. Remaining jobs may still run to completion.
pub fn run_parallel<F, E>(
    configs: Vec<CacheConfig>,
    accesses: &[Access],
    threads: Option<usize>,
    job: F,
) -> Result<Vec<RunReport>, E>
where
    F: Fn(&mut Simulator, &[Access]) -> Result<RunReport, E> + Sync,
    E: From<ConfigError> + From<rayon::ThreadPoolBuildError> + Send,
{
    let pool = rayon_pool(threads)?;
    let total = configs.len();
    info!(configs = total, threads = pool.current_num_threads(), "sweep start");

    let reports = pool.install(|| {
        configs
            .into_par_iter()
            .map(|config| -> Result<RunReport, E> {
                let mut sim = Simulator::new(config)?;
                let report = job(&mut sim, accesses)?;
                info!(
                    config = %report.config.label(),
                    hit_rate = report.stats.hit_rate(),
                    "configuration done"
                );
                Ok(report)
            })
            .collect::<Result<Vec<_>, E>>()
    })?;

    info!(configs = total, "sweep complete");
    Ok(reports)
}

/// Expands `sweep` and runs it, keeping only the reports.
///
/// # Errors
///
/// See [`run_parallel`].
pub fn run_sweep(sweep: &SweepConfig, accesses: &[Access]) -> Result<Vec<RunReport>, SimError> {
    run_parallel(sweep.expand(), accesses, sweep.threads, |sim, accesses| {
        Ok(sim.run(accesses))
    })
}
