//! Trace-driven cache simulator CLI.
//!
//! This binary provides the entry points for running traces. It performs:
//! 1. **Sweep:** Simulate every configuration of a sweep in parallel, writing a
//!    `.trace` (per-access hit/miss) and `.info` (summary) file per configuration.
//! 2. **Run:** Simulate a single configuration and print its summary.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cachesim_core::common::error::SimError;
use cachesim_core::config::{
    CacheConfig, SweepConfig, WayPrediction, WriteHitPolicy, WriteMissPolicy,
};
use cachesim_core::sim::{Simulator, load_trace, run_parallel};
use cachesim_core::stats::RunReport;

#[derive(Parser, Debug)]
#[command(
    name = "cachesim",
    author,
    version,
    about = "Trace-driven set-associative cache simulator",
    long_about = "Replay a memory access trace (lines of `r <hex addr>` / `w <hex addr>`) through one or many cache configurations.\n\nExamples:\n  cachesim sweep traces/gcc.trace\n  cachesim sweep traces/gcc.trace --config sweep.json --threads 8\n  cachesim run traces/gcc.trace --assoc 4 --way-prediction mru --victim 8"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate every configuration of a sweep and write per-configuration output files.
    Sweep {
        /// Trace file to replay.
        trace: PathBuf,

        /// JSON sweep description; omitted lists take the classic defaults.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Worker threads (default: one per core).
        #[arg(short, long)]
        threads: Option<usize>,

        /// Directory for output files (default: next to the trace).
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Skip the per-access `.trace` files.
        #[arg(long)]
        no_trace: bool,

        /// Also write each report as `.json`.
        #[arg(long)]
        json: bool,
    },

    /// Simulate a single configuration and print its summary.
    Run {
        /// Trace file to replay.
        trace: PathBuf,

        /// JSON cache configuration; overrides every flag below.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Block size in bytes.
        #[arg(long, default_value_t = 64)]
        block: usize,

        /// Associativity (0 = fully associative).
        #[arg(long, default_value_t = 1)]
        assoc: usize,

        /// Way prediction: none, mru or multi-column.
        #[arg(long, default_value = "none")]
        way_prediction: WayPrediction,

        /// Victim cache entries (0 disables it).
        #[arg(long, default_value_t = 0)]
        victim: usize,

        /// Write-hit policy: writeback or writethrough.
        #[arg(long, default_value = "writeback")]
        write_hit: WriteHitPolicy,

        /// Write-miss policy: write-allocate or write-non-allocate.
        #[arg(long, default_value = "write-allocate")]
        write_miss: WriteMissPolicy,

        /// Write per-access hit/miss lines to this file.
        #[arg(long)]
        trace_out: Option<PathBuf>,

        /// Print the report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sweep {
            trace,
            config,
            threads,
            out_dir,
            no_trace,
            json,
        } => cmd_sweep(&trace, config.as_deref(), threads, out_dir, !no_trace, json),
        Commands::Run {
            trace,
            config,
            block,
            assoc,
            way_prediction,
            victim,
            write_hit,
            write_miss,
            trace_out,
            json,
        } => {
            let config = match config {
                Some(path) => fs::read_to_string(path)
                    .map_err(SimError::from)
                    .and_then(|text| CacheConfig::from_json(&text).map_err(SimError::from)),
                None => {
                    let mut config = CacheConfig {
                        block_bytes: block,
                        assoc,
                        way_prediction,
                        victim_entries: victim,
                        write_hit,
                        write_miss,
                        ..CacheConfig::default()
                    };
                    if assoc == 0 {
                        config.assoc = config.fully_associative_ways();
                    }
                    Ok(config)
                }
            };
            config.and_then(|config| cmd_run(&trace, config, trace_out.as_deref(), json))
        }
    };

    if let Err(e) = result {
        eprintln!("[!] FATAL: {e}");
        process::exit(1);
    }
}

/// Runs a sweep, writing `<trace>_<label>.{trace,info[,json]}` per configuration.
fn cmd_sweep(
    trace_path: &Path,
    config_path: Option<&Path>,
    threads: Option<usize>,
    out_dir: Option<PathBuf>,
    write_trace: bool,
    write_json: bool,
) -> Result<(), SimError> {
    let mut sweep = match config_path {
        Some(path) => SweepConfig::from_json(&fs::read_to_string(path)?)?,
        None => SweepConfig::default(),
    };
    if threads.is_some() {
        sweep.threads = threads;
    }

    let trace = load_trace(trace_path)?;
    let out_dir = out_dir
        .or_else(|| trace_path.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    fs::create_dir_all(&out_dir)?;
    let stem = trace_path
        .file_name()
        .map_or_else(|| "trace".into(), |name| name.to_string_lossy());

    let configs = sweep.expand();
    let reports = run_parallel(configs, &trace.accesses, sweep.threads, |sim, accesses| {
        let base = out_dir.join(format!("{stem}_{}", sim.config().label()));
        info!(output = %base.display(), "writing");
        let report = if write_trace {
            run_traced(sim, accesses, &with_suffix(&base, "trace"))?
        } else {
            sim.run(accesses)
        };
        fs::write(with_suffix(&base, "info"), report.to_string())?;
        if write_json {
            write_json_report(&with_suffix(&base, "json"), &report)?;
        }
        Ok::<_, SimError>(report)
    })?;

    println!("{:<40} {:>10} {:>10} {:>9}", "configuration", "hits", "misses", "hit rate");
    for report in &reports {
        println!(
            "{:<40} {:>10} {:>10} {:>8.2}%",
            report.config.label(),
            report.stats.hits,
            report.stats.misses,
            report.stats.hit_rate()
        );
    }
    Ok(())
}

/// Runs one configuration and prints its report.
fn cmd_run(
    trace_path: &Path,
    config: CacheConfig,
    trace_out: Option<&Path>,
    json: bool,
) -> Result<(), SimError> {
    let mut sim = Simulator::new(config)?;
    let trace = load_trace(trace_path)?;

    let report = match trace_out {
        Some(path) => run_traced(&mut sim, &trace.accesses, path)?,
        None => sim.run(&trace.accesses),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report).map_err(io::Error::from)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

/// Runs `sim`, streaming one `Hit at …` / `Miss at …` line per access to `path`.
fn run_traced(
    sim: &mut Simulator,
    accesses: &[cachesim_core::common::data::Access],
    path: &Path,
) -> Result<RunReport, SimError> {
    let mut out = BufWriter::new(File::create(path)?);
    let report = sim.run_with(accesses, |event| writeln!(out, "{event}"))?;
    out.flush()?;
    Ok(report)
}

fn write_json_report(path: &Path, report: &RunReport) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)?;
    out.flush()
}

/// Appends `.ext` without touching dots already in the file name.
fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
