//! Simulation drivers.
//!
//! Provides the access driver for a single configuration, the trace loader
//! and the parallel sweep runner.

/// Trace file parsing.
pub mod loader;

/// Single-configuration access driver.
pub mod simulator;

/// Multi-configuration sweeps.
pub mod sweep;

pub use loader::{Trace, load_trace, read_trace};
pub use simulator::{AccessEvent, Simulator};
pub use sweep::{run_parallel, run_sweep};
