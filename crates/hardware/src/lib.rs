//! Trace-driven set-associative cache simulator library.
//!
//! This crate replays memory access traces through a configurable cache model:
//! 1. **Cache:** Set-associative store, LRU replacement, MRU and multi-column way
//!    prediction, an optional victim cache and writeback/writethrough ×
//!    allocate/non-allocate write policies.
//! 2. **Simulation:** Trace loading, the per-configuration access driver and
//!    parallel configuration sweeps.
//! 3. **Reporting:** Hit/miss counters, way-prediction accuracy and search length.
//!
//! Only metadata (valid, dirty, tag) is modeled; no data values are stored.

/// Cache engine (store, replacement, way prediction, victim cache, write policies).
pub mod cache;
/// Common types (address decoding, access records, errors).
pub mod common;
/// Simulator configuration (defaults, enums, validation, sweeps).
pub mod config;
/// Trace loading, access driver and sweeps.
pub mod sim;
/// Run statistics and reports.
pub mod stats;

/// Cache engine for one configuration.
pub use crate::cache::CacheSim;
/// Per-configuration parameters; deserialize from JSON or start from `CacheConfig::default()`.
pub use crate::config::CacheConfig;
/// Access driver; construct with `Simulator::new` and feed it a trace.
pub use crate::sim::Simulator;
