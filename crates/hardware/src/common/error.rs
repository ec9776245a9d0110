//! Error definitions.
//!
//! This module defines the failure surface of the simulator. It provides:
//! 1. **Configuration Errors:** Invalid geometry or unknown policy selectors, rejected
//!    before any cache state is built.
//! 2. **Trace Errors:** Malformed records found while parsing a trace file.
//! 3. **Simulation Errors:** The umbrella type returned by sweep runs and the CLI.
//! 4. **Invariant Violations:** Structural inconsistencies reported by
//!    `CacheSim::check_invariants`.
//!
//! Once a configuration has been validated the engine itself cannot fail; broken
//! internal invariants are bugs and are caught by debug assertions instead.

use thiserror::Error;

/// A cache configuration that cannot be simulated.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A size parameter is zero.
    #[error("{field} must be non-zero")]
    Zero {
        /// Name of the offending parameter.
        field: &'static str,
    },

    /// A size parameter is not a power of two.
    #[error("{field} must be a power of two, got {value}")]
    NotPowerOfTwo {
        /// Name of the offending parameter.
        field: &'static str,
        /// Value that was supplied.
        value: usize,
    },

    /// Block size times associativity exceeds the capacity, leaving no sets.
    #[error("{capacity} bytes cannot hold a single set of {assoc} x {block_bytes}-byte blocks")]
    TooFewSets {
        /// Total cache capacity in bytes.
        capacity: usize,
        /// Block size in bytes.
        block_bytes: usize,
        /// Associativity.
        assoc: usize,
    },

    /// A policy name that does not match any supported algorithm.
    #[error("unknown {kind} '{value}'")]
    UnknownSelector {
        /// Which selector was being parsed.
        kind: &'static str,
        /// Text that failed to match.
        value: String,
    },

    /// Multi-column way prediction keeps one 64-bit vector per column.
    #[error("multi-column way prediction supports at most 64 ways, got {assoc}")]
    MultiColumnTooWide {
        /// Requested associativity.
        assoc: usize,
    },

    /// A JSON configuration document could not be deserialized.
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// A trace that could not be read or parsed.
#[derive(Debug, Error)]
pub enum TraceError {
    /// Reading the trace source failed.
    #[error("failed to read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A record does not start with a known access kind.
    #[error("line {line}: invalid access kind in '{text}'")]
    InvalidKind {
        /// 1-based line number.
        line: usize,
        /// Offending line, trimmed.
        text: String,
    },

    /// A record carries an address that is not a 64-bit hex value.
    #[error("line {line}: invalid address in '{text}'")]
    InvalidAddress {
        /// 1-based line number.
        line: usize,
        /// Offending line, trimmed.
        text: String,
    },
}

/// Errors surfaced by sweep runs and the command line front end.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unreadable or malformed trace.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// Writing an output file failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// The worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A broken structural invariant of the cache state.
///
/// Never produced by valid input; any instance is a simulator bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// A recency order is not a permutation of the set's ways.
    #[error("set {set}: recency order is not a permutation")]
    RecencyOrder {
        /// Offending set.
        set: usize,
    },

    /// Two valid lines of one set share a tag.
    #[error("set {set}: duplicate tag {tag:#x}")]
    DuplicateTag {
        /// Offending set.
        set: usize,
        /// Tag held twice.
        tag: u64,
    },

    /// A way appears in the bit vectors of two multi-column columns.
    #[error("set {set}: way claimed by two columns")]
    ColumnOverlap {
        /// Offending set.
        set: usize,
    },

    /// Two valid victim-cache slots hold the same block.
    #[error("victim cache: duplicate block {block:#x}")]
    DuplicateVictim {
        /// Block address held twice.
        block: u64,
    },

    /// A block is resident in the primary store and the victim cache at once.
    #[error("block {block:#x} resident in both primary store and victim cache")]
    ResidentTwice {
        /// Block address.
        block: u64,
    },
}
