//! Simulator: the access driver for one configuration.
//!
//! Feeds a trace through a [`CacheSim`] strictly in order, emits one
//! [`AccessEvent`] per access and checks the run-level invariant
//! `hits + misses == accesses` when the run completes.

use std::convert::Infallible;
use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::cache::{CacheSim, Outcome};
use crate::common::data::{Access, AccessKind};
use crate::common::error::ConfigError;
use crate::config::CacheConfig;
use crate::stats::RunReport;

/// Per-access trace record: the outcome of one external access.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AccessEvent {
    /// Hit or miss.
    pub outcome: Outcome,
    /// Address that was accessed.
    pub addr: u64,
}

impl fmt::Display for AccessEvent {
    /// Formats as `Hit at 0x0000abcd` / `Miss at 0x0000abcd`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self.outcome {
            Outcome::Hit => "Hit",
            Outcome::Miss => "Miss",
        };
        write!(f, "{word} at {:#010x}", self.addr)
    }
}

/// Top-level simulator: one configuration and the cache it describes.
#[derive(Debug)]
pub struct Simulator {
    config: CacheConfig,
    cache: CacheSim,
}

impl Simulator {
    /// Validates `config` and builds a cold cache for it.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the configuration is invalid.
    pub fn new(config: CacheConfig) -> Result<Self, ConfigError> {
        let cache = CacheSim::new(&config)?;
        Ok(Self { config, cache })
    }

    /// Configuration being simulated.
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Underlying cache state.
    pub const fn cache(&self) -> &CacheSim {
        &self.cache
    }

    /// Processes a single access.
    pub fn step(&mut self, access: Access) -> AccessEvent {
        let outcome = match access.kind {
            AccessKind::Read => {
                self.cache.stats_mut().reads += 1;
                self.cache.read(access.addr)
            }
            AccessKind::Write => {
                self.cache.stats_mut().writes += 1;
                self.cache.write(access.addr)
            }
        };
        trace!(addr = access.addr, kind = %access.kind, ?outcome, "access");
        AccessEvent {
            outcome,
            addr: access.addr,
        }
    }

    /// Runs `accesses` in order, handing every event to `on_event`.
    ///
    /// Stops at the first error returned by `on_event`; the cache keeps the
    /// state reached so far.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by `on_event`.
    ///
    /// # Panics
    ///
    /// Panics if hits and misses do not add up to the number of accesses,
    /// which can only happen through a bug in the engine.
    pub fn run_with<E>(
        &mut self,
        accesses: &[Access],
        mut on_event: impl FnMut(AccessEvent) -> Result<(), E>,
    ) -> Result<RunReport, E> {
        debug!(config = %self.config.label(), accesses = accesses.len(), "run start");
        for &access in accesses {
            on_event(self.step(access))?;
        }

        let stats = self.cache.stats();
        assert_eq!(
            stats.hits + stats.misses,
            stats.accesses(),
            "every access must resolve to exactly one hit or miss"
        );
        debug_assert_eq!(self.cache.check_invariants(), Ok(()));
        Ok(self.report())
    }

    /// Runs `accesses` in order, discarding per-access events.
    pub fn run(&mut self, accesses: &[Access]) -> RunReport {
        match self.run_with(accesses, |_| Ok::<(), Infallible>(())) {
            Ok(report) => report,
            Err(never) => match never {},
        }
    }

    /// Report of the state reached so far.
    pub fn report(&self) -> RunReport {
        RunReport::new(&self.config, &self.cache)
    }
}
