//! Common types shared across the simulator.
//!
//! This module provides the building blocks every other component depends on:
//! 1. **Address Decoding:** Splitting flat 64-bit addresses into tag, set and offset.
//! 2. **Access Records:** The read/write records a trace is made of.
//! 3. **Error Handling:** Configuration, trace, simulation and invariant error types.

/// Address layout and decoding.
pub mod addr;

/// Memory access record definitions.
pub mod data;

/// Error types.
pub mod error;

pub use addr::{AddressLayout, DecodedAddr};
pub use data::{Access, AccessKind};
pub use error::{ConfigError, InvariantViolation, SimError, TraceError};
