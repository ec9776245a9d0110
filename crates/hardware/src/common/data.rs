//! Memory Access Types.
//!
//! This module defines the records replayed through the simulator. A trace is an
//! ordered sequence of [`Access`] values; each one is either a read or a write of a
//! single 64-bit address.

use std::fmt;

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Data read access.
    ///
    /// Looks the block up and installs it on a miss.
    Read,

    /// Data write access.
    ///
    /// Resolved by the configured write-hit and write-miss policies.
    Write,
}

/// One record of a memory access trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    /// Whether this access reads or writes.
    pub kind: AccessKind,
    /// Byte address touched by the access.
    pub addr: u64,
}

impl Access {
    /// Creates a read of `addr`.
    #[inline]
    pub const fn read(addr: u64) -> Self {
        Self {
            kind: AccessKind::Read,
            addr,
        }
    }

    /// Creates a write of `addr`.
    #[inline]
    pub const fn write(addr: u64) -> Self {
        Self {
            kind: AccessKind::Write,
            addr,
        }
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => f.write_str("r"),
            Self::Write => f.write_str("w"),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:#x}", self.kind, self.addr)
    }
}
