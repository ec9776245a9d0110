//! Trace Loader.
//!
//! This module turns a line-oriented trace into the in-memory access sequence
//! the simulator replays. It performs:
//! 1. **Parsing:** One record per line, `r <hex address>` or `w <hex address>`.
//! 2. **Validation:** Unknown kinds and malformed addresses are rejected with their line number.
//! 3. **Accounting:** Read and write totals are reported alongside the accesses.
//!
//! The address may follow the kind with or without whitespace and with or
//! without a `0x` prefix, so `r0x1f`, `r 1f` and `R 0X1F` are equivalent.
//! Blank lines are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::common::data::{Access, AccessKind};
use crate::common::error::TraceError;

/// A parsed trace.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trace {
    /// Accesses in replay order.
    pub accesses: Vec<Access>,
    /// Number of reads.
    pub reads: usize,
    /// Number of writes.
    pub writes: usize,
}

/// Parses a single trace record.
///
/// Returns `Ok(None)` for blank lines.
///
/// # Errors
///
/// [`TraceError::InvalidKind`] or [`TraceError::InvalidAddress`], tagged with `line_no`.
pub fn parse_line(line: &str, line_no: usize) -> Result<Option<Access>, TraceError> {
    let text = line.trim();
    let mut chars = text.chars();
    let Some(kind) = chars.next() else {
        return Ok(None);
    };

    let kind = match kind.to_ascii_lowercase() {
        'r' => AccessKind::Read,
        'w' => AccessKind::Write,
        _ => {
            return Err(TraceError::InvalidKind {
                line: line_no,
                text: text.to_owned(),
            });
        }
    };

    let digits = chars.as_str().trim_start();
    let digits = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
        .unwrap_or(digits);
    let addr = u64::from_str_radix(digits, 16).map_err(|_| TraceError::InvalidAddress {
        line: line_no,
        text: text.to_owned(),
    })?;

    Ok(Some(Access { kind, addr }))
}

/// Parses every record from `reader`.
///
/// # Errors
///
/// Returns the first I/O or parse error encountered.
pub fn read_trace<R: BufRead>(reader: R) -> Result<Trace, TraceError> {
    let mut trace = Trace::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(access) = parse_line(&line, idx + 1)? {
            match access.kind {
                AccessKind::Read => trace.reads += 1,
                AccessKind::Write => trace.writes += 1,
            }
            trace.accesses.push(access);
        }
    }
    Ok(trace)
}

/// Opens and parses the trace file at `path`.
///
/// # Errors
///
/// Returns [`TraceError::Io`] if the file cannot be opened or read, or a parse
/// error for the first malformed record.
pub fn load_trace(path: impl AsRef<Path>) -> Result<Trace, TraceError> {
    let path = path.as_ref();
    let trace = read_trace(BufReader::new(File::open(path)?))?;
    info!(
        path = %path.display(),
        entries = trace.accesses.len(),
        reads = trace.reads,
        writes = trace.writes,
        "trace loaded"
    );
    Ok(trace)
}
