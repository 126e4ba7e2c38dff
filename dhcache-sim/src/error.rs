//! Error types for the simulator binary (spec §7).
//!
//! The core crate's [`dhcache::CacheError`] covers fatal invariant
//! violations inside the cache-set/engine; everything else — a malformed
//! trace line, an I/O failure writing the result file — is a normal,
//! recoverable error here, following the teacher's sibling `input.rs`
//! convention of one error enum per fallible subsystem.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A trace line that couldn't be parsed (spec §7b): missing a field or a
/// non-numeric size. Carries the 0-based line number for the diagnostic.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("trace line {line}: missing field ({field})")]
    MissingField { line: usize, field: &'static str },
    #[error("trace line {line}: invalid size {value:?}")]
    InvalidSize { line: usize, value: String },
    #[error("failed to read trace file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// I/O failure writing the result file or packet dump (spec §7d).
#[derive(Debug, Error)]
#[error("failed to write {}: {source}", path.display())]
pub struct ResultWriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}
