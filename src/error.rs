//! Fatal-bug diagnostics for the core.
//!
//! Per the error-handling design, invariant violations inside the cache-set
//! or engine (double residency, an empty deferred queue at completion, a
//! capacity that didn't shrink back under its bound) are bugs, not
//! recoverable conditions — they abort the run with a diagnostic rather
//! than being threaded through `Result`. `no_std` code can't implement
//! `std::error::Error`, so this stays a plain `Display`-able enum; the
//! simulator binary wraps it in its own `thiserror` hierarchy (see
//! `dhcache_sim::error`).

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// A cache-set invariant was violated. The `&'static str` names which
    /// one, for the abort diagnostic.
    InvariantViolation(&'static str),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvariantViolation(what) => {
                write!(f, "cache invariant violated: {what}")
            }
        }
    }
}
