//! Error types for the convenience surface (component E, spec.md §7).
//!
//! The raw per-phase primitives (`w_acquire`, `r_release`, ...) keep the
//! spec's `bool` return convention, no allocation, no enum tag on the hot
//! path, mirroring the teacher's `Option`-returning `try_lock`. This module
//! exists only for the scoped helpers, which need a real error type to
//! propagate through `?`.

/// Failure reported by the scoped convenience helpers.
///
/// A release failure never surfaces here: for well-behaved callers (no
/// double-release through a guard or the `scoped_*` helpers) it cannot
/// happen, and if it does it indicates a programmer protocol violation:
/// those paths assert rather than propagate.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The phase's acquire slot was already reserved by another participant.
    #[error("phase already reserved by another participant")]
    Overflow,
    /// `wait` exhausted its timeout budget before the phase became current.
    #[error("wait exceeded its timeout budget")]
    Timeout,
}
