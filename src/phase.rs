//! The three mutually exclusive access phases (spec.md GLOSSARY).

/// One of the three phases a participant can acquire/wait-for/release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    Write,
    Read,
    Free,
}

/// The phase currently admitted by the machine, as observed by
/// [`crate::RawWrfLock::get_current_state`]. `Uninit` covers both the
/// initial primed state and the transient hand-off window between a
/// release and the next acquire (spec.md §3, invariant 8).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CurrentState {
    Write,
    Read,
    Free,
    Uninit,
}
