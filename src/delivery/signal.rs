//! Pre-flight and stop-signal capabilities.

/// An object that can tell whether it is able to do its work right now.
///
/// Used as a cheap pre-flight check by whoever is about to start a stage or a
/// worker. A `true` answer is a snapshot, not a guarantee for the next call.
pub trait Functional {
    /// Returns `true` if the object can currently operate.
    fn is_functional(&self) -> bool;
}

/// Signal telling a loop whether it should leave.
///
/// All methods are synchronous and must be safe to call from any task while the
/// loop reads the flag.
pub trait DoneSignal: Send + Sync + 'static {
    /// Returns `true` if the loop should exit at its next boundary.
    fn is_done(&self) -> bool;

    /// Requests exit. Idempotent; stays set until [`reset`](Self::reset).
    fn interrupt(&self);

    /// Clears the done flag and any internal failure state.
    fn reset(&self);
}
