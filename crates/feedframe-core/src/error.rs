//! Failure tags shared by every fallible stage.

/// How a caller should react to a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Input was missing, empty or malformed: skip the current item
    /// (or abort the run when the input is foundational).
    Validation,
    /// Network or upstream failure that may succeed on another attempt.
    Transient,
    /// Anything else: log with context and stop.
    Fatal,
}
