//! Error types for dlist

use std::fmt;

/// Returned by [`List::check_invariants`](crate::List::check_invariants)
/// when the link structure is inconsistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Create a new error with the given description
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Description of the violated invariant
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invariant violated: {}", self.0)
    }
}

impl std::error::Error for InvariantError {}
