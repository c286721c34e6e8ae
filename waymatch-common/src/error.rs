//! Error types for the waymatch workspace.
//!
//! The error surface is a closed set: every fallible operation across the
//! API boundary returns one of the kinds below. Internal numerical corner
//! cases (antipodal angles, zero-length segments) are handled locally by
//! branching to a stable formula and never escalate here.

use thiserror::Error;

/// Main error type for waymatch operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Malformed input: wrong dimension, non-positive radius, bad WKT,
    /// non-monotonic timestamps
    #[error("bad argument: {0}")]
    BadArgument(String),

    /// Matching requested against a graph with no edges
    #[error("road graph is empty")]
    NoGraph,

    /// Matching requested with an empty observation sequence
    #[error("observation sequence is empty")]
    NoObservations,

    /// Mutation of a Hilbert-packed tree after `build()`
    #[error("index is build-locked: {0}")]
    BuildLocked(&'static str),

    /// Level-order node index would overflow the address space
    #[error("maximum tree depth reached at node index {0}")]
    MaximumTreeDepth(u64),

    /// Caller-supplied cancellation token tripped
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Shorthand for [`Error::BadArgument`] from any displayable value.
    pub fn bad_argument(msg: impl Into<String>) -> Self {
        Error::BadArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            Error::bad_argument("radius must be positive").to_string(),
            "bad argument: radius must be positive"
        );
        assert_eq!(Error::NoGraph.to_string(), "road graph is empty");
        assert_eq!(
            Error::MaximumTreeDepth(u64::MAX).to_string(),
            format!("maximum tree depth reached at node index {}", u64::MAX)
        );
    }

    #[test]
    fn test_kinds_are_comparable() {
        assert_eq!(Error::Cancelled, Error::Cancelled);
        assert_ne!(Error::NoGraph, Error::NoObservations);
    }
}
