//! Error types for the lectern engine
//!
//! Every variant here is recovered locally by the component that produced
//! it. Nothing crosses the public API as an error: a failed injection falls
//! through to the next mechanism, an unreachable context is skipped, a bad
//! measurement leaves the previous height in place.

use thiserror::Error;

/// Main error type for lectern operations
#[derive(Debug, Error)]
pub enum LecternError {
    /// The rendering context's handles throw or are inaccessible; the
    /// engine has already discarded it
    #[error("rendering context unreachable: {0}")]
    ContextUnreachable(String),

    /// The context does not expose this injection mechanism
    #[error("injection mechanism unavailable")]
    MechanismUnavailable,

    /// An injection attempt raised an engine-internal error
    #[error("injection mechanism failed: {0}")]
    MechanismFailed(String),

    /// Content measurement produced no usable size
    #[error("measurement failed: {0}")]
    Measurement(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl LecternError {
    /// True when the whole context should be skipped for the current pass
    /// rather than falling through to another mechanism.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::ContextUnreachable(_))
    }
}

/// Convenience Result type for lectern operations
pub type Result<T> = std::result::Result<T, LecternError>;
