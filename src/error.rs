//! # Error Module
//!
//! The error type shared by every fallible operation in the crate.
//!
//! Contract violations (a voxel coordinate outside its section, a queue entry
//! that cannot be packed) are not represented here: they panic, because they
//! can only come from a bug in the caller.

use thiserror::Error;

/// Errors raised while configuring, loading, or persisting world data.
#[derive(Debug, Error)]
pub enum WorldError {
    /// A configuration value was outside its allowed bounds.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A persisted section record carried an array of the wrong length.
    #[error("malformed section record: `{field}` holds {actual} bytes, expected {expected}")]
    SectionFormat {
        /// Name of the offending record field.
        field: &'static str,
        /// Length the field must have.
        expected: usize,
        /// Length the field actually had.
        actual: usize,
    },

    /// A persisted chunk record was structurally invalid.
    #[error("malformed chunk record: {0}")]
    ChunkFormat(String),

    /// The relighter was handed a neighbourhood of the wrong size.
    #[error("expected a neighbourhood of {expected} chunks, got {actual}")]
    NeighborhoodSize {
        /// `span * span`.
        expected: usize,
        /// Number of chunk slots supplied.
        actual: usize,
    },

    /// The backing store failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A record could not be encoded or decoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Shorthand for results carrying a [`WorldError`].
pub type WorldResult<T> = Result<T, WorldError>;
