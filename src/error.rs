//! Error types.

use thiserror::Error;

/// Errors reported by index builds and query constructors.
///
/// Every fallible operation in this crate fails fast with one of these values; nothing is
/// silently corrected apart from the documented clamping of over-large `k` and pivot counts.
#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// An index build was given no data to index.
    #[error("cannot build an index over an empty dataset")]
    EmptyDataset,

    /// A pivot selection was asked for zero pivots.
    #[error("pivot count must be at least 1")]
    ZeroPivots,

    /// A nearest-neighbor query was constructed with `k == 0`.
    #[error("k must be at least 1")]
    ZeroNeighbors,

    /// A range query was constructed with a negative radius.
    #[error("search radius must be non-negative")]
    NegativeRadius,

    /// A diversified query weight fell outside the unit interval.
    #[error("diversity weight must lie in [0, 1], got {got}")]
    InvalidDiversityWeight {
        /// The rejected weight.
        got: f64,
    },

    /// A tree configuration allowed no items in its leaves.
    #[error("max leaf size must be at least 1")]
    ZeroMaxLeafSize,

    /// A protein was constructed from an empty residue sequence.
    #[error("protein sequence must not be empty")]
    EmptySequence,
}

/// Convenience alias for results with [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
