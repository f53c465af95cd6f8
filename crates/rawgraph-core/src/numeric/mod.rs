//! Numerics used by parameter commit.
//!
//! - [`linalg`]: Gaussian elimination with partial pivoting and the
//!   quad-to-rectangle homography built on it.
//! - [`spline`]: monotone cubic Hermite tangents (Fritsch–Carlson) and curve
//!   evaluation.
//!
//! Degenerate input is reported as a [`NumericError`] instead of letting NaN
//! or infinity reach a committed parameter block.

pub mod linalg;
pub mod spline;

use thiserror::Error;

/// Reasons a numeric derivation cannot produce a usable result.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NumericError {
    /// No usable pivot: the linear system is singular or ill-conditioned.
    #[error("singular system: no usable pivot in column {column}")]
    Singular {
        /// Column where elimination stalled.
        column: usize,
    },

    /// Three corners of the quad lie on one line.
    #[error("corners {0:?} are collinear")]
    Collinear([usize; 3]),

    /// The target rectangle has zero width or height.
    #[error("target rectangle has zero width or height")]
    EmptyTarget,

    /// An input or result is NaN or infinite.
    #[error("non-finite input or result")]
    NonFinite,

    /// Control-point x values must increase strictly.
    #[error("control points not strictly increasing at index {index}")]
    NonIncreasing {
        /// Index of the first point that is not greater than its predecessor.
        index: usize,
    },
}
