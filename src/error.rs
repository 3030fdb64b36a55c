//! Error types for rasterizer configuration.
//!
//! Rasterization itself never fails: out-of-range coordinates saturate and
//! degenerate geometry yields empty output. Contract violations (sweeping an
//! unsorted rasterizer, adding edges after sorting) panic. The only
//! recoverable failures are invalid configuration values, reported here.

use thiserror::Error;

/// Result type alias for fallible rasterizer configuration.
pub type Result<T> = std::result::Result<T, RasterError>;

/// Invalid configuration handed to the rasterizer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RasterError {
    /// A gamma lookup table must map every 8-bit alpha value.
    #[error("gamma table must have exactly 256 entries, got {len}")]
    InvalidGammaTableLength { len: usize },

    /// A gamma table that was required to be monotonic decreases.
    #[error("gamma table is not monotonic at index {index}")]
    NonMonotonicGamma { index: usize },

    /// The clip box has a non-finite coordinate.
    #[error("clip box ({x1}, {y1}, {x2}, {y2}) has non-finite coordinates")]
    InvalidClipBox { x1: f64, y1: f64, x2: f64, y2: f64 },

    /// The cell arena needs room for at least one block.
    #[error("cell block limit must be at least 1")]
    InvalidCellBlockLimit,
}
