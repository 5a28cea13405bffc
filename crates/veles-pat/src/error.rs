//! Error types for color patch parsing.

use thiserror::Error;

/// Errors that can occur when working with color patch files.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// Invalid file extension.
    #[error("invalid file extension: expected {expected}, got {actual}")]
    InvalidExtension { expected: String, actual: String },

    /// A stored offset or size reaches past the end of the buffer.
    #[error("patch data at {offset:#x} needs {needed} bytes but only {available} remain")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Replacement color count does not match the paint's flat length.
    #[error("color count mismatch: paint has {expected} colors, got {actual}")]
    ColorCountMismatch { expected: usize, actual: usize },

    /// Paint data blocks are not uniformly sized and contiguous.
    #[error("paint {paint} occupies {found} bytes, expected {expected}")]
    NonUniformPaints {
        paint: usize,
        expected: usize,
        found: usize,
    },

    /// Paint index out of range.
    #[error("no paint at index {index}, container has {count}")]
    PaintOutOfRange { index: usize, count: usize },

    /// The container holds no paint entries.
    #[error("container has no paint entries")]
    NoPaints,
}

/// Result type for color patch operations.
pub type Result<T> = std::result::Result<T, Error>;
