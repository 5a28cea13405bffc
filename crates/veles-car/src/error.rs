//! Error types for model container parsing.

use thiserror::Error;

use crate::Slot;

/// Errors that can occur when working with model containers.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error.
    #[error("{0}")]
    Common(#[from] veles_common::Error),

    /// Buffer too short to hold the header, offset table and reserved bytes.
    #[error("model container too small: {0} bytes, need at least 64")]
    TooSmall(usize),

    /// A slot's table entry points outside the container.
    #[error("slot {slot} offset {offset:#x} is outside the {len}-byte container")]
    OffsetOutOfRange { slot: Slot, offset: u32, len: usize },

    /// Nonzero table entries must not decrease across slot indices.
    #[error("slot {slot} offset {offset:#x} is before the preceding slot at {previous:#x}")]
    UnorderedOffsets { slot: Slot, offset: u32, previous: u32 },
}

/// Result type for model container operations.
pub type Result<T> = std::result::Result<T, Error>;
