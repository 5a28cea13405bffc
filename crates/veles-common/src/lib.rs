//! Common utilities for Veles.
//!
//! This crate provides the foundational pieces shared by the Veles format
//! crates:
//!
//! - [`BinaryReader`] - Little-endian reading from byte slices
//! - [`BinaryWriter`] - Little-endian buffer building with padding helpers
//! - [`Error`] / [`Result`] - Common error type for codec operations

mod error;
mod reader;
mod writer;

pub use error::{Error, Result};
pub use reader::BinaryReader;
pub use writer::BinaryWriter;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};
