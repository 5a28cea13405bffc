//! CAR4 model container parser and rebuilder.
//!
//! Model containers bundle the sub-assets of one car - body and wheel
//! models, collision data, color patches, driver and tire models - behind a
//! fixed ten-entry offset table. This crate can read containers, extract
//! individual slot payloads, and rebuild a container with replaced payloads.
//!
//! # File Format
//!
//! - 4 bytes: Magic (`CAR4`)
//! - 4 bytes: Reserved
//! - 4 bytes: Total byte count (little-endian u32)
//! - 4 bytes: Reserved
//! - 40 bytes: Offset table, one little-endian u32 per slot (zero = absent)
//! - 8 bytes: Reserved
//! - N bytes: Slot payloads back-to-back, each padded to 16 bytes
//!
//! A payload's extent ends at the next nonzero table offset, or at the end
//! of the file for the last present slot.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::BTreeMap;
//! use veles_car::{CarFile, Slot};
//!
//! let car = CarFile::from_path("Q00.bin")?;
//!
//! let mut replacements = BTreeMap::new();
//! replacements.insert(Slot::MainModel, std::fs::read("MainModel.bin")?);
//! let rebuilt = car.rebuild(&replacements);
//! std::fs::write("Q00_new.bin", rebuilt)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod file;
mod slot;

pub use error::{Error, Result};
pub use file::{CarFile, CAR_MAGIC, HEADER_LEN};
pub use slot::{Slot, SLOT_COUNT};
