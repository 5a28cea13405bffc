//! Pat0 color patch parser and writer.
//!
//! Color patch files carry the repaint tables of one model: every paint
//! (color entry) owns one RGBA array per named mesh region, and the game
//! tints the region by indexing into that array. This crate can read, edit,
//! and write patch files, and can append a new paint entry by duplicating
//! the last one.
//!
//! # File Format
//!
//! - 4 bytes: Magic (`Pat0`)
//! - 12 bytes: Padding
//! - 2 bytes: Paint count (little-endian u16)
//! - 2 bytes: Geometry-patch offsets per paint (little-endian u16)
//! - Padding to the next 16-byte boundary
//! - N*G u32: Index table, one offset per geometry patch, grouped by paint
//! - Patch bodies at the referenced offsets: target offset (u32), color
//!   byte count (u32), then the RGBA quadruples padded to 4 bytes
//!
//! # Example
//!
//! ```no_run
//! use veles_pat::PatFile;
//!
//! let pat = PatFile::from_path("MainModelColorPatch.pat")?;
//! println!("{} paints", pat.color_count());
//!
//! // Duplicate the last paint as a starting point for a new color.
//! let grown = pat.append_duplicate_paint()?;
//! grown.write_to("MainModelColorPatch_new.pat")?;
//! # Ok::<(), veles_pat::Error>(())
//! ```

mod color;
mod error;
mod file;
mod insert;

pub use color::Rgba;
pub use error::{Error, Result};
pub use file::{GeometryPatch, Paint, PatFile, PAT_MAGIC};
pub use insert::append_duplicate_paint;
