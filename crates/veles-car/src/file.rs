//! Model container handling.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use veles_common::{BinaryReader, BinaryWriter};
use zerocopy::byteorder::little_endian::U32;

use crate::slot::{Slot, SLOT_COUNT};
use crate::{Error, Result};

/// Magic bytes at the start of model containers.
pub const CAR_MAGIC: &[u8; 4] = b"CAR4";

/// Byte offset of the total-size field in the header.
const TOTAL_SIZE_OFFSET: usize = 8;

/// Byte offset of the slot offset table.
const OFFSET_TABLE_START: usize = 16;

/// Size of the fixed header region: 16 header bytes, the 10-entry offset
/// table, and 8 reserved bytes. Slot payloads start here.
pub const HEADER_LEN: usize = OFFSET_TABLE_START + SLOT_COUNT * 4 + 8;

/// A parsed model container.
///
/// The container holds up to ten named sub-assets located through a fixed
/// offset table. A table entry of zero marks an absent slot; a present slot's
/// payload runs from its offset to the next nonzero offset in the table (or
/// to the end of the buffer for the last present slot).
///
/// Parsing captures an immutable snapshot of the source buffer. Slot payloads
/// are borrowed from it on demand, and [`CarFile::rebuild`] produces a fresh
/// buffer instead of mutating the snapshot, since replacing a payload moves
/// every later slot.
///
/// # Example
///
/// ```no_run
/// use veles_car::{CarFile, Slot};
///
/// let car = CarFile::from_path("Q00.bin")?;
/// for slot in car.present_slots() {
///     let bytes = car.slot_bytes(slot).unwrap();
///     println!("{}: {} bytes", slot, bytes.len());
/// }
/// # Ok::<(), veles_car::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct CarFile {
    data: Vec<u8>,
    offsets: [u32; SLOT_COUNT],
    total_size: u32,
}

impl CarFile {
    /// Parse a model container from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::TooSmall(data.len()));
        }

        let mut reader = BinaryReader::new(data);
        reader.expect_magic(CAR_MAGIC)?;

        reader.seek(TOTAL_SIZE_OFFSET);
        let total_size = reader.read_u32()?;

        reader.seek(OFFSET_TABLE_START);
        let raw: [U32; SLOT_COUNT] = reader.read_struct()?;
        let offsets = raw.map(|entry| entry.get());

        // The extent scan relies on nonzero offsets being in-bounds and
        // non-decreasing; reject anything else up front.
        let mut previous = 0u32;
        for slot in Slot::all() {
            let offset = offsets[slot.index()];
            if offset == 0 {
                continue;
            }
            // An offset equal to the length is a degenerate empty payload at
            // the end of the file; only offsets beyond it are invalid.
            if offset as usize > data.len() {
                return Err(Error::OffsetOutOfRange {
                    slot,
                    offset,
                    len: data.len(),
                });
            }
            if offset < previous {
                return Err(Error::UnorderedOffsets {
                    slot,
                    offset,
                    previous,
                });
            }
            previous = offset;
        }

        Ok(Self {
            data: data.to_vec(),
            offsets,
            total_size,
        })
    }

    /// Read a model container from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::parse(&bytes)
    }

    /// The raw container bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The decoded slot offset table.
    pub fn offsets(&self) -> &[u32; SLOT_COUNT] {
        &self.offsets
    }

    /// Total byte count recorded in the header.
    ///
    /// Well-formed files record their own length here; the value is kept as
    /// read and re-derived on rebuild.
    pub fn total_size(&self) -> u32 {
        self.total_size
    }

    /// Whether a slot has data in this container.
    pub fn is_present(&self, slot: Slot) -> bool {
        self.offsets[slot.index()] != 0
    }

    /// Iterate over the slots that have data, in table order.
    pub fn present_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        Slot::all().into_iter().filter(|slot| self.is_present(*slot))
    }

    /// Byte range `(start, end)` of a slot's payload, or `None` if absent.
    ///
    /// The end is the next nonzero offset in the table, or the buffer length
    /// when no later slot is present.
    pub fn extent(&self, slot: Slot) -> Option<(usize, usize)> {
        let start = self.offsets[slot.index()];
        if start == 0 {
            return None;
        }
        let end = self.offsets[slot.index() + 1..]
            .iter()
            .find(|&&offset| offset != 0)
            .map(|&offset| offset as usize)
            .unwrap_or(self.data.len());
        Some((start as usize, end))
    }

    /// A slot's payload bytes, or `None` if absent.
    pub fn slot_bytes(&self, slot: Slot) -> Option<&[u8]> {
        self.extent(slot).map(|(start, end)| &self.data[start..end])
    }

    /// Rebuild the container, substituting the supplied slot payloads.
    ///
    /// Slots keep their table order: a slot with a replacement takes the new
    /// payload, a present slot without one keeps its original payload, and an
    /// absent slot without one stays absent. Supplying a replacement for an
    /// absent slot adds it to the container.
    ///
    /// Each included payload is zero-padded to a 16-byte boundary, its offset
    /// is recorded as the output length before the payload is appended, and
    /// the header's total size and offset table are rewritten once the final
    /// layout is known.
    pub fn rebuild(&self, replacements: &BTreeMap<Slot, Vec<u8>>) -> Vec<u8> {
        let mut writer = BinaryWriter::with_capacity(self.data.len());
        writer.write_bytes(&self.data[..HEADER_LEN]);

        let mut new_offsets = [0u32; SLOT_COUNT];
        for slot in Slot::all() {
            let payload = match replacements.get(&slot) {
                Some(bytes) => Some(bytes.as_slice()),
                None => self.slot_bytes(slot),
            };
            if let Some(bytes) = payload {
                new_offsets[slot.index()] = writer.len() as u32;
                writer.write_bytes(bytes);
                writer.pad_to(16);
            }
        }

        writer.patch_u32(TOTAL_SIZE_OFFSET, writer.len() as u32);
        for (index, offset) in new_offsets.iter().enumerate() {
            writer.patch_u32(OFFSET_TABLE_START + index * 4, *offset);
        }

        writer.into_bytes()
    }
}
