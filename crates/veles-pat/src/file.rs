//! Color patch file handling.

use std::fs;
use std::path::Path;

use veles_common::{BinaryReader, BinaryWriter};
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::color::Rgba;
use crate::{Error, Result};

/// Magic bytes at the start of color patch files.
pub const PAT_MAGIC: &[u8; 4] = b"Pat0";

/// Byte offset of the paint count / offsets-per-paint pair.
pub(crate) const COUNTS_OFFSET: usize = 16;

/// Alignment of the index table; it starts at the first 16-byte boundary
/// after the counts.
pub(crate) const INDEX_ALIGN: usize = 16;

/// On-disk patch header preceding each color array.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable)]
#[repr(C)]
struct RawPatchHeader {
    target_offset: U32,
    declared_size: U32,
}

/// One geometry patch: a color array applied to one mesh region.
#[derive(Debug, Clone)]
pub struct GeometryPatch {
    header_offset: u32,
    target_offset: u32,
    colors: Vec<Rgba>,
}

impl GeometryPatch {
    /// Offset of this patch's header, as stored in the index table.
    pub fn header_offset(&self) -> u32 {
        self.header_offset
    }

    /// Target offset recorded in the patch header.
    pub fn target_offset(&self) -> u32 {
        self.target_offset
    }

    /// The patch's colors in storage order.
    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }
}

/// One paint: the group of geometry patches forming a single color entry.
#[derive(Debug, Clone)]
pub struct Paint {
    patches: Vec<GeometryPatch>,
}

impl Paint {
    /// The paint's geometry patches in index-table order.
    pub fn patches(&self) -> &[GeometryPatch] {
        &self.patches
    }

    /// Total number of colors across all geometry patches.
    pub fn flat_len(&self) -> usize {
        self.patches.iter().map(|patch| patch.colors.len()).sum()
    }
}

/// A parsed color patch file.
///
/// Each paint owns one geometry patch per named mesh region, reached through
/// a two-level indirection: the index table points at a patch header, which
/// carries a target offset and the byte count of the RGBA data that follows.
///
/// The container is an immutable snapshot of the parsed buffer; the only
/// supported mutation is [`PatFile::replace_flat_colors`], which keeps every
/// patch's size (and therefore the file layout) unchanged. Adding a paint
/// goes through [`PatFile::append_duplicate_paint`], which produces a new
/// container.
#[derive(Debug, Clone)]
pub struct PatFile {
    offsets_per_color: u16,
    paints: Vec<Paint>,
}

impl PatFile {
    /// Parse a color patch from bytes.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BinaryReader::new(data);
        reader.expect_magic(PAT_MAGIC)?;

        reader.seek(COUNTS_OFFSET);
        let color_count = reader.read_u16()? as usize;
        let offsets_per_color = reader.read_u16()?;

        let per_color = offsets_per_color as usize;
        reader.align_to(INDEX_ALIGN);
        let mut table = Vec::with_capacity(color_count * per_color);
        for _ in 0..color_count * per_color {
            table.push(reader.read_u32()?);
        }

        let mut paints = Vec::with_capacity(color_count);
        for paint in 0..color_count {
            let chunk = &table[paint * per_color..(paint + 1) * per_color];
            let mut patches = Vec::with_capacity(per_color);
            for &header_offset in chunk {
                patches.push(read_patch(data, header_offset)?);
            }
            paints.push(Paint { patches });
        }

        Ok(Self {
            offsets_per_color,
            paints,
        })
    }

    /// Read a color patch file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_extension(path)?;
        let bytes = fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Write the serialized container to disk.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        check_extension(path)?;
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Number of paint entries.
    pub fn color_count(&self) -> usize {
        self.paints.len()
    }

    /// Number of geometry-patch offsets per paint entry.
    pub fn offsets_per_color(&self) -> u16 {
        self.offsets_per_color
    }

    /// The paint entries in file order.
    pub fn paints(&self) -> &[Paint] {
        &self.paints
    }

    /// Serialize the container.
    ///
    /// Index offsets are written exactly as stored; each patch's declared
    /// size is re-derived from its in-memory color count rather than trusted
    /// from parse time, and bodies are padded to a 4-byte boundary.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut writer = BinaryWriter::new();
        writer.write_bytes(PAT_MAGIC);
        writer.zeros(12);
        writer.write_u16(self.paints.len() as u16);
        writer.write_u16(self.offsets_per_color);
        writer.pad_to(INDEX_ALIGN);

        for paint in &self.paints {
            for patch in &paint.patches {
                writer.write_u32(patch.header_offset);
            }
        }

        for paint in &self.paints {
            for patch in &paint.patches {
                writer.write_u32(patch.target_offset);
                writer.write_u32((patch.colors.len() * 4) as u32);
                for color in &patch.colors {
                    writer.write_bytes(&color.to_bytes());
                }
                writer.pad_to(4);
            }
        }

        writer.into_bytes()
    }

    /// A paint's flat color array: all of its patches' colors concatenated
    /// in geometry order. Returns `None` for an out-of-range index.
    ///
    /// This is the unit exchanged with an external pixel image - one pixel
    /// per color.
    pub fn flat_colors(&self, paint: usize) -> Option<Vec<Rgba>> {
        let paint = self.paints.get(paint)?;
        Some(
            paint
                .patches
                .iter()
                .flat_map(|patch| patch.colors.iter().copied())
                .collect(),
        )
    }

    /// Replace a paint's flat color array.
    ///
    /// The replacement must have exactly the paint's flat length; anything
    /// else is rejected with [`Error::ColorCountMismatch`] and the container
    /// is left untouched. On success the colors are distributed back across
    /// the paint's patches in geometry order.
    pub fn replace_flat_colors(&mut self, index: usize, colors: &[Rgba]) -> Result<()> {
        let count = self.paints.len();
        let paint = self
            .paints
            .get_mut(index)
            .ok_or(Error::PaintOutOfRange { index, count })?;

        let expected = paint.flat_len();
        if colors.len() != expected {
            return Err(Error::ColorCountMismatch {
                expected,
                actual: colors.len(),
            });
        }

        let mut rest = colors;
        for patch in &mut paint.patches {
            let (head, tail) = rest.split_at(patch.colors.len());
            patch.colors.copy_from_slice(head);
            rest = tail;
        }
        Ok(())
    }
}

/// Read one patch header and its color array.
fn read_patch(data: &[u8], header_offset: u32) -> Result<GeometryPatch> {
    let offset = header_offset as usize;
    let available = data.len().saturating_sub(offset);
    if available < 8 {
        return Err(Error::Truncated {
            offset,
            needed: 8,
            available,
        });
    }

    let mut reader = BinaryReader::new_at(data, offset);
    let header: RawPatchHeader = reader.read_struct()?;
    let declared = header.declared_size.get() as usize;

    // Bodies are stored rounded up to 4 bytes; the padding carries no colors.
    let stored = declared + (4 - declared % 4) % 4;
    if reader.remaining() < stored {
        return Err(Error::Truncated {
            offset,
            needed: 8 + stored,
            available,
        });
    }

    let quad_bytes = reader.read_bytes((declared / 4) * 4)?;
    let colors = quad_bytes
        .chunks_exact(4)
        .map(|quad| Rgba::from_bytes([quad[0], quad[1], quad[2], quad[3]]))
        .collect();

    Ok(GeometryPatch {
        header_offset,
        target_offset: header.target_offset.get(),
        colors,
    })
}

/// Color patch files carry the `.pat` extension.
fn check_extension(path: &Path) -> Result<()> {
    let actual = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    if actual != "pat" {
        return Err(Error::InvalidExtension {
            expected: "pat".to_string(),
            actual: actual.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a canonical container; each paint is a list of
    /// `(target_offset, colors)` geometry patches laid out back-to-back.
    pub(crate) fn build_pat(
        offsets_per_color: u16,
        paints: &[Vec<(u32, Vec<Rgba>)>],
    ) -> Vec<u8> {
        let table_len = paints.len() * offsets_per_color as usize * 4;
        let data_start = 32 + table_len;

        let mut offsets = Vec::new();
        let mut cursor = data_start;
        for paint in paints {
            for (_, colors) in paint {
                offsets.push(cursor as u32);
                cursor += 8 + colors.len() * 4;
            }
        }

        let mut writer = BinaryWriter::with_capacity(cursor);
        writer.write_bytes(PAT_MAGIC);
        writer.zeros(12);
        writer.write_u16(paints.len() as u16);
        writer.write_u16(offsets_per_color);
        writer.pad_to(INDEX_ALIGN);
        for offset in &offsets {
            writer.write_u32(*offset);
        }
        for paint in paints {
            for (target, colors) in paint {
                writer.write_u32(*target);
                writer.write_u32((colors.len() * 4) as u32);
                for color in colors {
                    writer.write_bytes(&color.to_bytes());
                }
            }
        }
        writer.into_bytes()
    }

    pub(crate) fn gradient(len: usize, base: u8) -> Vec<Rgba> {
        (0..len)
            .map(|i| Rgba::new(base.wrapping_add(i as u8), i as u8, 0x80, 0xFF))
            .collect()
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        let data = b"Pat1\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00\x00";
        assert!(matches!(PatFile::parse(data), Err(Error::Common(_))));
    }

    #[test]
    fn test_parse_reads_paints() {
        let data = build_pat(
            2,
            &[
                vec![(0x100, gradient(4, 0)), (0x200, gradient(2, 50))],
                vec![(0x100, gradient(4, 100)), (0x200, gradient(2, 150))],
            ],
        );

        let pat = PatFile::parse(&data).unwrap();
        assert_eq!(pat.color_count(), 2);
        assert_eq!(pat.offsets_per_color(), 2);

        let first = &pat.paints()[0];
        assert_eq!(first.patches().len(), 2);
        assert_eq!(first.patches()[0].target_offset(), 0x100);
        assert_eq!(first.patches()[0].colors(), &gradient(4, 0)[..]);
        assert_eq!(first.patches()[1].colors(), &gradient(2, 50)[..]);
        assert_eq!(first.flat_len(), 6);
    }

    #[test]
    fn test_serialize_round_trips() {
        let data = build_pat(
            1,
            &[vec![(0x40, gradient(8, 0))], vec![(0x40, gradient(8, 8))]],
        );
        let pat = PatFile::parse(&data).unwrap();
        assert_eq!(pat.to_bytes(), data);
    }

    #[test]
    fn test_serialize_rederives_declared_size() {
        // A declared size of 6 stores 8 bytes on disk but only one whole
        // quadruple; serialization normalizes it to 4.
        let mut writer = BinaryWriter::new();
        writer.write_bytes(PAT_MAGIC);
        writer.zeros(12);
        writer.write_u16(1);
        writer.write_u16(1);
        writer.pad_to(INDEX_ALIGN);
        writer.write_u32(36);
        writer.write_u32(0x10); // target offset
        writer.write_u32(6); // declared size, not a quadruple multiple
        writer.write_bytes(&[1, 2, 3, 4, 5, 6]);
        writer.pad_to(4);
        let data = writer.into_bytes();

        let pat = PatFile::parse(&data).unwrap();
        assert_eq!(pat.paints()[0].patches()[0].colors(), &[Rgba::new(1, 2, 3, 4)][..]);

        let rewritten = pat.to_bytes();
        let reparsed = PatFile::parse(&rewritten).unwrap();
        assert_eq!(reparsed.paints()[0].flat_len(), 1);
        assert_eq!(&rewritten[40..44], &4u32.to_le_bytes());
    }

    #[test]
    fn test_parse_rejects_truncated_patch() {
        let mut data = build_pat(1, &[vec![(0x40, gradient(4, 0))]]);
        // Point the only index entry past the end of the buffer.
        let past_end = data.len() as u32 + 8;
        data[32..36].copy_from_slice(&past_end.to_le_bytes());
        assert!(matches!(
            PatFile::parse(&data),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_oversized_declared_size() {
        let mut data = build_pat(1, &[vec![(0x40, gradient(4, 0))]]);
        // Inflate the declared size beyond the remaining bytes.
        data[40..44].copy_from_slice(&1000u32.to_le_bytes());
        assert!(matches!(
            PatFile::parse(&data),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_flat_colors_concatenates_patches() {
        let pat = PatFile::parse(&build_pat(
            2,
            &[vec![(0, gradient(3, 0)), (4, gradient(2, 10))]],
        ))
        .unwrap();

        let mut expected = gradient(3, 0);
        expected.extend(gradient(2, 10));
        assert_eq!(pat.flat_colors(0).unwrap(), expected);
        assert_eq!(pat.flat_colors(1), None);
    }

    #[test]
    fn test_replace_flat_colors_distributes() {
        let mut pat = PatFile::parse(&build_pat(
            2,
            &[vec![(0, gradient(3, 0)), (4, gradient(2, 10))]],
        ))
        .unwrap();

        let fresh = gradient(5, 200);
        pat.replace_flat_colors(0, &fresh).unwrap();
        assert_eq!(pat.paints()[0].patches()[0].colors(), &fresh[..3]);
        assert_eq!(pat.paints()[0].patches()[1].colors(), &fresh[3..]);
        assert_eq!(pat.flat_colors(0).unwrap(), fresh);
    }

    #[test]
    fn test_replace_flat_colors_rejects_wrong_length() {
        let data = build_pat(1, &[vec![(0, gradient(4, 0))]]);
        let mut pat = PatFile::parse(&data).unwrap();

        let result = pat.replace_flat_colors(0, &gradient(5, 0));
        assert!(matches!(
            result,
            Err(Error::ColorCountMismatch {
                expected: 4,
                actual: 5
            })
        ));
        // Rejected replacements must not disturb the container.
        assert_eq!(pat.to_bytes(), data);

        assert!(matches!(
            pat.replace_flat_colors(3, &gradient(4, 0)),
            Err(Error::PaintOutOfRange { index: 3, count: 1 })
        ));
    }
}
