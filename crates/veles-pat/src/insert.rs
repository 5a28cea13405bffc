//! Paint duplication: appending a color entry to a serialized container.
//!
//! The index table lives in the header region, so adding a paint grows the
//! table and pushes every patch body further into the file. All existing
//! offsets must therefore be rebased by the table growth before the new
//! entry's data block is appended at the tail. No existing data byte moves;
//! only the pointers into the data region change.

use veles_common::{BinaryReader, BinaryWriter};

use crate::file::{PatFile, COUNTS_OFFSET, INDEX_ALIGN, PAT_MAGIC};
use crate::{Error, Result};

/// Append a duplicate of the last paint entry to serialized container bytes.
///
/// The new entry's data block is a byte-for-byte copy of the last paint's
/// combined patch block. Every existing index entry is shifted forward by
/// the table growth (`offsets_per_color * 4` bytes), and the new entry's
/// offsets land immediately after where the shifted original data ends.
///
/// Rebasing is only sound when every paint occupies an equal-sized,
/// contiguous block in file order; the spacing is verified across all
/// paints before any offset is trusted, and non-uniform layouts are
/// rejected with [`Error::NonUniformPaints`].
pub fn append_duplicate_paint(data: &[u8]) -> Result<Vec<u8>> {
    let mut reader = BinaryReader::new(data);
    reader.expect_magic(PAT_MAGIC)?;

    reader.seek(COUNTS_OFFSET);
    let color_count = reader.read_u16()? as usize;
    let per_color = reader.read_u16()? as usize;
    if color_count == 0 || per_color == 0 {
        return Err(Error::NoPaints);
    }

    reader.align_to(INDEX_ALIGN);
    let table_start = reader.position();
    let mut table = Vec::with_capacity(color_count * per_color);
    for _ in 0..color_count * per_color {
        table.push(reader.read_u32()?);
    }
    let data_start = reader.position();

    let block_size = paint_block_size(data, &table, color_count, per_color)?;
    let growth = (per_color * 4) as u32;
    let last_first = table[(color_count - 1) * per_color] as usize;

    let mut writer = BinaryWriter::with_capacity(data.len() + block_size + growth as usize);
    writer.write_bytes(&data[..COUNTS_OFFSET]);
    writer.write_u16((color_count + 1) as u16);
    writer.write_bytes(&data[COUNTS_OFFSET + 2..table_start]);

    // Existing entries all move forward by the table growth.
    for &offset in &table {
        writer.write_u32(offset + growth);
    }
    // The duplicate's entries point past the end of the shifted original
    // data, where its copied block is appended.
    for &offset in &table[(color_count - 1) * per_color..] {
        writer.write_u32(offset + block_size as u32 + growth);
    }

    writer.write_bytes(&data[data_start..]);
    writer.write_bytes(&data[last_first..last_first + block_size]);

    Ok(writer.into_bytes())
}

/// Byte span of one paint's combined patch block, validated to be uniform.
///
/// The span is taken from the trailing paint, which runs to the end of the
/// buffer. Every earlier paint must occupy exactly the same span with no
/// gaps; otherwise the rebased offsets would point at the wrong bytes.
fn paint_block_size(
    data: &[u8],
    table: &[u32],
    color_count: usize,
    per_color: usize,
) -> Result<usize> {
    let last_first = table[(color_count - 1) * per_color] as usize;
    if last_first > data.len() {
        return Err(Error::Truncated {
            offset: last_first,
            needed: 0,
            available: data.len(),
        });
    }
    let block_size = data.len() - last_first;

    for paint in 1..color_count {
        let previous = table[(paint - 1) * per_color];
        let spacing = table[paint * per_color].saturating_sub(previous) as usize;
        if spacing != block_size {
            return Err(Error::NonUniformPaints {
                paint,
                expected: block_size,
                found: spacing,
            });
        }
    }
    Ok(block_size)
}

impl PatFile {
    /// Append a duplicate of the last paint, returning the grown container.
    ///
    /// Serializes this container, rebases it with [`append_duplicate_paint`],
    /// and re-parses the result, so the returned snapshot is fully
    /// consistent with `color_count + 1` paints.
    pub fn append_duplicate_paint(&self) -> Result<PatFile> {
        let grown = append_duplicate_paint(&self.to_bytes())?;
        PatFile::parse(&grown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::tests::{build_pat, gradient};
    use crate::Rgba;

    #[test]
    fn test_append_grows_by_block_and_one_table_chunk() {
        // Two paints, one patch each, four colors per patch: the block is
        // 8 header bytes + 16 color bytes, and the table grows by one u32.
        let data = build_pat(
            1,
            &[vec![(0x10, gradient(4, 0))], vec![(0x10, gradient(4, 100))]],
        );
        let grown = append_duplicate_paint(&data).unwrap();
        assert_eq!(grown.len(), data.len() + 24 + 4);

        let pat = PatFile::parse(&grown).unwrap();
        assert_eq!(pat.color_count(), 3);
        assert_eq!(pat.offsets_per_color(), 1);
        assert_eq!(pat.flat_colors(2), pat.flat_colors(1));
    }

    #[test]
    fn test_append_shifts_every_original_offset() {
        let data = build_pat(
            2,
            &[
                vec![(0, gradient(4, 0)), (4, gradient(4, 10))],
                vec![(0, gradient(4, 20)), (4, gradient(4, 30))],
            ],
        );
        let original = PatFile::parse(&data).unwrap();
        let grown = PatFile::parse(&append_duplicate_paint(&data).unwrap()).unwrap();

        let growth = original.offsets_per_color() as u32 * 4;
        for (before, after) in original.paints().iter().zip(grown.paints()) {
            for (old, new) in before.patches().iter().zip(after.patches()) {
                assert_eq!(new.header_offset(), old.header_offset() + growth);
                assert_eq!(new.target_offset(), old.target_offset());
                assert_eq!(new.colors(), old.colors());
            }
        }
    }

    #[test]
    fn test_append_duplicates_last_paint_exactly() {
        let data = build_pat(
            2,
            &[
                vec![(0, gradient(6, 0)), (6, gradient(2, 40))],
                vec![(0, gradient(6, 80)), (6, gradient(2, 120))],
            ],
        );
        let grown = PatFile::parse(&append_duplicate_paint(&data).unwrap()).unwrap();

        assert_eq!(grown.color_count(), 3);
        assert_eq!(grown.flat_colors(2).unwrap(), grown.flat_colors(1).unwrap());

        // The duplicated block is positioned right behind the original data.
        let last = grown.paints().last().unwrap();
        let previous = &grown.paints()[1];
        let block = 2 * 8 + (6 + 2) * 4;
        for (old, new) in previous.patches().iter().zip(last.patches()) {
            assert_eq!(new.header_offset(), old.header_offset() + block as u32);
        }
    }

    #[test]
    fn test_append_to_single_paint_container() {
        let data = build_pat(1, &[vec![(0x20, gradient(4, 7))]]);
        let grown = PatFile::parse(&append_duplicate_paint(&data).unwrap()).unwrap();

        assert_eq!(grown.color_count(), 2);
        assert_eq!(grown.flat_colors(1).unwrap(), gradient(4, 7));
    }

    #[test]
    fn test_append_repeatedly_stays_consistent() {
        let mut data = build_pat(1, &[vec![(0, gradient(4, 0))], vec![(0, gradient(4, 60))]]);
        for round in 0..3 {
            data = append_duplicate_paint(&data).unwrap();
            let pat = PatFile::parse(&data).unwrap();
            assert_eq!(pat.color_count(), 3 + round);
            assert_eq!(pat.flat_colors(2 + round).unwrap(), gradient(4, 60));
        }
    }

    #[test]
    fn test_append_rejects_non_uniform_paints() {
        // Second paint holds fewer colors than the first, so the blocks are
        // unevenly sized and rebasing would corrupt the layout.
        let data = build_pat(
            1,
            &[vec![(0, gradient(8, 0))], vec![(0, gradient(4, 50))]],
        );
        assert!(matches!(
            append_duplicate_paint(&data),
            Err(Error::NonUniformPaints {
                paint: 1,
                expected: 24,
                found: 40
            })
        ));
    }

    #[test]
    fn test_append_rejects_empty_container() {
        let data = build_pat(1, &[]);
        assert!(matches!(
            append_duplicate_paint(&data),
            Err(Error::NoPaints)
        ));
    }

    #[test]
    fn test_container_level_append() {
        let data = build_pat(
            1,
            &[vec![(0x10, gradient(4, 0))], vec![(0x10, gradient(4, 100))]],
        );
        let pat = PatFile::parse(&data).unwrap();
        let grown = pat.append_duplicate_paint().unwrap();

        assert_eq!(grown.color_count(), pat.color_count() + 1);
        assert_eq!(
            grown.flat_colors(2).unwrap(),
            pat.flat_colors(1).unwrap()
        );
        // The original snapshot is untouched.
        assert_eq!(pat.color_count(), 2);
    }

    #[test]
    fn test_append_keeps_colors_addressable_after_edit() {
        // Insert, then replace the new paint's colors through the flat view;
        // the other paints must be unaffected.
        let data = build_pat(1, &[vec![(0, gradient(4, 0))], vec![(0, gradient(4, 60))]]);
        let mut grown = PatFile::parse(&append_duplicate_paint(&data).unwrap()).unwrap();

        let fresh = vec![Rgba::new(1, 2, 3, 4); 4];
        grown.replace_flat_colors(2, &fresh).unwrap();
        assert_eq!(grown.flat_colors(2).unwrap(), fresh);
        assert_eq!(grown.flat_colors(0).unwrap(), gradient(4, 0));
        assert_eq!(grown.flat_colors(1).unwrap(), gradient(4, 60));
    }
}
