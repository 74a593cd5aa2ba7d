//! Procedural block elements: every combination of a fixed rectangular
//! partition of the glyph cell.
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    bitmap::Bitmap,
    glyph::{codepoint_at, Glyph, SymbolTag},
};

/// Pixel bands of the 3x3 layout on the 8x8 grid.
const THIRDS: [Range<usize>; 3] = [0..3, 3..5, 5..8];

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockLayout {
    /// 2 columns x 4 rows, 256 combinations
    Grid2x4,
    /// 3 columns x 3 rows, 512 combinations
    #[default]
    Grid3x3,
}

/// One partition cell, in 8x8 pixels and in its column/row position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockCell {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
    pub grid_row: usize,
    pub grid_col: usize,
}

impl BlockLayout {
    pub fn columns(self) -> usize {
        match self {
            BlockLayout::Grid2x4 => 2,
            BlockLayout::Grid3x3 => 3,
        }
    }

    pub fn grid_rows(self) -> usize {
        match self {
            BlockLayout::Grid2x4 => 4,
            BlockLayout::Grid3x3 => 3,
        }
    }

    pub fn cell_count(self) -> usize {
        self.columns() * self.grid_rows()
    }

    /// Number of masks including the empty one.
    pub fn combinations(self) -> u32 {
        1 << self.cell_count()
    }

    /// Number of emitted glyphs; the empty mask is skipped.
    pub fn glyph_count(self) -> u32 {
        self.combinations() - 1
    }

    pub fn default_base(self) -> u32 {
        match self {
            BlockLayout::Grid2x4 => 0x10_af00,
            BlockLayout::Grid3x3 => 0x10_c000,
        }
    }

    /// Cells in row-major order.
    pub fn cells(self) -> Vec<BlockCell> {
        let mut cells = Vec::with_capacity(self.cell_count());
        for grid_row in 0..self.grid_rows() {
            for grid_col in 0..self.columns() {
                let (rows, cols) = match self {
                    BlockLayout::Grid2x4 => (
                        grid_row * 2..grid_row * 2 + 2,
                        grid_col * 4..grid_col * 4 + 4,
                    ),
                    BlockLayout::Grid3x3 => {
                        (THIRDS[grid_row].clone(), THIRDS[grid_col].clone())
                    }
                };
                cells.push(BlockCell {
                    rows,
                    cols,
                    grid_row,
                    grid_col,
                });
            }
        }
        cells
    }

    /// Cell `k` (row-major) is selected by bit `cell_count - 1 - k`.
    pub fn selected(self, mask: u32) -> Vec<BlockCell> {
        let n = self.cell_count();
        self.cells()
            .into_iter()
            .enumerate()
            .filter(|(k, _)| mask & (1 << (n - 1 - k)) != 0)
            .map(|(_, cell)| cell)
            .collect()
    }

    pub fn bitmap(self, mask: u32) -> Bitmap {
        let cells = self.selected(mask);
        Bitmap::from_fn(|r, c| {
            cells
                .iter()
                .any(|cell| cell.rows.contains(&r) && cell.cols.contains(&c))
        })
    }

    /// All nonzero masks as glyphs at `base + mask`; `id` is the mask.
    /// Ends early at the first mask that would land past U+10FFFF.
    pub fn glyphs(self, base: u32) -> impl Iterator<Item = Glyph> {
        (1..self.combinations()).map_while(move |mask| {
            let codepoint = codepoint_at(base, mask as usize)?;
            Some(Glyph::new(
                mask as usize,
                codepoint,
                SymbolTag::Block,
                self.bitmap(mask),
            ))
        })
    }
}

impl FromStr for BlockLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "grid2x4" | "2x4" | "256" => Ok(BlockLayout::Grid2x4),
            "grid3x3" | "3x3" | "512" => Ok(BlockLayout::Grid3x3),
            other => Err(format!("unknown block layout '{other}' (expected 2x4 or 3x3)")),
        }
    }
}

impl fmt::Display for BlockLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockLayout::Grid2x4 => f.write_str("grid2x4"),
            BlockLayout::Grid3x3 => f.write_str("grid3x3"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn cells_tile_the_grid() {
        for layout in [BlockLayout::Grid2x4, BlockLayout::Grid3x3] {
            let full = layout.bitmap(layout.glyph_count());
            assert_eq!(full.ink(), 64, "{layout}");
            let area: usize = layout
                .cells()
                .iter()
                .map(|c| c.rows.len() * c.cols.len())
                .sum();
            assert_eq!(area, 64);
        }
    }

    #[test]
    fn top_left_is_high_bit() {
        let b = BlockLayout::Grid3x3.bitmap(0b100_000_000);
        assert_eq!(b, Bitmap::from_fn(|r, c| r < 3 && c < 3));
        let b = BlockLayout::Grid3x3.bitmap(0b000_000_001);
        assert_eq!(b, Bitmap::from_fn(|r, c| r >= 5 && c >= 5));
        let b = BlockLayout::Grid2x4.bitmap(0b0100_0000);
        assert_eq!(b, Bitmap::from_fn(|r, c| r < 2 && c >= 4));
    }

    #[test]
    fn every_mask_is_distinct() {
        let glyphs: Vec<_> = BlockLayout::Grid3x3.glyphs(0x10c000).collect();
        assert_eq!(glyphs.len(), 511);
        assert_eq!(glyphs[0].codepoint, 0x10c001);
        assert_eq!(glyphs[510].codepoint, 0x10c000 + 511);
        let unique: HashSet<_> = glyphs.iter().map(|g| g.bitmap).collect();
        assert_eq!(unique.len(), 511);
        assert!(glyphs.iter().all(|g| g.tag == SymbolTag::Block));
    }

    #[test]
    fn glyphs_end_at_the_last_codepoint() {
        assert_eq!(BlockLayout::Grid2x4.glyphs(0x10ff00).count(), 255);
        assert_eq!(BlockLayout::Grid2x4.glyphs(0x10ff10).count(), 0xef);
        assert_eq!(BlockLayout::Grid3x3.glyphs(u32::MAX).count(), 0);
    }

    #[test]
    fn layout_names_parse() {
        assert_eq!("3x3".parse::<BlockLayout>().unwrap(), BlockLayout::Grid3x3);
        assert_eq!("256".parse::<BlockLayout>().unwrap(), BlockLayout::Grid2x4);
        assert!("4x4".parse::<BlockLayout>().is_err());
    }
}
