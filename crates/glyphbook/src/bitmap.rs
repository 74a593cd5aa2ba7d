use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{GlyphError, Result};

/// Side length of a glyph cell grid.
pub const GLYPH_SIDE: usize = 8;
/// Number of cells in a glyph, also the dataset vector length.
pub const GLYPH_CELLS: usize = GLYPH_SIDE * GLYPH_SIDE;

/// An 8x8 binary glyph, stored row-major.
///
/// Serializes as a flat list of 64 integers, each 0 or 1, which is the
/// codebook interchange format.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct Bitmap {
    cells: [bool; GLYPH_CELLS],
}

impl Bitmap {
    pub const fn blank() -> Self {
        Self {
            cells: [false; GLYPH_CELLS],
        }
    }

    pub fn from_fn(mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut cells = [false; GLYPH_CELLS];
        for (i, cell) in cells.iter_mut().enumerate() {
            *cell = f(i / GLYPH_SIDE, i % GLYPH_SIDE);
        }
        Self { cells }
    }

    /// Build from a row-major slice of 0/1 values.
    pub fn from_cells(values: &[u8]) -> Result<Self> {
        if values.len() != GLYPH_CELLS {
            return Err(GlyphError::ShapeMismatch {
                expected: GLYPH_CELLS,
                actual: values.len(),
            });
        }
        let mut cells = [false; GLYPH_CELLS];
        for (i, &v) in values.iter().enumerate() {
            cells[i] = match v {
                0 => false,
                1 => true,
                other => {
                    return Err(GlyphError::InvalidGlyph(format!(
                        "cell {i} holds {other}, expected 0 or 1"
                    )))
                }
            };
        }
        Ok(Self { cells })
    }

    /// Hard-threshold a real-valued vector at 0.5.
    pub fn from_weights(weights: &[f32]) -> Result<Self> {
        if weights.len() != GLYPH_CELLS {
            return Err(GlyphError::ShapeMismatch {
                expected: GLYPH_CELLS,
                actual: weights.len(),
            });
        }
        Ok(Self::from_fn(|r, c| weights[r * GLYPH_SIDE + c] >= 0.5))
    }

    pub fn get(&self, row: usize, col: usize) -> bool {
        self.cells[row * GLYPH_SIDE + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: bool) {
        self.cells[row * GLYPH_SIDE + col] = value;
    }

    pub fn cells(&self) -> &[bool; GLYPH_CELLS] {
        &self.cells
    }

    /// Number of set cells.
    pub fn ink(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    pub fn is_blank(&self) -> bool {
        !self.cells.contains(&true)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.cells.chunks(GLYPH_SIDE)
    }

    /// Set cells as `(row, col)` pairs in row-major order.
    pub fn set_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c)
            .map(|(i, _)| (i / GLYPH_SIDE, i % GLYPH_SIDE))
    }

    pub fn to_weights(&self) -> [f32; GLYPH_CELLS] {
        self.cells.map(|c| if c { 1.0 } else { 0.0 })
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.cells.iter().map(|&c| c as u8).collect()
    }

    /// One string per row using `on` / `off` for the cell states.
    pub fn row_strings(&self, on: char, off: char) -> Vec<String> {
        self.rows()
            .map(|row| row.iter().map(|&c| if c { on } else { off }).collect())
            .collect()
    }
}

impl Default for Bitmap {
    fn default() -> Self {
        Self::blank()
    }
}

impl TryFrom<Vec<u8>> for Bitmap {
    type Error = GlyphError;

    fn try_from(values: Vec<u8>) -> Result<Self> {
        Self::from_cells(&values)
    }
}

impl From<Bitmap> for Vec<u8> {
    fn from(bitmap: Bitmap) -> Self {
        bitmap.to_vec()
    }
}

/// Human readable grid: `X` for ink, `.` for background.
impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.row_strings('X', '.') {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.row_strings('X', '.')).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ink_counts_set_cells() {
        let b = Bitmap::from_fn(|r, _| r < 2);
        assert_eq!(b.ink(), 16);
        assert!(!b.is_blank());
        assert!(Bitmap::blank().is_blank());
    }

    #[test]
    fn rejects_wrong_length_and_values() {
        assert!(matches!(
            Bitmap::from_cells(&[0; 63]),
            Err(GlyphError::ShapeMismatch {
                expected: 64,
                actual: 63
            })
        ));
        let mut v = vec![0u8; 64];
        v[5] = 2;
        assert!(matches!(
            Bitmap::from_cells(&v),
            Err(GlyphError::InvalidGlyph(_))
        ));
    }

    #[test]
    fn threshold_is_inclusive() {
        let mut w = [0.0f32; GLYPH_CELLS];
        w[0] = 0.5;
        w[1] = 0.4999;
        let b = Bitmap::from_weights(&w).unwrap();
        assert!(b.get(0, 0));
        assert!(!b.get(0, 1));
    }

    #[test]
    fn display_uses_dots() {
        let b = Bitmap::from_fn(|r, c| r == 0 && c == 7);
        let text = b.to_string();
        assert_eq!(text.lines().next(), Some(".......X"));
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn json_is_flat_int_list() {
        let b = Bitmap::from_fn(|r, c| r == c);
        let json = serde_json::to_string(&b).unwrap();
        assert!(json.starts_with("[1,0,0,0,0,0,0,0,0,1"));
        let back: Bitmap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, b);
    }
}
