//! Smoothing and deduplication of clustered glyphs.
//!
//! Each glyph is convolved with a 3x3 kernel over a zero-padded border,
//! re-thresholded at 0.5, and exact duplicates are dropped. The survivors
//! are stable-sorted by ink.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    bitmap::{Bitmap, GLYPH_SIDE},
    codebook::Codebook,
};

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelKind {
    /// Discrete 3x3 Gaussian
    #[default]
    Gaussian,
    /// 3x3 box average; rounds off corners more aggressively
    Mean,
}

impl FromStr for KernelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gaussian" | "gauss" => Ok(KernelKind::Gaussian),
            "mean" | "box" => Ok(KernelKind::Mean),
            other => Err(format!("unknown kernel '{other}' (expected gaussian or mean)")),
        }
    }
}

impl fmt::Display for KernelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelKind::Gaussian => f.write_str("gaussian"),
            KernelKind::Mean => f.write_str("mean"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Kernel {
    weights: [[f64; 3]; 3],
}

impl Kernel {
    pub fn new(weights: [[f64; 3]; 3]) -> Self {
        Self { weights }
    }

    pub fn gaussian() -> Self {
        Self::new([
            [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
            [2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0],
            [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
        ])
    }

    pub fn mean() -> Self {
        Self::new([[1.0 / 9.0; 3]; 3])
    }

    pub fn weights(&self) -> &[[f64; 3]; 3] {
        &self.weights
    }

    /// Same-size 2-D convolution with zero padding outside the grid.
    pub fn convolve(&self, bitmap: &Bitmap) -> [[f64; GLYPH_SIDE]; GLYPH_SIDE] {
        let side = GLYPH_SIDE as isize;
        let mut out = [[0.0; GLYPH_SIDE]; GLYPH_SIDE];
        for (r, row) in out.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (i, krow) in self.weights.iter().enumerate() {
                    for (j, &w) in krow.iter().enumerate() {
                        // true convolution: the kernel is flipped
                        let sr = r as isize + 1 - i as isize;
                        let sc = c as isize + 1 - j as isize;
                        if (0..side).contains(&sr)
                            && (0..side).contains(&sc)
                            && bitmap.get(sr as usize, sc as usize)
                        {
                            acc += w;
                        }
                    }
                }
                *value = acc;
            }
        }
        out
    }

    /// Convolve and re-threshold at 0.5.
    pub fn smooth(&self, bitmap: &Bitmap) -> Bitmap {
        let field = self.convolve(bitmap);
        Bitmap::from_fn(|r, c| field[r][c] >= 0.5)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::gaussian()
    }
}

impl From<KernelKind> for Kernel {
    fn from(kind: KernelKind) -> Self {
        match kind {
            KernelKind::Gaussian => Kernel::gaussian(),
            KernelKind::Mean => Kernel::mean(),
        }
    }
}

/// Drop exact duplicates (first occurrence wins) and stable-sort by ink.
///
/// Applying this to its own output changes nothing.
pub fn deduplicate(bitmaps: impl IntoIterator<Item = Bitmap>) -> Codebook {
    let mut seen = HashSet::new();
    let unique: Vec<Bitmap> = bitmaps.into_iter().filter(|b| seen.insert(*b)).collect();
    Codebook::sorted_by_ink(unique)
}

/// Smooth every centroid with `kernel`, then [`deduplicate`].
pub fn postprocess(centroids: &[Bitmap], kernel: &Kernel) -> Codebook {
    let codebook = deduplicate(centroids.iter().map(|b| kernel.smooth(b)));
    tracing::info!(
        before = centroids.len(),
        after = codebook.len(),
        "smoothed and deduplicated"
    );
    codebook
}
