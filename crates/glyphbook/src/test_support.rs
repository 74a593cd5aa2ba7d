//! Test support utilities for glyphbook.
//!
//! Builders for synthetic corpora and datasets, and an in-memory glyph sink.
//! Not part of the stable API.

use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{Bitmap, Dataset, Glyph, GlyphTarget, Result, GLYPH_CELLS};

/// Collects emitted glyphs for inspection.
#[derive(Default)]
pub struct BufferTarget {
    pub glyphs: Vec<Glyph>,
    pub finished: bool,
}

impl BufferTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bitmaps(&self) -> Vec<Bitmap> {
        self.glyphs.iter().map(|g| g.bitmap).collect()
    }
}

impl GlyphTarget for BufferTarget {
    fn glyph(&mut self, glyph: &Glyph) -> Result<()> {
        self.glyphs.push(glyph.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

/// Write `count` grayscale PNGs of `width`x`height` with random rectangles
/// into `dir`, named `img000.png`, `img001.png`, ...
pub fn write_corpus(
    dir: &Path,
    count: usize,
    width: u32,
    height: u32,
    seed: u64,
) -> Result<Vec<PathBuf>> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut paths = Vec::with_capacity(count);
    for i in 0..count {
        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        for _ in 0..4 {
            let x0 = rng.gen_range(0..width);
            let y0 = rng.gen_range(0..height);
            let x1 = rng.gen_range(x0..width);
            let y1 = rng.gen_range(y0..height);
            let shade = rng.gen::<u8>();
            for y in y0..=y1 {
                for x in x0..=x1 {
                    img.put_pixel(x, y, Luma([shade]));
                }
            }
        }
        let path = dir.join(format!("img{i:03}.png"));
        img.save(&path)?;
        paths.push(path);
    }
    Ok(paths)
}

/// `rows` random binary 64-cell vectors.
pub fn random_dataset(rows: usize, seed: u64) -> Dataset {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut dataset = Dataset::with_capacity(GLYPH_CELLS, rows);
    let mut row = [0u8; GLYPH_CELLS];
    for _ in 0..rows {
        for v in row.iter_mut() {
            *v = rng.gen_bool(0.5) as u8;
        }
        dataset
            .push(&row)
            .expect("row length matches the dataset dimension");
    }
    dataset
}

/// The left four columns set.
pub fn left_half() -> Bitmap {
    Bitmap::from_fn(|_, c| c < 4)
}
