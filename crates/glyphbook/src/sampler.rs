//! Random crop sampling from a photo corpus.
//!
//! Each visit picks one corpus image (uniformly, with replacement) and cuts
//! several crops with a fixed 1:2 width:height ratio out of it. Crops are
//! reduced to 1 bit by error diffusion and box-averaged down to 8x8.
use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};

use image::{imageops, DynamicImage, GenericImageView};
use rand::Rng;

use crate::{
    bitmap::{Bitmap, GLYPH_CELLS, GLYPH_SIDE},
    config::SamplerConfig,
    dataset::Dataset,
    error::{GlyphError, Result},
};

/// Smallest crop width ever drawn.
pub const MIN_CROP_WIDTH: u32 = 16;
/// Exclusive upper bound on the crop width.
pub const MAX_CROP_WIDTH: u32 = 48;

/// The set of image files matched by a glob pattern.
#[derive(Clone, Debug)]
pub struct Corpus {
    pattern: String,
    paths: Vec<PathBuf>,
}

impl Corpus {
    /// Expand `pattern` (a leading `~` means the home directory).
    /// Fails with `EmptyCorpus` when nothing matches.
    pub fn from_glob(pattern: &str) -> Result<Self> {
        let expanded = expand_home(pattern);
        let walker = glob::glob(&expanded)
            .map_err(|e| GlyphError::InvalidConfig(format!("bad glob '{pattern}': {e}")))?;
        let mut paths: Vec<PathBuf> = walker
            .filter_map(|e| e.ok())
            .filter(|p| p.is_file())
            .collect();
        paths.sort();
        Self::from_paths(pattern, paths)
    }

    pub fn from_paths(pattern: impl Into<String>, paths: Vec<PathBuf>) -> Result<Self> {
        let pattern = pattern.into();
        if paths.is_empty() {
            return Err(GlyphError::EmptyCorpus(pattern));
        }
        Ok(Self { pattern, paths })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

fn expand_home(pattern: &str) -> String {
    if let Some(rest) = pattern.strip_prefix('~') {
        if rest.is_empty() || rest.starts_with('/') {
            if let Some(home) = dirs::home_dir() {
                return format!("{}{rest}", home.display());
            }
        }
    }
    pattern.to_string()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Valid crop widths for an image: `16 .. min(width, height / 2, 48)`.
pub fn crop_width_range(width: u32, height: u32) -> Result<Range<u32>> {
    let max = width.min(height / 2).min(MAX_CROP_WIDTH);
    if MIN_CROP_WIDTH >= max {
        return Err(GlyphError::InvalidCropBounds {
            width,
            height,
            min: MIN_CROP_WIDTH,
            max,
        });
    }
    Ok(MIN_CROP_WIDTH..max)
}

/// Draw a crop of height `2w` that lies inside a `width x height` image.
pub fn choose_crop<R: Rng>(rng: &mut R, width: u32, height: u32) -> Result<CropRect> {
    let w = rng.gen_range(crop_width_range(width, height)?);
    let h = 2 * w;
    let x = rng.gen_range(0..width - w);
    let y = rng.gen_range(0..height - h);
    Ok(CropRect {
        x,
        y,
        width: w,
        height: h,
    })
}

/// Reduce one region of `image` to an 8x8 glyph.
pub fn crop_to_bitmap(image: &DynamicImage, rect: CropRect) -> Bitmap {
    let mut gray = image
        .crop_imm(rect.x, rect.y, rect.width, rect.height)
        .to_luma8();
    imageops::dither(&mut gray, &imageops::BiLevel);
    let small = imageops::thumbnail(&gray, GLYPH_SIDE as u32, GLYPH_SIDE as u32);
    Bitmap::from_fn(|r, c| small.get_pixel(c as u32, r as u32).0[0] >= 128)
}

/// Sample `config.crops_per_image` crops from each visited image.
///
/// `on_visit` is called once per successfully visited image.
pub fn sample_corpus<R: Rng>(
    corpus: &Corpus,
    config: &SamplerConfig,
    rng: &mut R,
    mut on_visit: impl FnMut(&Path),
) -> Result<Dataset> {
    if config.dim != GLYPH_CELLS {
        return Err(GlyphError::ShapeMismatch {
            expected: GLYPH_CELLS,
            actual: config.dim,
        });
    }
    if config.crops_per_image == 0 {
        return Err(GlyphError::InvalidConfig("crops per image must be positive".into()));
    }
    let visits = config.images.unwrap_or(corpus.len());
    tracing::info!(
        images = corpus.len(),
        visits,
        crops = config.crops_per_image,
        rows = visits * config.crops_per_image,
        "sampling corpus"
    );

    let mut dataset = Dataset::with_capacity(config.dim, visits * config.crops_per_image);
    let mut unusable = HashSet::new();
    let mut visited = 0;
    while visited < visits {
        if unusable.len() == corpus.len() {
            return Err(GlyphError::NoUsableImages(corpus.len()));
        }
        let idx = rng.gen_range(0..corpus.len());
        if unusable.contains(&idx) {
            continue;
        }
        let path = &corpus.paths[idx];
        let image = image::open(path)?;
        let (width, height) = image.dimensions();
        if let Err(e) = crop_width_range(width, height) {
            tracing::debug!(path = %path.display(), "skipping image: {e}");
            unusable.insert(idx);
            continue;
        }
        for _ in 0..config.crops_per_image {
            let rect = choose_crop(rng, width, height)?;
            dataset.push(&crop_to_bitmap(&image, rect).to_vec())?;
        }
        visited += 1;
        on_visit(path);
    }
    Ok(dataset)
}
