//! glyphbook: learn a codebook of 8x8 glyphs from photographs.
//! Stages: crop sampling, k-means clustering, smoothing/deduplication, and
//! emission as C source, SVG outlines and a font. Procedural block glyphs
//! are generated through the same emitters.

mod atomic;
pub mod bitmap;
pub mod blocks;
pub mod cluster;
pub mod codebook;
pub mod config;
pub mod dataset;
pub mod emit;
mod error;
pub mod fontforge;
mod glyph;
mod npy;
pub mod pipeline;
pub mod postprocess;
pub mod sampler;

pub use bitmap::{Bitmap, GLYPH_CELLS, GLYPH_SIDE};
pub use blocks::BlockLayout;
pub use cluster::{Backend, KMeans};
pub use codebook::Codebook;
pub use config::Config;
pub use dataset::Dataset;
pub use error::{GlyphError, Result};
pub use glyph::{Glyph, SymbolTag, DEFAULT_CODEPOINT_BASE, MAX_CODEPOINT};
pub use postprocess::{Kernel, KernelKind};

// Test utilities
pub mod test_support;

/// A sink for glyphs: C source, SVG files, text dumps.
pub trait GlyphTarget {
    fn glyph(&mut self, glyph: &Glyph) -> Result<()>;

    /// Called once after the last glyph.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Feed every glyph to `target`, then finish it. Returns the glyph count.
pub fn emit_all<T: GlyphTarget + ?Sized>(
    target: &mut T,
    glyphs: impl IntoIterator<Item = Glyph>,
) -> Result<usize> {
    let mut count = 0;
    for glyph in glyphs {
        target.glyph(&glyph)?;
        count += 1;
    }
    target.finish()?;
    Ok(count)
}
