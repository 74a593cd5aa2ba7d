use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{
    atomic::write_bytes_atomic,
    bitmap::{Bitmap, GLYPH_SIDE},
    blocks::BlockLayout,
    error::Result,
    glyph::Glyph,
    GlyphTarget,
};

/// Canvas of one glyph in font units.
pub const CANVAS_WIDTH: f64 = 500.0;
pub const CANVAS_HEIGHT: f64 = 1000.0;

// Overshoot of the learned-glyph grid past each canvas edge.
const BLEED_LEFT: f64 = 50.0;
const BLEED_RIGHT: f64 = 50.0;
const BLEED_TOP: f64 = 200.0;
const BLEED_BOTTOM: f64 = 75.0;

/// How bitmap cells map to rectangles on the canvas.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SvgGeometry {
    /// One rectangle per set pixel on the oversized 8x8 grid
    Bleed,
    /// One rectangle per filled partition cell, tiling the canvas exactly
    Blocks(BlockLayout),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SvgRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SvgGeometry {
    pub fn rects(self, bitmap: &Bitmap) -> Vec<SvgRect> {
        match self {
            SvgGeometry::Bleed => {
                let width = (BLEED_LEFT + CANVAS_WIDTH + BLEED_RIGHT) / GLYPH_SIDE as f64;
                let height = (BLEED_TOP + CANVAS_HEIGHT + BLEED_BOTTOM) / GLYPH_SIDE as f64;
                bitmap
                    .set_cells()
                    .map(|(r, c)| SvgRect {
                        x: -BLEED_LEFT + c as f64 * width,
                        y: -BLEED_TOP + r as f64 * height,
                        width,
                        height,
                    })
                    .collect()
            }
            SvgGeometry::Blocks(layout) => {
                let width = round3(CANVAS_WIDTH / layout.columns() as f64);
                let height = round3(CANVAS_HEIGHT / layout.grid_rows() as f64);
                layout
                    .cells()
                    .into_iter()
                    .filter(|cell| {
                        cell.rows
                            .clone()
                            .all(|r| cell.cols.clone().all(|c| bitmap.get(r, c)))
                    })
                    .map(|cell| SvgRect {
                        x: round3(cell.grid_col as f64 * CANVAS_WIDTH / layout.columns() as f64),
                        y: round3(cell.grid_row as f64 * CANVAS_HEIGHT / layout.grid_rows() as f64),
                        width,
                        height,
                    })
                    .collect()
            }
        }
    }

    /// Complete SVG document for `bitmap`.
    pub fn document(self, bitmap: &Bitmap) -> String {
        let mut svg = String::new();
        svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            svg,
            "<svg version=\"1.1\" height=\"{CANVAS_HEIGHT}\" width=\"{CANVAS_WIDTH}\" viewBox=\"0 0 {CANVAS_WIDTH} {CANVAS_HEIGHT}\"><defs />"
        );
        svg.push_str("<g>\n");
        for rect in self.rects(bitmap) {
            let _ = writeln!(
                svg,
                "<rect style=\"fill:#000000\" width=\"{}\" height=\"{}\" x=\"{}\" y=\"{}\" />",
                rect.width, rect.height, rect.x, rect.y
            );
        }
        svg.push_str("</g>\n</svg>\n");
        svg
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Writes one `<id>.svg` per glyph into a directory.
pub struct SvgDirWriter {
    dir: PathBuf,
    geometry: SvgGeometry,
    written: Vec<PathBuf>,
}

impl SvgDirWriter {
    pub fn new(dir: impl Into<PathBuf>, geometry: SvgGeometry) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            geometry,
            written: Vec::new(),
        })
    }

    pub fn path_for(dir: &Path, id: usize) -> PathBuf {
        dir.join(format!("{id}.svg"))
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl GlyphTarget for SvgDirWriter {
    fn glyph(&mut self, glyph: &Glyph) -> Result<()> {
        let path = Self::path_for(&self.dir, glyph.id);
        write_bytes_atomic(&path, self.geometry.document(&glyph.bitmap).as_bytes())?;
        self.written.push(path);
        Ok(())
    }
}

/// Write an SVG per glyph to `dir`, creating it if needed.
pub fn write_svg_dir(
    dir: &Path,
    geometry: SvgGeometry,
    glyphs: impl IntoIterator<Item = Glyph>,
) -> Result<Vec<PathBuf>> {
    let mut writer = SvgDirWriter::new(dir, geometry)?;
    crate::emit_all(&mut writer, glyphs)?;
    tracing::info!(files = writer.written.len(), dir = %dir.display(), "SVG files written");
    Ok(writer.written)
}
