//! Output formats for glyph sets.
//!
//! Every writer implements [`GlyphTarget`](crate::GlyphTarget) so the same
//! glyph stream (a codebook or a block enumeration) can feed any of them.
mod csource;
mod dump;
mod svg;

pub use csource::{write_c_source, CSourceWriter};
pub use dump::DumpWriter;
pub use svg::{write_svg_dir, SvgDirWriter, SvgGeometry, SvgRect};

/// Local time in the `Sun Jan  1 00:00:00 2023` form used in generated headers.
pub fn timestamp() -> String {
    chrono::Local::now().format("%a %b %e %H:%M:%S %Y").to_string()
}
