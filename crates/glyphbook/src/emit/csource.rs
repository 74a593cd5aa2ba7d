use std::io::{BufWriter, Write};
use std::path::Path;

use crate::{
    atomic::write_atomic,
    error::Result,
    glyph::{Glyph, SymbolTag},
    GlyphTarget,
};

/// Writes glyphs as C struct initialisers for the renderer's symbol table:
///
/// ```text
/// {
///     /* Chafa8x8 Font, ID: 3, Unicode: 0x100003 */
///     CHAFA_SYMBOL_TAG_CUSTOM,
///     0x100003,
///     "XXXX    "
///     ...
/// },
/// ```
///
/// Glyphs without ink are kept but disabled with `#if 0`.
pub struct CSourceWriter<W: Write> {
    out: W,
    count: usize,
}

impl<W: Write> CSourceWriter<W> {
    /// Starts the output with a comment naming `generator` and `version`.
    pub fn new(mut out: W, generator: &str, version: &str) -> Result<Self> {
        writeln!(out, "/* Auto-generated by {generator}")?;
        writeln!(out, " * Version: {version}")?;
        writeln!(out, " */")?;
        Ok(Self { out, count: 0 })
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GlyphTarget for CSourceWriter<W> {
    fn glyph(&mut self, glyph: &Glyph) -> Result<()> {
        let disabled = glyph.bitmap.is_blank();
        if disabled {
            writeln!(self.out, "#if 0")?;
        }
        writeln!(self.out, "{{")?;
        match glyph.tag {
            SymbolTag::Custom => writeln!(
                self.out,
                "    /* Chafa8x8 Font, ID: {}, Unicode: 0x{:x} */",
                glyph.id, glyph.codepoint
            )?,
            SymbolTag::Block => writeln!(
                self.out,
                "    /* Auto-Gen block, mask: {}, Unicode: 0x{:x} */",
                glyph.id, glyph.codepoint
            )?,
        }
        writeln!(self.out, "    {},", glyph.tag.c_name())?;
        writeln!(self.out, "    0x{:x},", glyph.codepoint)?;
        for row in glyph.bitmap.row_strings('X', ' ') {
            writeln!(self.out, "    \"{row}\"")?;
        }
        writeln!(self.out, "}},")?;
        if disabled {
            writeln!(self.out, "#endif")?;
        }
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Write all `glyphs` to `path` as C source, replacing it atomically.
pub fn write_c_source(
    path: &Path,
    glyphs: impl IntoIterator<Item = Glyph>,
    generator: &str,
    version: &str,
) -> Result<usize> {
    let mut count = 0;
    write_atomic(path, |file| {
        let mut writer = CSourceWriter::new(BufWriter::new(file), generator, version)?;
        count = crate::emit_all(&mut writer, glyphs)?;
        Ok(())
    })?;
    tracing::info!(glyphs = count, path = %path.display(), "C source written");
    Ok(count)
}
