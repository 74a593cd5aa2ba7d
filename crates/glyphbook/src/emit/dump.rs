use std::io::Write;

use crate::{error::Result, glyph::Glyph, GlyphTarget};

/// Plain-text listing: a `________ <id>` separator, the grid, a blank line.
pub struct DumpWriter<W: Write> {
    out: W,
}

impl<W: Write> DumpWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> GlyphTarget for DumpWriter<W> {
    fn glyph(&mut self, glyph: &Glyph) -> Result<()> {
        writeln!(self.out, "________ {}", glyph.id)?;
        writeln!(self.out, "{}", glyph.bitmap)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
