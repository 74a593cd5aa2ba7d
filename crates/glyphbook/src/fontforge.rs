//! Font generation through FontForge's Python scripting interface.
//!
//! FontForge is an external program; we write a small script that imports
//! one SVG outline per glyph and run it with `fontforge -lang=py -script`.
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::{
    atomic::sibling_temp,
    config::FontMeta,
    error::{GlyphError, Result},
};

/// One glyph to import: its codepoint and the SVG outline file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineSource {
    pub codepoint: u32,
    pub svg: PathBuf,
}

#[derive(Clone, Debug)]
pub struct FontForge {
    program: PathBuf,
}

impl FontForge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Python source that builds the font and writes it to `output`.
    pub fn script(
        &self,
        glyphs: &[OutlineSource],
        meta: &FontMeta,
        output: &Path,
    ) -> Result<String> {
        let mut s = String::new();
        let _ = writeln!(s, "import fontforge");
        let _ = writeln!(s, "font = fontforge.font()");
        let _ = writeln!(s, "font.clear()");
        let _ = writeln!(s, "font.encoding = \"UnicodeFull\"");
        let _ = writeln!(s, "font.copyright = {}", py_str(&meta.copyright)?);
        let _ = writeln!(s, "font.fontname = {}", py_str(&meta.font_name)?);
        let _ = writeln!(s, "font.familyname = {}", py_str(&meta.family_name)?);
        let _ = writeln!(s, "font.fullname = {}", py_str(&meta.full_name)?);
        let _ = writeln!(s, "font.version = {}", py_str(&meta.version)?);
        let _ = writeln!(s, "glyphs = [");
        for g in glyphs {
            let _ = writeln!(
                s,
                "    (0x{:x}, {}),",
                g.codepoint,
                py_str(&g.svg.to_string_lossy())?
            );
        }
        let _ = writeln!(s, "]");
        let _ = writeln!(s, "for code, svg in glyphs:");
        let _ = writeln!(s, "    glyph = font.createChar(code)");
        let _ = writeln!(s, "    glyph.importOutlines(svg)");
        let _ = writeln!(s, "    glyph.left_side_bearing = 0");
        let _ = writeln!(s, "    glyph.right_side_bearing = 0");
        let _ = writeln!(s, "    glyph.width = {}", meta.advance);
        let _ = writeln!(s, "    glyph.vwidth = {}", meta.vertical_advance);
        let _ = writeln!(s, "font.generate({})", py_str(&output.to_string_lossy())?);
        let _ = writeln!(s, "font.close()");
        Ok(s)
    }

    /// Build `output` from `glyphs`; the SVG files must already exist.
    ///
    /// The tool writes to a temporary file beside `output`, which replaces
    /// `output` only once the run succeeded. A failed run leaves any
    /// previous font in place.
    pub fn generate(
        &self,
        glyphs: &[OutlineSource],
        meta: &FontMeta,
        output: &Path,
    ) -> Result<PathBuf> {
        for g in glyphs {
            if !g.svg.is_file() {
                return Err(GlyphError::GlyphImportFailed {
                    path: g.svg.clone(),
                    detail: "outline file is missing".into(),
                });
            }
        }
        // the tool picks the font format from the extension
        let suffix = output
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let staged = sibling_temp(output, &suffix)?;
        let script = self.script(glyphs, meta, staged.path())?;
        let mut file = tempfile::Builder::new()
            .prefix("glyphbook-font-")
            .suffix(".py")
            .tempfile()?;
        file.write_all(script.as_bytes())?;
        file.flush()?;

        tracing::info!(
            tool = %self.program.display(),
            glyphs = glyphs.len(),
            output = %output.display(),
            "running font tool"
        );
        let result = Command::new(&self.program)
            .arg("-lang=py")
            .arg("-script")
            .arg(file.path())
            .output()
            .map_err(|e| GlyphError::FontToolUnavailable {
                tool: self.program.display().to_string(),
                reason: e.to_string(),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(GlyphError::GlyphImportFailed {
                path: output.to_path_buf(),
                detail: format!("{}: {}", result.status, last_lines(&stderr, 5)),
            });
        }
        if fs::metadata(staged.path()).map_or(true, |m| m.len() == 0) {
            return Err(GlyphError::GlyphImportFailed {
                path: output.to_path_buf(),
                detail: "font tool exited successfully but wrote no font".into(),
            });
        }
        staged.persist(output).map_err(|e| e.error)?;
        Ok(output.to_path_buf())
    }
}

/// A Python string literal; JSON string syntax is a subset of it.
fn py_str(s: &str) -> Result<String> {
    Ok(serde_json::to_string(s)?)
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    lines[lines.len().saturating_sub(n)..].join(" | ")
}
