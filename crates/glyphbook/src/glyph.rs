use crate::{
    bitmap::Bitmap,
    error::{GlyphError, Result},
};

/// Supplementary private use area B, where learned glyphs are placed by default.
pub const DEFAULT_CODEPOINT_BASE: u32 = 0x10_0000;

/// Last codepoint of the Unicode range.
pub const MAX_CODEPOINT: u32 = 0x10_FFFF;

/// `base + offset`, or `None` past [`MAX_CODEPOINT`].
pub fn codepoint_at(base: u32, offset: usize) -> Option<u32> {
    u32::try_from(offset)
        .ok()
        .and_then(|offset| base.checked_add(offset))
        .filter(|&cp| cp <= MAX_CODEPOINT)
}

/// Fails with [`GlyphError::InvalidConfig`] unless `base .. base + count`
/// stays within the Unicode range.
pub fn check_codepoint_range(base: u32, count: usize) -> Result<()> {
    match codepoint_at(base, count.saturating_sub(1)) {
        Some(_) => Ok(()),
        None => Err(GlyphError::InvalidConfig(format!(
            "{count} codepoints from base {base:#x} run past U+{MAX_CODEPOINT:X}"
        ))),
    }
}

/// Symbol class a glyph is registered under by the consuming renderer.
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub enum SymbolTag {
    /// Glyph learned from a photo corpus
    #[default]
    Custom,
    /// Procedurally enumerated block element
    Block,
}

impl SymbolTag {
    /// Name of the matching C enumerator in the renderer's symbol table.
    pub fn c_name(self) -> &'static str {
        match self {
            SymbolTag::Custom => "CHAFA_SYMBOL_TAG_CUSTOM",
            SymbolTag::Block => "CHAFA_SYMBOL_TAG_BLOCK",
        }
    }
}

/// A codepoint assignment for one bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Glyph {
    /// Position in the source codebook or enumeration
    pub id: usize,
    pub codepoint: u32,
    pub tag: SymbolTag,
    pub bitmap: Bitmap,
}

impl Glyph {
    pub fn new(id: usize, codepoint: u32, tag: SymbolTag, bitmap: Bitmap) -> Self {
        Self {
            id,
            codepoint,
            tag,
            bitmap,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        char::from_u32(self.codepoint)
    }
}
