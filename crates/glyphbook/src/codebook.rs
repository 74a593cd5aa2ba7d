use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    atomic::write_atomic,
    bitmap::Bitmap,
    error::Result,
    glyph::{codepoint_at, Glyph, SymbolTag},
};

/// Ordered list of glyph bitmaps; position determines the assigned codepoint.
///
/// Stored on disk as a JSON array of 64-element 0/1 arrays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Codebook {
    entries: Vec<Bitmap>,
}

impl Codebook {
    pub fn new(entries: Vec<Bitmap>) -> Self {
        Self { entries }
    }

    /// Stable-sort `entries` by ink before wrapping them.
    pub fn sorted_by_ink(mut entries: Vec<Bitmap>) -> Self {
        entries.sort_by_key(Bitmap::ink);
        Self { entries }
    }

    pub fn entries(&self) -> &[Bitmap] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Bitmap> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bitmap> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bitmap> {
        self.entries.iter()
    }

    pub fn is_sorted_by_ink(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].ink() <= w[1].ink())
    }

    pub fn has_duplicates(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.entries.len());
        !self.entries.iter().all(|b| seen.insert(*b))
    }

    /// Codepoint assignment: entry `i` maps to `base + i`.
    ///
    /// Ends early at the first entry that would land past U+10FFFF; callers
    /// that need every entry check the range first.
    pub fn glyphs(&self, base: u32, tag: SymbolTag) -> impl Iterator<Item = Glyph> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map_while(move |(i, b)| {
                codepoint_at(base, i).map(|cp| Glyph::new(i, cp, tag, *b))
            })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let codebook = Self::from_json(&text)?;
        tracing::debug!(entries = codebook.len(), path = %path.display(), "codebook loaded");
        Ok(codebook)
    }

    /// Write as JSON through a temporary file.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_atomic(path, |file| {
            let mut w = BufWriter::new(file);
            serde_json::to_writer(&mut w, self)?;
            w.flush()?;
            Ok(())
        })?;
        tracing::info!(entries = self.len(), path = %path.display(), "codebook saved");
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Codebook {
    type Item = &'a Bitmap;
    type IntoIter = std::slice::Iter<'a, Bitmap>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
