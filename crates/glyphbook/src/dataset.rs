//! Sampled bitmap vectors and their `.npz` cache file.
use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use zip::{result::ZipError, write::SimpleFileOptions, CompressionMethod, ZipArchive, ZipWriter};

use crate::{
    atomic::write_atomic,
    error::{GlyphError, Result},
    npy,
};

/// Archive member holding the matrix, as `numpy.savez(path, dataset=...)` names it.
pub const DATASET_MEMBER: &str = "dataset.npy";

/// Row-major `(len, dim)` matrix of binary samples.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    dim: usize,
    data: Vec<u8>,
}

impl Dataset {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            data: Vec::new(),
        }
    }

    pub fn with_capacity(dim: usize, rows: usize) -> Self {
        Self {
            dim,
            data: Vec::with_capacity(dim * rows),
        }
    }

    pub fn from_rows<R: AsRef<[u8]>>(
        dim: usize,
        rows: impl IntoIterator<Item = R>,
    ) -> Result<Self> {
        let mut ds = Self::new(dim);
        for row in rows {
            ds.push(row.as_ref())?;
        }
        Ok(ds)
    }

    pub fn push(&mut self, row: &[u8]) -> Result<()> {
        if row.len() != self.dim {
            return Err(GlyphError::ShapeMismatch {
                expected: self.dim,
                actual: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.data.len() / self.dim
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn row(&self, i: usize) -> &[u8] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks_exact(self.dim.max(1))
    }

    /// Fail with `ShapeMismatch` unless rows have `expected` elements.
    pub fn ensure_dim(&self, expected: usize) -> Result<()> {
        if self.dim != expected {
            return Err(GlyphError::ShapeMismatch {
                expected,
                actual: self.dim,
            });
        }
        Ok(())
    }

    /// Flattened `f32` copy for the clustering stage.
    pub fn to_f32(&self) -> Vec<f32> {
        self.data.iter().map(|&v| v as f32).collect()
    }

    /// Write the dataset as an uncompressed `.npz` archive, atomically.
    pub fn save_npz(&self, path: &Path) -> Result<()> {
        let payload = npy::encode_u8_matrix(self.len(), self.dim, &self.data);
        write_atomic(path, |file| {
            let mut zip = ZipWriter::new(file);
            let options = SimpleFileOptions::default()
                .compression_method(CompressionMethod::Stored)
                .large_file(payload.len() as u64 >= u32::MAX as u64);
            zip.start_file(DATASET_MEMBER, options)?;
            zip.write_all(&payload)?;
            zip.finish()?;
            Ok(())
        })?;
        tracing::info!(
            rows = self.len(),
            dim = self.dim,
            path = %path.display(),
            "dataset saved"
        );
        Ok(())
    }

    pub fn load_npz(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        let mut member = match archive.by_name(DATASET_MEMBER) {
            Ok(m) => m,
            Err(ZipError::FileNotFound) => {
                return Err(GlyphError::Npy(format!(
                    "{} has no '{DATASET_MEMBER}' member",
                    path.display()
                )))
            }
            Err(e) => return Err(e.into()),
        };
        let mut bytes = Vec::new();
        member.read_to_end(&mut bytes)?;
        let (rows, dim, data) = npy::decode_u8_matrix(&bytes)?;
        tracing::info!(rows, dim, path = %path.display(), "dataset loaded");
        Ok(Self { dim, data })
    }

    /// Whether a cache file already exists at `path`.
    pub fn is_cached(path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }
}
