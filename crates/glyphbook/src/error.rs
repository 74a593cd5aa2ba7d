use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GlyphError {
    #[error("no images matched corpus pattern '{0}'")]
    EmptyCorpus(String),
    #[error("image {width}x{height} too small for a crop (width range {min}..{max} is empty)")]
    InvalidCropBounds {
        width: u32,
        height: u32,
        min: u32,
        max: u32,
    },
    #[error("none of the {0} corpus images is large enough to crop")]
    NoUsableImages(usize),
    #[error("cannot build {clusters} clusters from {samples} samples")]
    InsufficientData { clusters: usize, samples: usize },
    #[error("vector length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("invalid glyph data: {0}")]
    InvalidGlyph(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
    #[error("npy error: {0}")]
    Npy(String),
    #[error("font tool '{tool}' unavailable: {reason}")]
    FontToolUnavailable { tool: String, reason: String },
    #[error("font tool failed importing glyphs into {}: {detail}", .path.display())]
    GlyphImportFailed { path: PathBuf, detail: String },
}

pub type Result<T> = std::result::Result<T, GlyphError>;
