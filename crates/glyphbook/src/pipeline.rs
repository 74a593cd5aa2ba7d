//! The stages as file-to-file jobs, one per CLI command.
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{
    blocks::BlockLayout,
    cluster::cluster,
    codebook::Codebook,
    config::{
        seeded_rng, BlockConfig, ClusterConfig, EmitConfig, PostprocessConfig, SamplerConfig,
    },
    dataset::Dataset,
    emit::{timestamp, write_c_source, write_svg_dir, DumpWriter, SvgDirWriter, SvgGeometry},
    error::Result,
    fontforge::{FontForge, OutlineSource},
    glyph::{check_codepoint_range, SymbolTag},
    postprocess::{postprocess, Kernel},
    sampler::{sample_corpus, Corpus},
};

const GENERATOR: &str = concat!("glyphbook ", env!("CARGO_PKG_VERSION"));

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetOutcome {
    /// The cache file already existed and was left untouched
    Cached(PathBuf),
    Sampled { rows: usize, path: PathBuf },
}

/// Sample the corpus into `config.save`, unless that file already exists.
///
/// `on_visit` is called for every image visited.
pub fn create_dataset(
    config: &SamplerConfig,
    on_visit: impl FnMut(&Path),
) -> Result<DatasetOutcome> {
    if Dataset::is_cached(&config.save) {
        tracing::info!(path = %config.save.display(), "dataset already exists, skipping sampling");
        return Ok(DatasetOutcome::Cached(config.save.clone()));
    }
    let corpus = Corpus::from_glob(&config.glob)?;
    let mut rng = seeded_rng(config.seed);
    let dataset = sample_corpus(&corpus, config, &mut rng, on_visit)?;
    dataset.save_npz(&config.save)?;
    Ok(DatasetOutcome::Sampled {
        rows: dataset.len(),
        path: config.save.clone(),
    })
}

/// Cluster the cached dataset and save the raw centroids.
pub fn run_clustering(config: &ClusterConfig) -> Result<Codebook> {
    let dataset = Dataset::load_npz(&config.dataset)?;
    let codebook = Codebook::new(cluster(&dataset, config)?);
    codebook.save(&config.save)?;
    Ok(codebook)
}

/// Smooth and deduplicate the raw centroids.
pub fn run_postprocess(config: &PostprocessConfig) -> Result<Codebook> {
    let raw = Codebook::load(&config.input)?;
    let codebook = postprocess(raw.entries(), &Kernel::from(config.kernel));
    codebook.save(&config.save)?;
    Ok(codebook)
}

/// Print every codebook entry to `out`.
pub fn dump(path: &Path, out: impl Write) -> Result<usize> {
    let codebook = Codebook::load(path)?;
    let mut writer = DumpWriter::new(out);
    crate::emit_all(&mut writer, codebook.glyphs(0, SymbolTag::Custom))
}

fn load_for_emit(config: &EmitConfig) -> Result<Codebook> {
    let codebook = Codebook::load(&config.codebook)?;
    check_codepoint_range(config.base, codebook.len())?;
    let blank = codebook.iter().filter(|b| b.is_blank()).count();
    if blank > 0 {
        tracing::warn!(blank, "codebook contains entries without ink");
    }
    Ok(codebook)
}

pub fn generate_source(config: &EmitConfig) -> Result<usize> {
    let codebook = load_for_emit(config)?;
    write_c_source(
        &config.c_source,
        codebook.glyphs(config.base, SymbolTag::Custom),
        GENERATOR,
        &timestamp(),
    )
}

pub fn generate_vector_art(config: &EmitConfig) -> Result<Vec<PathBuf>> {
    let codebook = load_for_emit(config)?;
    write_svg_dir(
        &config.svg_dir,
        SvgGeometry::Bleed,
        codebook.glyphs(config.base, SymbolTag::Custom),
    )
}

/// Build the font from the SVG outlines written by [`generate_vector_art`].
pub fn generate_font(config: &EmitConfig) -> Result<PathBuf> {
    let codebook = load_for_emit(config)?;
    let outlines: Vec<OutlineSource> = codebook
        .glyphs(config.base, SymbolTag::Custom)
        .map(|g| OutlineSource {
            codepoint: g.codepoint,
            svg: SvgDirWriter::path_for(&config.svg_dir, g.id),
        })
        .collect();
    let font =
        FontForge::new(&config.fontforge).generate(&outlines, &config.meta, &config.font)?;
    tracing::info!(path = %font.display(), "font written");
    Ok(font)
}

/// Postprocess, then C source, SVG and font; stops at the first failure.
pub fn run_all(post: &PostprocessConfig, emit: &EmitConfig) -> Result<PathBuf> {
    run_postprocess(post)?;
    let emit = EmitConfig {
        codebook: post.save.clone(),
        ..emit.clone()
    };
    generate_source(&emit)?;
    generate_vector_art(&emit)?;
    generate_font(&emit)
}

/// Enumerate the block layout into C source and an SVG directory.
pub fn generate_blocks(config: &BlockConfig) -> Result<usize> {
    let layout: BlockLayout = config.layout;
    let base = config.base();
    check_codepoint_range(base, layout.combinations() as usize)?;
    let count = write_c_source(&config.c_source, layout.glyphs(base), GENERATOR, &timestamp())?;
    write_svg_dir(&config.svg_dir, SvgGeometry::Blocks(layout), layout.glyphs(base))?;
    tracing::info!(
        %layout,
        glyphs = count,
        base = %format!("{base:#x}"),
        "block glyphs generated"
    );
    Ok(count)
}
