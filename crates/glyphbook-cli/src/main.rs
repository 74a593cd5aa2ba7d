use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glyphbook::{
    config::{BlockConfig, ClusterConfig, EmitConfig, PostprocessConfig, SamplerConfig},
    dataset::Dataset,
    pipeline::{self, DatasetOutcome},
    sampler::Corpus,
    Backend, BlockLayout, Config, KernelKind,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod progress;

#[derive(Parser)]
#[command(
    name = "glyphbook",
    version,
    about = "Learn 8x8 glyph codebooks from photos and emit C, SVG and font files"
)]
struct Cli {
    /// JSON configuration file; command line flags take precedence
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Sample random crops from an image corpus into a dataset
    #[command(visible_alias = "CreateDataset")]
    CreateDataset {
        #[arg(long)]
        glob: Option<String>,
        /// Crops per visited image
        #[arg(short = 'm', long)]
        crops: Option<usize>,
        /// Vector length (must be 64)
        #[arg(short = 'n', long)]
        dim: Option<usize>,
        /// Number of image visits (default: corpus size)
        #[arg(long)]
        images: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Cluster the dataset into a raw codebook
    #[command(visible_alias = "Clustering")]
    Cluster {
        #[arg(long)]
        dataset: Option<PathBuf>,
        #[arg(long)]
        save: Option<PathBuf>,
        #[arg(short = 'c', long)]
        clusters: Option<usize>,
        /// minibatch or flat
        #[arg(short = 'b', long)]
        backend: Option<Backend>,
        #[arg(short = 'i', long)]
        iterations: Option<usize>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Smooth and deduplicate a raw codebook
    #[command(visible_alias = "Postproc")]
    Postprocess {
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        save: Option<PathBuf>,
        /// gaussian or mean
        #[arg(long)]
        kernel: Option<KernelKind>,
    },
    /// Print a codebook as text grids
    #[command(visible_alias = "Dump")]
    Dump {
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Write the codebook as C symbol definitions
    #[command(visible_alias = "GenC")]
    GenerateSource {
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        dst: Option<PathBuf>,
        #[arg(long, value_parser = parse_codepoint)]
        base: Option<u32>,
    },
    /// Write one SVG outline per codebook entry
    #[command(visible_alias = "GenSVG")]
    GenerateVectorArt {
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Build a font from the SVG outlines with FontForge
    #[command(visible_alias = "GenFont")]
    GenerateFont {
        #[command(flatten)]
        font: FontArgs,
    },
    /// Postprocess, then generate C source, SVGs and the font
    #[command(visible_alias = "GenA")]
    RunAll {
        /// Raw codebook to postprocess
        #[arg(long)]
        raw: Option<PathBuf>,
        #[arg(long)]
        kernel: Option<KernelKind>,
        #[arg(long)]
        dst: Option<PathBuf>,
        #[command(flatten)]
        font: FontArgs,
    },
    /// Enumerate block element glyphs for a fixed partition
    #[command(visible_alias = "GenBlocks")]
    GenerateBlocks {
        /// 3x3 or 2x4
        #[arg(long)]
        layout: Option<BlockLayout>,
        #[arg(long)]
        dst: Option<PathBuf>,
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long, value_parser = parse_codepoint)]
        base: Option<u32>,
    },
}

#[derive(Args)]
struct FontArgs {
    /// Codebook (postprocessed) to emit
    #[arg(long)]
    json: Option<PathBuf>,
    #[arg(long)]
    svg_dir: Option<PathBuf>,
    #[arg(long)]
    ttf: Option<PathBuf>,
    #[arg(long, value_parser = parse_codepoint)]
    base: Option<u32>,
    #[arg(long)]
    fontforge: Option<PathBuf>,
}

impl FontArgs {
    fn apply(self, cfg: &mut EmitConfig) {
        set(&mut cfg.codebook, self.json);
        set(&mut cfg.svg_dir, self.svg_dir);
        set(&mut cfg.font, self.ttf);
        set(&mut cfg.base, self.base);
        set(&mut cfg.fontforge, self.fontforge);
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

/// Accepts `0x10c000`, `U+10C000` or plain decimal.
fn parse_codepoint(s: &str) -> std::result::Result<u32, String> {
    let hex = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .or_else(|| s.strip_prefix("U+"))
        .or_else(|| s.strip_prefix("u+"));
    let value = match hex {
        Some(h) => u32::from_str_radix(h, 16),
        None => s.parse(),
    }
    .map_err(|e| format!("invalid codepoint '{s}': {e}"))?;
    if value > 0x10_ffff {
        return Err(format!("codepoint {value:#x} is beyond U+10FFFF"));
    }
    Ok(value)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Cmd::CreateDataset {
            glob,
            crops,
            dim,
            images,
            seed,
            save,
        } => {
            let cfg: &mut SamplerConfig = &mut config.sampler;
            set(&mut cfg.glob, glob);
            set(&mut cfg.crops_per_image, crops);
            set(&mut cfg.dim, dim);
            cfg.images = images.or(cfg.images);
            cfg.seed = seed.or(cfg.seed);
            set(&mut cfg.save, save);
            create_dataset(cfg)?;
        }
        Cmd::Cluster {
            dataset,
            save,
            clusters,
            backend,
            iterations,
            seed,
        } => {
            let cfg: &mut ClusterConfig = &mut config.cluster;
            set(&mut cfg.dataset, dataset);
            set(&mut cfg.save, save);
            set(&mut cfg.clusters, clusters);
            set(&mut cfg.backend, backend);
            set(&mut cfg.iterations, iterations);
            cfg.seed = seed.or(cfg.seed);
            let codebook = pipeline::run_clustering(cfg)?;
            eprintln!("{} centroids -> {}", codebook.len(), cfg.save.display());
        }
        Cmd::Postprocess { json, save, kernel } => {
            let cfg: &mut PostprocessConfig = &mut config.postprocess;
            set(&mut cfg.input, json);
            set(&mut cfg.save, save);
            set(&mut cfg.kernel, kernel);
            let codebook = pipeline::run_postprocess(cfg)?;
            eprintln!("{} glyphs -> {}", codebook.len(), cfg.save.display());
        }
        Cmd::Dump { json } => {
            let path = json.unwrap_or(config.emit.codebook);
            pipeline::dump(&path, io::stdout().lock())?;
        }
        Cmd::GenerateSource { json, dst, base } => {
            let cfg: &mut EmitConfig = &mut config.emit;
            set(&mut cfg.codebook, json);
            set(&mut cfg.c_source, dst);
            set(&mut cfg.base, base);
            let n = pipeline::generate_source(cfg)?;
            eprintln!("{n} glyphs -> {}", cfg.c_source.display());
        }
        Cmd::GenerateVectorArt { json, dir } => {
            let cfg: &mut EmitConfig = &mut config.emit;
            set(&mut cfg.codebook, json);
            set(&mut cfg.svg_dir, dir);
            let files = pipeline::generate_vector_art(cfg)?;
            eprintln!("{} SVG files -> {}", files.len(), cfg.svg_dir.display());
        }
        Cmd::GenerateFont { font } => {
            let cfg: &mut EmitConfig = &mut config.emit;
            font.apply(cfg);
            let path = pipeline::generate_font(cfg)?;
            eprintln!("done. the font has been written as {}", path.display());
        }
        Cmd::RunAll {
            raw,
            kernel,
            dst,
            font,
        } => {
            let post: &mut PostprocessConfig = &mut config.postprocess;
            set(&mut post.input, raw);
            set(&mut post.kernel, kernel);
            if let Some(json) = &font.json {
                post.save = json.clone();
            }
            let emit: &mut EmitConfig = &mut config.emit;
            font.apply(emit);
            set(&mut emit.c_source, dst);
            let path = pipeline::run_all(post, emit)?;
            eprintln!("done. the font has been written as {}", path.display());
        }
        Cmd::GenerateBlocks {
            layout,
            dst,
            dir,
            base,
        } => {
            let mut cfg: BlockConfig = config.blocks;
            if let Some(layout) = layout {
                // file names follow the layout unless given explicitly
                cfg = BlockConfig {
                    layout,
                    c_source: PathBuf::from(format!("BE{}.c", layout.combinations())),
                    svg_dir: PathBuf::from(layout.combinations().to_string()),
                    base: cfg.base,
                };
            }
            set(&mut cfg.c_source, dst);
            set(&mut cfg.svg_dir, dir);
            cfg.base = base.or(cfg.base);
            let n = pipeline::generate_blocks(&cfg)?;
            eprintln!(
                "{n} block glyphs -> {} and {}",
                cfg.c_source.display(),
                cfg.svg_dir.display()
            );
        }
    }
    Ok(())
}

fn create_dataset(cfg: &SamplerConfig) -> Result<()> {
    let total = if Dataset::is_cached(&cfg.save) {
        0
    } else {
        match cfg.images {
            Some(n) => n,
            None => Corpus::from_glob(&cfg.glob)?.len(),
        }
    };
    let bar = progress::visits(total as u64);
    let outcome = pipeline::create_dataset(cfg, |path| progress::visited(&bar, path));
    bar.finish_and_clear();
    match outcome? {
        DatasetOutcome::Cached(path) => {
            eprintln!("{} exists, nothing to do", path.display());
        }
        DatasetOutcome::Sampled { rows, path } => {
            eprintln!("{rows} samples -> {}", path.display());
        }
    }
    Ok(())
}
