//! End-to-end runs of the file-to-file stages on a tiny synthetic corpus.
use std::fs;

use glyphbook::{
    config::{ClusterConfig, EmitConfig, PostprocessConfig, SamplerConfig},
    pipeline::{
        create_dataset, generate_font, generate_source, generate_vector_art, run_all,
        run_clustering, run_postprocess,
    },
    test_support::write_corpus,
    Backend, Bitmap, Codebook, GlyphError, KernelKind, MAX_CODEPOINT,
};

#[test]
fn corpus_to_c_source_and_svgs() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let images = root.join("images");
    fs::create_dir(&images).unwrap();
    write_corpus(&images, 4, 96, 192, 21).unwrap();

    let sampler = SamplerConfig {
        glob: images.join("*.png").to_string_lossy().into_owned(),
        crops_per_image: 10,
        seed: Some(3),
        save: root.join("chafa8x8.npz"),
        ..SamplerConfig::default()
    };
    create_dataset(&sampler, |_| {}).unwrap();

    let clustering = ClusterConfig {
        dataset: sampler.save.clone(),
        save: root.join("raw.json"),
        clusters: 8,
        backend: Backend::Flat,
        iterations: 5,
        seed: Some(3),
    };
    let raw = run_clustering(&clustering).unwrap();
    assert_eq!(raw.len(), 8);

    let post = PostprocessConfig {
        input: clustering.save.clone(),
        save: root.join("chafa8x8.json"),
        kernel: KernelKind::Gaussian,
    };
    let codebook = run_postprocess(&post).unwrap();
    assert!(codebook.len() <= 8);
    assert!(!codebook.has_duplicates());
    assert!(codebook.is_sorted_by_ink());

    let emit = EmitConfig {
        codebook: post.save.clone(),
        c_source: root.join("chafa8x8.h"),
        svg_dir: root.join("svg"),
        ..EmitConfig::default()
    };
    assert_eq!(generate_source(&emit).unwrap(), codebook.len());
    let svgs = generate_vector_art(&emit).unwrap();
    assert_eq!(svgs.len(), codebook.len());
    let c = fs::read_to_string(&emit.c_source).unwrap();
    assert_eq!(c.matches("CHAFA_SYMBOL_TAG_CUSTOM,").count(), codebook.len());
}

#[test]
fn missing_font_tool_is_typed() {
    let dir = tempfile::tempdir().unwrap();
    let codebook = dir.path().join("cb.json");
    Codebook::default().save(&codebook).unwrap();
    let emit = EmitConfig {
        codebook,
        svg_dir: dir.path().join("svg"),
        font: dir.path().join("out.ttf"),
        fontforge: dir.path().join("missing-fontforge"),
        ..EmitConfig::default()
    };
    let err = generate_font(&emit).unwrap_err();
    assert!(matches!(err, GlyphError::FontToolUnavailable { .. }), "{err}");
    assert!(!emit.font.exists());
}

#[test]
fn failed_font_run_keeps_previous_font() {
    let dir = tempfile::tempdir().unwrap();
    let codebook = dir.path().join("cb.json");
    Codebook::default().save(&codebook).unwrap();
    let emit = EmitConfig {
        codebook,
        svg_dir: dir.path().join("svg"),
        font: dir.path().join("chafa8x8.ttf"),
        fontforge: dir.path().join("missing-fontforge"),
        ..EmitConfig::default()
    };
    fs::write(&emit.font, "good font").unwrap();
    let err = generate_font(&emit).unwrap_err();
    assert!(matches!(err, GlyphError::FontToolUnavailable { .. }), "{err}");
    assert_eq!(fs::read_to_string(&emit.font).unwrap(), "good font");
}

#[test]
fn codepoints_past_unicode_are_rejected_before_writing() {
    let dir = tempfile::tempdir().unwrap();
    let codebook = dir.path().join("cb.json");
    Codebook::new(vec![Bitmap::from_fn(|r, _| r < 4); 4])
        .save(&codebook)
        .unwrap();
    let emit = EmitConfig {
        codebook,
        c_source: dir.path().join("chafa8x8.h"),
        svg_dir: dir.path().join("svg"),
        font: dir.path().join("chafa8x8.ttf"),
        base: 0x10fffe,
        ..EmitConfig::default()
    };
    let err = generate_source(&emit).unwrap_err();
    assert!(matches!(err, GlyphError::InvalidConfig(_)), "{err}");
    assert!(!emit.c_source.exists());
    let err = generate_vector_art(&emit).unwrap_err();
    assert!(matches!(err, GlyphError::InvalidConfig(_)), "{err}");
    assert!(!emit.svg_dir.exists());
    let err = generate_font(&emit).unwrap_err();
    assert!(matches!(err, GlyphError::InvalidConfig(_)), "{err}");

    let emit = EmitConfig {
        base: MAX_CODEPOINT - 3,
        ..emit
    };
    assert_eq!(generate_source(&emit).unwrap(), 4);
    let c = fs::read_to_string(&emit.c_source).unwrap();
    assert!(c.contains("0x10ffff,"));
}

#[test]
fn run_all_stops_at_font_but_keeps_earlier_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw.json");
    Codebook::new(vec![Bitmap::from_fn(|r, _| r < 4)])
        .save(&raw)
        .unwrap();
    let post = PostprocessConfig {
        input: raw,
        save: dir.path().join("chafa8x8.json"),
        ..PostprocessConfig::default()
    };
    let emit = EmitConfig {
        codebook: dir.path().join("ignored.json"),
        c_source: dir.path().join("chafa8x8.h"),
        svg_dir: dir.path().join("svg"),
        font: dir.path().join("chafa8x8.ttf"),
        fontforge: dir.path().join("missing-fontforge"),
        ..EmitConfig::default()
    };
    let err = run_all(&post, &emit).unwrap_err();
    assert!(matches!(err, GlyphError::FontToolUnavailable { .. }));
    assert!(post.save.is_file());
    assert!(emit.c_source.is_file());
    assert!(emit.svg_dir.join("0.svg").is_file());
}
