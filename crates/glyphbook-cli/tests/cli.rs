use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::{GrayImage, Luma};
use predicates::prelude::*;

fn glyphbook() -> Command {
    Command::cargo_bin("glyphbook").unwrap()
}

fn write_images(dir: &Path) {
    for i in 0..3u32 {
        let img = GrayImage::from_fn(64, 128, |x, y| {
            Luma([if (x / (4 + i) + y / 8) % 2 == 0 { 230 } else { 20 }])
        });
        img.save(dir.join(format!("photo{i}.png"))).unwrap();
    }
}

#[test]
fn generate_blocks_writes_source_and_svgs() {
    let dir = tempfile::tempdir().unwrap();
    let c = dir.path().join("BE256.c");
    let svg = dir.path().join("256");
    glyphbook()
        .args(["generate-blocks", "--layout", "2x4", "--dst"])
        .arg(&c)
        .arg("--dir")
        .arg(&svg)
        .assert()
        .success()
        .stderr(predicate::str::contains("255 block glyphs"));
    let text = fs::read_to_string(&c).unwrap();
    assert_eq!(text.matches("CHAFA_SYMBOL_TAG_BLOCK").count(), 255);
    assert!(text.contains("0x10af01,"));
    assert!(svg.join("255.svg").is_file());
}

#[test]
fn legacy_command_names_are_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let c = dir.path().join("blocks.c");
    glyphbook()
        .args(["GenBlocks", "--base", "0x10c000", "--dst"])
        .arg(&c)
        .arg("--dir")
        .arg(dir.path().join("svg"))
        .assert()
        .success();
    let text = fs::read_to_string(&c).unwrap();
    assert!(text.contains("    0x10c1ff,\n"));
}

#[test]
fn empty_glob_fails_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let save = dir.path().join("ds.npz");
    glyphbook()
        .arg("create-dataset")
        .arg("--glob")
        .arg(dir.path().join("*.jpg"))
        .arg("--save")
        .arg(&save)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no images matched"));
    assert!(!save.exists());
}

#[test]
fn sample_cluster_postprocess_dump() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write_images(root);
    let ds = root.join("ds.npz");
    let raw = root.join("raw.json");
    let book = root.join("book.json");

    glyphbook()
        .arg("create-dataset")
        .arg("--glob")
        .arg(root.join("*.png"))
        .args(["-m", "8", "--seed", "4", "--save"])
        .arg(&ds)
        .assert()
        .success()
        .stderr(predicate::str::contains("24 samples"));

    glyphbook()
        .args(["Clustering", "-c", "4", "-b", "flat", "-i", "5", "--seed", "4", "--dataset"])
        .arg(&ds)
        .arg("--save")
        .arg(&raw)
        .assert()
        .success()
        .stderr(predicate::str::contains("4 centroids"));

    glyphbook()
        .args(["postprocess", "--kernel", "mean", "--json"])
        .arg(&raw)
        .arg("--save")
        .arg(&book)
        .assert()
        .success();
    let entries: Vec<Vec<u8>> = serde_json::from_str(&fs::read_to_string(&book).unwrap()).unwrap();
    assert!(!entries.is_empty() && entries.len() <= 4);
    assert!(entries.iter().all(|e| e.len() == 64));

    glyphbook()
        .args(["dump", "--json"])
        .arg(&book)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("________ 0\n"));
}

#[test]
fn config_file_supplies_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let c = dir.path().join("from-config.c");
    let cfg = dir.path().join("glyphbook.json");
    let json = serde_json::json!({
        "blocks": {
            "layout": "grid2x4",
            "c_source": c,
            "svg_dir": dir.path().join("svg"),
        }
    });
    fs::write(&cfg, json.to_string()).unwrap();
    glyphbook()
        .arg("--config")
        .arg(&cfg)
        .arg("generate-blocks")
        .assert()
        .success();
    assert!(c.is_file());
}

#[test]
fn missing_font_tool_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let book = dir.path().join("book.json");
    fs::write(&book, "[]").unwrap();
    glyphbook()
        .args(["generate-font", "--json"])
        .arg(&book)
        .arg("--fontforge")
        .arg(dir.path().join("no-fontforge"))
        .arg("--ttf")
        .arg(dir.path().join("out.ttf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn unknown_backend_is_rejected() {
    glyphbook()
        .args(["cluster", "--backend", "gpu"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown backend"));
}
