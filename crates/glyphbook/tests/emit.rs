use std::fs;

use glyphbook::{
    emit::{write_c_source, write_svg_dir, SvgGeometry},
    emit_all,
    test_support::{left_half, BufferTarget},
    Bitmap, BlockLayout, Codebook, SymbolTag,
};
use pretty_assertions::assert_eq;

fn codebook() -> Codebook {
    Codebook::sorted_by_ink(vec![
        Bitmap::from_fn(|_, _| true),
        Bitmap::blank(),
        left_half(),
    ])
}

#[test]
fn codepoints_follow_codebook_order() {
    let mut target = BufferTarget::new();
    let n = emit_all(&mut target, codebook().glyphs(0x100000, SymbolTag::Custom)).unwrap();
    assert_eq!(n, 3);
    assert!(target.finished);
    let codes: Vec<u32> = target.glyphs.iter().map(|g| g.codepoint).collect();
    assert_eq!(codes, vec![0x100000, 0x100001, 0x100002]);
    assert_eq!(target.bitmaps(), codebook().into_entries());
}

#[test]
fn c_source_disables_blank_entries() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("chafa8x8.h");
    let n = write_c_source(
        &path,
        codebook().glyphs(0x100000, SymbolTag::Custom),
        "glyphbook test",
        "today",
    )
    .unwrap();
    assert_eq!(n, 3);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("/* Auto-generated by glyphbook test\n"));
    assert_eq!(text.matches("CHAFA_SYMBOL_TAG_CUSTOM,").count(), 3);
    assert_eq!(text.matches("#if 0").count(), 1);
    assert!(text.contains("#if 0\n{\n    /* Chafa8x8 Font, ID: 0, Unicode: 0x100000 */\n"));
    assert!(text.contains("    0x100002,\n    \"XXXXXXXX\"\n"));
    // no temporary files left behind
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn svg_files_match_set_cells() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("svg");
    write_svg_dir(&out, SvgGeometry::Bleed, codebook().glyphs(0x100000, SymbolTag::Custom))
        .unwrap();
    for (i, expected) in [0, 32, 64].into_iter().enumerate() {
        let svg = fs::read_to_string(out.join(format!("{i}.svg"))).unwrap();
        assert_eq!(svg.matches("<rect").count(), expected);
    }
}

#[test]
fn block_svgs_have_one_rect_per_cell() {
    let dir = tempfile::tempdir().unwrap();
    let layout = BlockLayout::Grid3x3;
    let paths = write_svg_dir(dir.path(), SvgGeometry::Blocks(layout), layout.glyphs(0x10c000))
        .unwrap();
    assert_eq!(paths.len(), 511);
    let full = fs::read_to_string(dir.path().join("511.svg")).unwrap();
    assert_eq!(full.matches("<rect").count(), 9);
    let single = fs::read_to_string(dir.path().join("16.svg")).unwrap();
    assert!(single.contains("width=\"166.667\" height=\"333.333\" x=\"166.667\" y=\"333.333\""));
}
