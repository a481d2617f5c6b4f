//! Integration tests for the full build pipeline
//!
//! These run the real stage sequence against a scaffolded source tree and
//! verify:
//! - The output tree contains every expected artifact
//! - Rebuilds are deterministic (byte-identical output, hash verified)
//! - Verbatim asset copying preserves layout
//! - Every optimized raster gains a WebP sibling
//! - The icon sprite carries one symbol per source icon
//! - Stylesheet artifacts (expanded, minified, source map) and failure modes
//! - Watch-event classification routes changes to the right stage

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use sitekit::build::{BuildContext, BuildPipeline, Stage};
use sitekit::config::default_config;
use sitekit::watch::{classify, ChangeKind};

// ============================================================================
// Test Utilities
// ============================================================================

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn write_png(path: &Path, w: u32, h: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([(x * 40) as u8, (y * 40) as u8, 128])
    });
    img.save(path).unwrap();
}

fn write_jpg(path: &Path, w: u32, h: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([200, (x * 30) as u8, (y * 30) as u8])
    });
    img.save(path).unwrap();
}

fn pipeline_in(temp: &TempDir) -> BuildPipeline {
    let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());
    BuildPipeline::new(ctx)
}

/// Scaffold a source tree exercising every stage.
fn scaffold_full_site(temp: &TempDir) {
    let src = temp.path().join("source");
    write(
        &src.join("index.html"),
        "<html>\n  <head>\n    <title>Site</title>\n  </head>\n  <body>\n    <h1>Hello</h1>\n  </body>\n</html>",
    );
    write(&src.join("about.html"), "<html>\n  <body>\n    <p>About</p>\n  </body>\n</html>");
    write(
        &src.join("sass/style.scss"),
        "@use \"colors\";\nbody {\n  color: colors.$ink;\n  user-select: none;\n}",
    );
    write(&src.join("sass/_colors.scss"), "$ink: #222222;");
    write(&src.join("js/app.js"), "const greet = (name) => {\n  return `hi ${name}`;\n};\n");
    write(&src.join("fonts/body/regular.woff2"), "woff2bytes");
    write(&src.join("favicon.ico"), "icobytes");
    write(
        &src.join("img/vector/sprite/arrow.svg"),
        "<svg viewBox=\"0 0 8 8\"><path d=\"M0 4h8\"/></svg>",
    );
    write(
        &src.join("img/vector/sprite/cross.svg"),
        "<svg viewBox=\"0 0 8 8\"><metadata>editor junk</metadata><path d=\"M0 0l8 8\"/></svg>",
    );
    write(
        &src.join("img/vector/star.svg"),
        "<?xml version=\"1.0\"?><svg xmlns=\"http://www.w3.org/2000/svg\"><path d=\"M1 1\"/></svg>",
    );
    write(&src.join("img/hero.svg"), "<svg xmlns=\"http://www.w3.org/2000/svg\"/>");
    write_png(&src.join("img/photo.png"), 6, 4);
    write_jpg(&src.join("img/banner.jpg"), 8, 4);
}

fn hash_file(path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(fs::read(path).unwrap());
    format!("{:x}", hasher.finalize())
}

/// Hash every file in a tree, keyed by relative path.
fn tree_hashes(root: &Path) -> BTreeMap<PathBuf, String> {
    fn visit(root: &Path, dir: &Path, acc: &mut BTreeMap<PathBuf, String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                visit(root, &path, acc);
            } else {
                acc.insert(path.strip_prefix(root).unwrap().to_path_buf(), hash_file(&path));
            }
        }
    }
    let mut acc = BTreeMap::new();
    visit(root, root, &mut acc);
    acc
}

// ============================================================================
// Full Build
// ============================================================================

#[test]
fn full_build_produces_expected_tree() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);

    let result = pipeline_in(&temp).build().unwrap();
    assert!(result.is_success(), "summary: {}", result.summary());

    let out = temp.path().join("build");
    for artifact in [
        "index.html",
        "about.html",
        "css/styles.css",
        "css/styles.min.css",
        "css/styles.min.css.map",
        "js/app.min.js",
        "fonts/body/regular.woff2",
        "favicon.ico",
        "img/vector/sprite.svg",
        "img/vector/star.svg",
        "img/vector/hero.svg",
        "img/raster/photo.png",
        "img/raster/banner.jpg",
        "img/webp/photo.webp",
        "img/webp/banner.webp",
    ] {
        assert!(out.join(artifact).exists(), "missing artifact: {}", artifact);
    }
}

#[test]
fn rebuild_is_byte_identical() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);
    let pipeline = pipeline_in(&temp);

    pipeline.build().unwrap();
    let first = tree_hashes(&temp.path().join("build"));
    assert!(!first.is_empty());

    pipeline.build().unwrap();
    let second = tree_hashes(&temp.path().join("build"));
    assert_eq!(first, second);
}

#[test]
fn build_starts_from_clean_output() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);
    write(&temp.path().join("build/orphan/file.txt"), "stale");

    pipeline_in(&temp).build().unwrap();
    assert!(!temp.path().join("build/orphan").exists());
}

// ============================================================================
// Asset Copying
// ============================================================================

#[test]
fn copied_assets_preserve_layout_and_bytes() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);

    pipeline_in(&temp).build().unwrap();

    let src = temp.path().join("source");
    let out = temp.path().join("build");
    for rel in ["fonts/body/regular.woff2", "favicon.ico"] {
        assert_eq!(
            fs::read(src.join(rel)).unwrap(),
            fs::read(out.join(rel)).unwrap(),
            "copied asset differs: {}",
            rel
        );
    }
}

// ============================================================================
// Raster Images
// ============================================================================

#[test]
fn every_optimized_raster_gains_a_webp() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);
    write_png(&temp.path().join("source/img/extra.png"), 3, 3);

    pipeline_in(&temp).build().unwrap();

    let raster: Vec<_> = fs::read_dir(temp.path().join("build/img/raster"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(raster.len(), 3);

    for source in raster {
        let stem = source.file_stem().unwrap();
        let sibling = temp
            .path()
            .join("build/img/webp")
            .join(stem)
            .with_extension("webp");
        assert!(sibling.exists(), "no webp for {}", source.display());
        let bytes = fs::read(sibling).unwrap();
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(&bytes[8..12], b"WEBP");
    }
}

// ============================================================================
// SVG Sprite
// ============================================================================

#[test]
fn sprite_has_one_symbol_per_icon() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);

    pipeline_in(&temp).build().unwrap();

    let doc = fs::read_to_string(temp.path().join("build/img/vector/sprite.svg")).unwrap();
    assert_eq!(doc.matches("<symbol").count(), 2);
    assert!(doc.contains("id=\"arrow\""));
    assert!(doc.contains("id=\"cross\""));
    assert!(doc.contains("viewBox=\"0 0 8 8\""));
    assert!(!doc.contains("metadata"));
}

#[test]
fn standalone_icons_are_sanitized() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);

    pipeline_in(&temp).build().unwrap();

    let icon = fs::read_to_string(temp.path().join("build/img/vector/star.svg")).unwrap();
    assert!(!icon.contains("<?xml"));
    assert!(icon.contains("<path"));
}

// ============================================================================
// Stylesheets
// ============================================================================

#[test]
fn style_artifacts_expanded_minified_and_mapped() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);

    pipeline_in(&temp).build().unwrap();

    let css_dir = temp.path().join("build/css");
    let expanded = fs::read_to_string(css_dir.join("styles.css")).unwrap();
    let minified = fs::read_to_string(css_dir.join("styles.min.css")).unwrap();
    let map = fs::read_to_string(css_dir.join("styles.min.css.map")).unwrap();

    // Partial resolved through @use
    assert!(expanded.contains("#222"), "expanded: {}", expanded);
    // Vendor prefix added for the configured browser floor
    assert!(minified.contains("-webkit-user-select"), "minified: {}", minified);
    assert!(minified.len() < expanded.len());
    assert!(minified.contains("sourceMappingURL=styles.min.css.map"));

    let map_json: serde_json::Value = serde_json::from_str(&map).unwrap();
    assert_eq!(map_json["version"], 3);
}

#[test]
fn broken_stylesheet_warns_but_does_not_fail_the_build() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);
    write(&temp.path().join("source/sass/style.scss"), "body { color: }}}");

    let result = pipeline_in(&temp).build().unwrap();
    assert!(result.is_success(), "summary: {}", result.summary());
    assert!(!result.warnings().is_empty());
    assert!(!temp.path().join("build/css/styles.css").exists());
    // Everything else still built
    assert!(temp.path().join("build/index.html").exists());
}

// ============================================================================
// Markup and Scripts
// ============================================================================

#[test]
fn markup_is_minified_without_reload_script() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);

    pipeline_in(&temp).build().unwrap();

    let html = fs::read_to_string(temp.path().join("build/index.html")).unwrap();
    let original = fs::read_to_string(temp.path().join("source/index.html")).unwrap();
    assert!(html.len() < original.len());
    assert!(html.contains("Hello"));
    // Live reload is injected by the dev server at request time only
    assert!(!html.contains("EventSource"));
}

#[test]
fn scripts_are_minified_with_min_suffix() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);

    pipeline_in(&temp).build().unwrap();

    let minified = fs::read_to_string(temp.path().join("build/js/app.min.js")).unwrap();
    let original = fs::read_to_string(temp.path().join("source/js/app.js")).unwrap();
    assert!(minified.len() < original.len());
    // The copier also carries the readable original alongside
    assert!(temp.path().join("build/js/app.js").exists());
}

// ============================================================================
// Watch Routing
// ============================================================================

#[test]
fn watch_events_route_to_single_stages() {
    let src = PathBuf::from("/site/source");
    assert_eq!(classify(&src.join("sass/blocks/_nav.scss"), &src), Some(ChangeKind::Styles));
    assert_eq!(classify(&src.join("index.html"), &src), Some(ChangeKind::Markup));
    assert_eq!(classify(&src.join("js/app.js"), &src), Some(ChangeKind::Scripts));
    assert_eq!(classify(&src.join("img/photo.png"), &src), None);

    assert_eq!(ChangeKind::Styles.stage(), Stage::Styles);
    assert_eq!(ChangeKind::Markup.stage(), Stage::Html);
    assert_eq!(ChangeKind::Scripts.stage(), Stage::Scripts);
}

#[test]
fn single_stage_rerun_updates_only_its_outputs() {
    let temp = TempDir::new().unwrap();
    scaffold_full_site(&temp);
    let pipeline = pipeline_in(&temp);
    pipeline.build().unwrap();

    let css_before = hash_file(&temp.path().join("build/css/styles.min.css"));
    let js_before = hash_file(&temp.path().join("build/js/app.min.js"));

    write(
        &temp.path().join("source/sass/_colors.scss"),
        "$ink: #aa0000;",
    );
    let result = pipeline.execute_stage(Stage::Styles);
    assert!(result.status.is_success());

    assert_ne!(hash_file(&temp.path().join("build/css/styles.min.css")), css_before);
    assert_eq!(hash_file(&temp.path().join("build/js/app.min.js")), js_before);
}
