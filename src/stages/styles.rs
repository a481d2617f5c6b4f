//! Style compiler stage: SCSS to expanded and minified CSS.
//!
//! Compiles the single entry stylesheet with grass, then runs the result
//! through lightningcss for vendor prefixing, producing an expanded file, a
//! minified sibling and its source map. A syntax error in the stylesheet is
//! reported as a stage warning, not a build failure: the stage emits no
//! output and the rest of the pipeline continues.

use super::{ensure_parent, StageError, StageOutput};
use crate::build::BuildContext;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::fs;
use std::path::PathBuf;

/// Compiled style artifacts, ready to be written.
#[derive(Debug)]
pub struct StyleArtifacts {
    /// Expanded (human-readable) CSS
    pub expanded: String,
    /// Minified CSS, with the sourceMappingURL comment appended
    pub minified: String,
    /// Source map JSON for the minified variant
    pub source_map: String,
}

/// Browser targets roughly matching "last 2 versions" of the majors.
fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(114 << 16),
        edge: Some(114 << 16),
        firefox: Some(113 << 16),
        safari: Some((16 << 16) | (4 << 8)),
        ios_saf: Some((16 << 16) | (4 << 8)),
        ..Browsers::default()
    })
}

/// Run the style compiler stage.
///
/// A missing entry stylesheet produces no output (empty selection is not an
/// error); a compile error degrades to a warning.
pub fn run(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let entry = ctx.styles_entry();
    if !entry.is_file() {
        return Ok(StageOutput::default());
    }

    let output_name = &ctx.config().styles.output;
    let artifacts = match compile(&entry, output_name) {
        Ok(artifacts) => artifacts,
        Err(message) => {
            // Degrade gracefully: report, emit nothing, keep the build alive
            return Ok(StageOutput::warning(format!("{}: {}", entry.display(), message)));
        }
    };

    let css_dir = ctx.out_dir().join("css");
    let expanded_path = css_dir.join(output_name);
    let min_path = css_dir.join(minified_name(output_name));
    let map_path = css_dir.join(format!("{}.map", minified_name(output_name)));

    ensure_parent(&expanded_path)?;
    fs::write(&expanded_path, &artifacts.expanded)
        .map_err(|e| StageError::io(&expanded_path, e))?;
    fs::write(&min_path, &artifacts.minified).map_err(|e| StageError::io(&min_path, e))?;
    fs::write(&map_path, &artifacts.source_map).map_err(|e| StageError::io(&map_path, e))?;

    Ok(StageOutput::files(vec![expanded_path, min_path, map_path]))
}

/// Insert `.min` before the extension: `styles.css` -> `styles.min.css`.
pub fn minified_name(output_name: &str) -> String {
    let path = PathBuf::from(output_name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            format!("{}.min.{}", stem.to_string_lossy(), ext.to_string_lossy())
        }
        _ => format!("{}.min", output_name),
    }
}

/// Compile the entry SCSS file into the three style artifacts.
///
/// Errors are returned as plain messages; the caller decides whether they
/// are fatal.
pub fn compile(entry: &std::path::Path, output_name: &str) -> Result<StyleArtifacts, String> {
    // SCSS -> plain CSS. grass resolves @use/@import relative to the entry.
    let css = grass::from_path(entry, &grass::Options::default()).map_err(|e| e.to_string())?;

    let mut sheet = StyleSheet::parse(
        &css,
        ParserOptions { filename: output_name.to_string(), ..ParserOptions::default() },
    )
    .map_err(|e| e.to_string())?;

    sheet
        .minify(MinifyOptions { targets: browser_targets(), ..MinifyOptions::default() })
        .map_err(|e| e.to_string())?;

    let expanded = sheet
        .to_css(PrinterOptions { targets: browser_targets(), ..PrinterOptions::default() })
        .map_err(|e| e.to_string())?
        .code;

    let mut source_map = parcel_sourcemap::SourceMap::new("/");
    let source_id = source_map.add_source(output_name);
    source_map
        .set_source_content(source_id as usize, &css)
        .map_err(|e| format!("source map: {}", e))?;

    let mut minified = sheet
        .to_css(PrinterOptions {
            minify: true,
            source_map: Some(&mut source_map),
            targets: browser_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?
        .code;

    let map_name = format!("{}.map", minified_name(output_name));
    minified.push_str(&format!("\n/*# sourceMappingURL={} */", map_name));

    let source_map = source_map.to_json(None).map_err(|e| format!("source map: {}", e))?;

    Ok(StyleArtifacts { expanded, minified, source_map })
}
