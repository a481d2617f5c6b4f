//! Markup minifier stage.

use super::{ensure_parent, StageError, StageOutput};
use crate::build::{discover_files, BuildContext};
use minify_html::{minify, Cfg};
use std::fs;

/// Minify every top-level markup file into the output root.
///
/// Whitespace collapsing only; embedded CSS and JS are left alone (they are
/// handled by their own stages) and structural content is preserved.
pub fn run(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let out_dir = ctx.out_dir();
    let files = discover_files(&ctx.src_dir(), "*.html")?;

    let cfg = minify_cfg();
    let mut outputs = Vec::with_capacity(files.len());
    for file in files {
        let content = fs::read(&file).map_err(|e| StageError::io(&file, e))?;
        let minified = minify(&content, &cfg);

        let file_name = file.file_name().unwrap_or_default();
        let dest = out_dir.join(file_name);
        ensure_parent(&dest)?;
        fs::write(&dest, minified).map_err(|e| StageError::io(&dest, e))?;
        outputs.push(dest);
    }
    Ok(StageOutput::files(outputs))
}

fn minify_cfg() -> Cfg {
    let mut cfg = Cfg::spec_compliant();
    cfg.minify_css = false;
    cfg.minify_js = false;
    cfg
}
