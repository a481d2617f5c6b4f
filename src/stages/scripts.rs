//! Script minifier stage.

use super::{ensure_parent, StageError, StageOutput};
use crate::build::{discover_files, BuildContext};
use minify_js::{minify, Session, TopLevelMode};
use std::fs;
use std::path::Path;

/// Minify every top-level script in `js/` into `js/<stem>.min.js` under the
/// output tree. Strictly one-to-one; no bundling or cross-file resolution.
pub fn run(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let js_dir = ctx.out_dir().join("js");
    let files = discover_files(&ctx.src_dir(), "js/*.js")?;

    let session = Session::new();
    let mut outputs = Vec::with_capacity(files.len());
    for file in files {
        let source = fs::read(&file).map_err(|e| StageError::io(&file, e))?;
        let mut minified = Vec::new();
        minify(&session, TopLevelMode::Global, &source, &mut minified).map_err(|e| {
            StageError::Script { path: file.clone(), message: format!("{:?}", e) }
        })?;

        let dest = js_dir.join(minified_name(&file));
        ensure_parent(&dest)?;
        fs::write(&dest, minified).map_err(|e| StageError::io(&dest, e))?;
        outputs.push(dest);
    }
    Ok(StageOutput::files(outputs))
}

/// `app.js` -> `app.min.js`
fn minified_name(file: &Path) -> String {
    let stem = file.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    format!("{}.min.js", stem)
}
