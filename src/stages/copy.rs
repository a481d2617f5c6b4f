//! Copier stage: pass-through assets.

use super::{ensure_parent, StageError, StageOutput};
use crate::build::{discover_multi, BuildContext};
use std::fs;

/// Copy every file matched by the configured glob set, byte-identical,
/// preserving the path relative to the source tree.
pub fn run(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let src_dir = ctx.src_dir();
    let out_dir = ctx.out_dir();
    let files = discover_multi(&src_dir, &ctx.config().assets.copy)?;

    let mut outputs = Vec::with_capacity(files.len());
    for file in files {
        // Glob results are rooted at src_dir, so the prefix always strips
        let rel = match file.strip_prefix(&src_dir) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let dest = out_dir.join(rel);
        ensure_parent(&dest)?;
        fs::copy(&file, &dest).map_err(|e| StageError::io(&file, e))?;
        outputs.push(dest);
    }
    Ok(StageOutput::files(outputs))
}
