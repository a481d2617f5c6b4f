//! Cleaner stage: discard the previous output tree.

use super::{StageError, StageOutput};
use crate::build::BuildContext;
use std::fs;

/// Remove the output directory and everything under it.
///
/// Idempotent: a missing output directory is not an error. Every full build
/// starts here so no artifact can depend on prior output state.
pub fn run(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let out_dir = ctx.out_dir();
    if out_dir.exists() {
        fs::remove_dir_all(&out_dir).map_err(|e| StageError::io(&out_dir, e))?;
    }
    Ok(StageOutput::default())
}
