//! Source file discovery for the pipeline.
//!
//! Selects source files with glob patterns resolved against a base
//! directory. An empty match is not an error; stages simply produce no
//! output for that pattern.

use glob::glob;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error during source discovery.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// Invalid glob pattern
    #[error("Invalid glob pattern '{0}': {1}")]
    InvalidPattern(String, glob::PatternError),
    /// IO error during file enumeration
    #[error("IO error during discovery: {0}")]
    Io(#[from] std::io::Error),
}

/// Discover files matching a glob pattern.
///
/// # Arguments
/// - `base_dir` - Base directory to resolve the pattern from
/// - `pattern` - Glob pattern to match
///
/// # Returns
/// Sorted list of matching file paths (directories are filtered out).
pub fn discover_files(base_dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, DiscoveryError> {
    let full_pattern = base_dir.join(pattern);
    let pattern_str = full_pattern.to_string_lossy();

    let paths =
        glob(&pattern_str).map_err(|e| DiscoveryError::InvalidPattern(pattern.to_string(), e))?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => return Err(DiscoveryError::Io(e.into_error())),
        }
    }

    // Deterministic ordering keeps builds reproducible across runs
    files.sort();
    Ok(files)
}

/// Discover files matching any of several glob patterns, deduplicated.
pub fn discover_multi(
    base_dir: &Path,
    patterns: &[String],
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let mut files = Vec::new();
    for pattern in patterns {
        files.extend(discover_files(base_dir, pattern)?);
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Check if a path has one of the given extensions (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            extensions.iter().any(|x| *x == lower)
        })
        .unwrap_or(false)
}
