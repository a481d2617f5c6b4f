//! Stage implementations.
//!
//! Each stage is a pure selection-and-transform step: pick source files by
//! glob, apply one or two transforms, write results under the output tree.
//! Stages share no mutable state beyond the output tree location.

pub mod clean;
pub mod copy;
pub mod html;
pub mod images;
pub mod scripts;
pub mod styles;
pub mod svg;

use crate::build::DiscoveryError;
use std::path::PathBuf;
use thiserror::Error;

/// Error raised by a stage. Fatal to the current build invocation unless the
/// stage documents otherwise (style compile errors are demoted to warnings).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StageError {
    /// File I/O error with the offending path
    #[error("{}: {source}", path.display())]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Glob selection error
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    /// Raster decode/encode error
    #[error("image {}: {message}", path.display())]
    Image {
        /// Offending image
        path: PathBuf,
        /// Decoder/encoder message
        message: String,
    },
    /// Vector markup error
    #[error("svg {}: {message}", path.display())]
    Svg {
        /// Offending document
        path: PathBuf,
        /// Parser message
        message: String,
    },
    /// Script syntax error
    #[error("script {}: {message}", path.display())]
    Script {
        /// Offending script
        path: PathBuf,
        /// Minifier message
        message: String,
    },
}

impl StageError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StageError::Io { path: path.into(), source }
    }
}

/// What a stage produced.
#[derive(Debug, Default)]
pub struct StageOutput {
    /// Files written under the output tree
    pub outputs: Vec<PathBuf>,
    /// Non-fatal problems encountered
    pub warnings: Vec<String>,
}

impl StageOutput {
    /// Output with files and no warnings.
    pub fn files(outputs: Vec<PathBuf>) -> Self {
        Self { outputs, warnings: vec![] }
    }

    /// Empty output carrying a single warning.
    pub fn warning(message: String) -> Self {
        Self { outputs: vec![], warnings: vec![message] }
    }
}

/// Create the parent directory of `path` if it does not exist yet.
pub(crate) fn ensure_parent(path: &std::path::Path) -> Result<(), StageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StageError::io(parent, e))?;
    }
    Ok(())
}
