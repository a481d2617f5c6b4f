//! Configuration loading and discovery for `site.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::SiteConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "site.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse site.toml: {0}")]
    Parse(#[from] toml::de::Error),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override source directory
    pub src: Option<PathBuf>,
    /// Override output directory
    pub out: Option<PathBuf>,
    /// Override dev server port
    pub port: Option<u16>,
    /// Override deploy remote
    pub remote: Option<String>,
    /// Override deploy branch
    pub branch: Option<String>,
}

/// Find `site.toml` by walking up from the current working directory.
///
/// # Returns
/// - `Some(path)` if a config file is found in the CWD or any ancestor
/// - `None` otherwise
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from)
}

/// Find `site.toml` by walking up from a given directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut dir = Some(start.as_path());
    while let Some(current) = dir {
        let candidate = current.join(CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

/// Load configuration from a path, or return defaults when `path` is `None`.
pub fn load_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    match path {
        Some(p) => {
            let content = fs::read_to_string(p)?;
            let config: SiteConfig = toml::from_str(&content)?;
            Ok(config)
        }
        None => Ok(SiteConfig::default()),
    }
}

/// Return a plain default configuration.
pub fn default_config() -> SiteConfig {
    SiteConfig::default()
}

/// Apply CLI overrides on top of a loaded configuration.
pub fn merge_cli_overrides(config: &mut SiteConfig, overrides: &CliOverrides) {
    if let Some(src) = &overrides.src {
        config.project.src = src.clone();
    }
    if let Some(out) = &overrides.out {
        config.project.out = out.clone();
    }
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
    if let Some(remote) = &overrides.remote {
        config.deploy.remote = remote.clone();
    }
    if let Some(branch) = &overrides.branch {
        config.deploy.branch = branch.clone();
    }
}
