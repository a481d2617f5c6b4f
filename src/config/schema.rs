//! Configuration schema types for `site.toml`
//!
//! Defines the structure and defaults for sitekit project configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration loaded from `site.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Project directories
    #[serde(default)]
    pub project: ProjectConfig,
    /// Pass-through asset copying
    #[serde(default)]
    pub assets: AssetsConfig,
    /// Raster image processing
    #[serde(default)]
    pub images: ImagesConfig,
    /// Stylesheet compilation
    #[serde(default)]
    pub styles: StylesConfig,
    /// Dev server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
    /// Deployment target
    #[serde(default)]
    pub deploy: DeployConfig,
}

/// Project directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Source tree (read-only from the pipeline's perspective)
    #[serde(default = "default_src")]
    pub src: PathBuf,
    /// Output tree, owned entirely by the pipeline
    #[serde(default = "default_out")]
    pub out: PathBuf,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self { src: default_src(), out: default_out() }
    }
}

fn default_src() -> PathBuf {
    PathBuf::from("source")
}

fn default_out() -> PathBuf {
    PathBuf::from("build")
}

/// Glob patterns for assets copied verbatim, relative to the source tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Copy patterns; an empty match is not an error
    #[serde(default = "default_copy_patterns")]
    pub copy: Vec<String>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self { copy: default_copy_patterns() }
    }
}

fn default_copy_patterns() -> Vec<String> {
    // The glob crate has no brace expansion, so extensions are spelled out.
    vec![
        "fonts/**/*.woff".to_string(),
        "fonts/**/*.woff2".to_string(),
        "*.ico".to_string(),
        "img/**/*".to_string(),
        "js/**/*".to_string(),
    ]
}

/// Raster image re-encoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// JPEG re-encode quality (0-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// WebP derivation quality (0.0-100.0)
    #[serde(default = "default_webp_quality")]
    pub webp_quality: f32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { jpeg_quality: default_jpeg_quality(), webp_quality: default_webp_quality() }
    }
}

fn default_jpeg_quality() -> u8 {
    80
}

fn default_webp_quality() -> f32 {
    95.0
}

/// Stylesheet compilation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Entry stylesheet, relative to the source tree
    #[serde(default = "default_styles_entry")]
    pub entry: PathBuf,
    /// Output filename for the expanded CSS (the minified variant derives
    /// its name by inserting `.min` before the extension)
    #[serde(default = "default_styles_output")]
    pub output: String,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self { entry: default_styles_entry(), output: default_styles_output() }
    }
}

fn default_styles_entry() -> PathBuf {
    PathBuf::from("sass/style.scss")
}

fn default_styles_output() -> String {
    "styles.css".to_string()
}

/// Dev server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to bind on 127.0.0.1
    #[serde(default = "default_port")]
    pub port: u16,
    /// Emit permissive cross-origin headers
    #[serde(default = "default_true")]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: default_port(), cors: true }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

/// Watch mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce window for file system events, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Clear the terminal before each rebuild
    #[serde(default)]
    pub clear_screen: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms(), clear_screen: false }
    }
}

fn default_debounce_ms() -> u64 {
    100
}

/// Deployment target settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Git remote name or URL to push to
    #[serde(default = "default_remote")]
    pub remote: String,
    /// Branch receiving the published output tree
    #[serde(default = "default_branch")]
    pub branch: String,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self { remote: default_remote(), branch: default_branch() }
    }
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "gh-pages".to_string()
}
