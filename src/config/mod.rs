//! Configuration management for sitekit projects
//!
//! Handles loading and validation of `site.toml` configuration files.

pub mod loader;
pub mod schema;

pub use loader::{
    default_config, find_config, load_config, merge_cli_overrides, CliOverrides, ConfigError,
};
pub use schema::{
    AssetsConfig, DeployConfig, ImagesConfig, ProjectConfig, ServerConfig, SiteConfig,
    StylesConfig, WatchConfig,
};
