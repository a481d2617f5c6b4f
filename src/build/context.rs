//! Build context containing configuration and state for a build.

use crate::config::SiteConfig;
use std::path::{Path, PathBuf};

/// Build context containing configuration and paths for a build operation.
///
/// The context provides access to all information needed to execute the stage
/// sequence, including the configuration, project root, and the resolved
/// source and output trees.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// The loaded configuration
    config: SiteConfig,
    /// Project root directory (where site.toml is located)
    project_root: PathBuf,
    /// Whether to run in verbose mode
    verbose: bool,
}

impl BuildContext {
    /// Create a new build context.
    ///
    /// # Arguments
    /// - `config` - The loaded configuration
    /// - `project_root` - The project root directory
    pub fn new(config: SiteConfig, project_root: PathBuf) -> Self {
        Self { config, project_root, verbose: false }
    }

    /// Get the configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// Get the project root directory.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the source tree (resolved to an absolute path).
    pub fn src_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.src)
    }

    /// Get the output tree (resolved to an absolute path).
    pub fn out_dir(&self) -> PathBuf {
        self.resolve_path(&self.config.project.out)
    }

    /// Whether verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Resolve a path relative to the project root.
    ///
    /// If the path is absolute, returns it unchanged.
    /// If relative, joins it with the project root.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Entry stylesheet (resolved to an absolute path).
    pub fn styles_entry(&self) -> PathBuf {
        self.src_dir().join(&self.config.styles.entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;

    #[test]
    fn test_build_context_new() {
        let config = default_config();
        let root = PathBuf::from("/project");
        let ctx = BuildContext::new(config, root.clone());

        assert_eq!(ctx.project_root(), &root);
        assert!(!ctx.is_verbose());
    }

    #[test]
    fn test_build_context_with_verbose() {
        let config = default_config();
        let ctx = BuildContext::new(config, PathBuf::from("/project")).with_verbose(true);
        assert!(ctx.is_verbose());
    }

    #[test]
    fn test_build_context_resolve_path_absolute() {
        let config = default_config();
        let ctx = BuildContext::new(config, PathBuf::from("/project"));
        assert_eq!(ctx.resolve_path(Path::new("/other/path")), PathBuf::from("/other/path"));
    }

    #[test]
    fn test_build_context_resolve_path_relative() {
        let config = default_config();
        let ctx = BuildContext::new(config, PathBuf::from("/project"));
        assert_eq!(ctx.resolve_path(Path::new("img")), PathBuf::from("/project/img"));
    }

    #[test]
    fn test_build_context_dirs() {
        let config = default_config();
        let ctx = BuildContext::new(config, PathBuf::from("/project"));
        assert_eq!(ctx.src_dir(), PathBuf::from("/project/source"));
        assert_eq!(ctx.out_dir(), PathBuf::from("/project/build"));
        assert_eq!(ctx.styles_entry(), PathBuf::from("/project/source/sass/style.scss"));
    }
}
