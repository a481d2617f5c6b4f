//! Build system for sitekit projects.
//!
//! Runs the fixed stage sequence that turns the source tree into the
//! output tree: clean, copy, image optimization, WebP derivation, SVG
//! processing, and HTML/CSS/JS compilation.

pub mod context;
pub mod discovery;
pub mod pipeline;
pub mod result;

pub use context::BuildContext;
pub use discovery::{discover_files, discover_multi, has_extension, DiscoveryError};
pub use pipeline::{BuildPipeline, PipelineError};
pub use result::{BuildResult, StageResult, StageStatus};

/// One file-selection-plus-transform step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Remove the previous output tree
    Clean,
    /// Copy pass-through assets verbatim
    Copy,
    /// Re-encode raster images
    OptimizeImages,
    /// Derive WebP variants from the optimized rasters
    Webp,
    /// Sanitize individual vector icons
    SvgIcons,
    /// Pass through full-page vector illustrations
    SvgImages,
    /// Assemble the icon sprite document
    Sprite,
    /// Minify markup
    Html,
    /// Compile and minify the stylesheet
    Styles,
    /// Minify client scripts
    Scripts,
}

impl Stage {
    /// The default full-build sequence, in execution order.
    ///
    /// `Webp` must come after `OptimizeImages` because it reads the
    /// optimizer's output back from the output tree.
    pub const FULL_SEQUENCE: [Stage; 10] = [
        Stage::Clean,
        Stage::Copy,
        Stage::OptimizeImages,
        Stage::Webp,
        Stage::SvgIcons,
        Stage::SvgImages,
        Stage::Sprite,
        Stage::Html,
        Stage::Styles,
        Stage::Scripts,
    ];

    /// Stable name used in logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Clean => "clean",
            Stage::Copy => "copy",
            Stage::OptimizeImages => "optimize-images",
            Stage::Webp => "webp",
            Stage::SvgIcons => "svg-icons",
            Stage::SvgImages => "svg-images",
            Stage::Sprite => "sprite",
            Stage::Html => "html",
            Stage::Styles => "styles",
            Stage::Scripts => "scripts",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
