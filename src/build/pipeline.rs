//! Build pipeline orchestration.
//!
//! The pipeline runs the fixed stage sequence in order. Stages within the
//! sequence are strictly sequential; the only cross-stage data dependency
//! (WebP reading the optimizer's output) is enforced by stage placement.

use crate::build::{BuildContext, BuildResult, Stage, StageResult};
use crate::stages::{self, StageError, StageOutput};
use std::fs;
use std::time::Instant;
use thiserror::Error;

/// Error during pipeline setup (stage failures are carried in the
/// [`BuildResult`] instead).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// Could not create the output directory
    #[error("Failed to create output directory: {0}")]
    OutputDir(std::io::Error),
}

/// Build pipeline for executing the stage sequence.
pub struct BuildPipeline {
    /// Build context
    context: BuildContext,
    /// Whether to stop at the first failed stage
    fail_fast: bool,
    /// Whether to list stages without running them
    dry_run: bool,
}

impl BuildPipeline {
    /// Create a new build pipeline.
    pub fn new(context: BuildContext) -> Self {
        Self { context, fail_fast: true, dry_run: false }
    }

    /// Set fail-fast mode (stop on first failed stage). Defaults to true:
    /// a failed stage aborts the build invocation.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set dry-run mode (list stages without writing anything).
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Access the build context.
    pub fn context(&self) -> &BuildContext {
        &self.context
    }

    /// Run the full stage sequence.
    pub fn build(&self) -> Result<BuildResult, PipelineError> {
        self.run_stages(&Stage::FULL_SEQUENCE)
    }

    /// Run an arbitrary subset of stages in the order given. Used by the
    /// watcher to re-run only the stage a change maps to.
    pub fn run_stages(&self, stages: &[Stage]) -> Result<BuildResult, PipelineError> {
        let start = Instant::now();
        let mut result = BuildResult::new();

        if !self.dry_run {
            fs::create_dir_all(self.context.out_dir()).map_err(PipelineError::OutputDir)?;
        }

        for stage in stages {
            let stage_result = self.execute_stage(*stage);
            let failed = stage_result.status.is_failure();
            result.add_result(stage_result);
            if failed && self.fail_fast {
                break;
            }
        }

        result.total_duration = start.elapsed();
        Ok(result)
    }

    /// Execute a single stage.
    pub fn execute_stage(&self, stage: Stage) -> StageResult {
        let start = Instant::now();

        if self.context.is_verbose() {
            println!("Running stage: {} ...", stage);
        }

        if self.dry_run {
            return StageResult::skipped(stage);
        }

        let outcome = run_stage(&self.context, stage);
        let duration = start.elapsed();

        match outcome {
            Ok(output) => {
                if self.context.is_verbose() {
                    println!("  {} done in {:?} ({} files)", stage, duration, output.outputs.len());
                }
                StageResult::success(stage, output.outputs, duration)
                    .with_warnings(output.warnings)
            }
            Err(e) => {
                if self.context.is_verbose() {
                    println!("  {} failed: {}", stage, e);
                }
                StageResult::failed(stage, e.to_string(), duration)
            }
        }
    }
}

/// Dispatch one stage to its implementation.
pub fn run_stage(ctx: &BuildContext, stage: Stage) -> Result<StageOutput, StageError> {
    match stage {
        Stage::Clean => stages::clean::run(ctx),
        Stage::Copy => stages::copy::run(ctx),
        Stage::OptimizeImages => stages::images::optimize(ctx),
        Stage::Webp => stages::images::webp(ctx),
        Stage::SvgIcons => stages::svg::icons(ctx),
        Stage::SvgImages => stages::svg::illustrations(ctx),
        Stage::Sprite => stages::svg::sprite(ctx),
        Stage::Html => stages::html::run(ctx),
        Stage::Styles => stages::styles::run(ctx),
        Stage::Scripts => stages::scripts::run(ctx),
    }
}
