//! Build and clean command implementations

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::{EXIT_ERROR, EXIT_SUCCESS};
use crate::build::{BuildContext, BuildPipeline, Stage};
use crate::config::{
    default_config, find_config, load_config, merge_cli_overrides, CliOverrides, SiteConfig,
};

/// Locate and load configuration, returning it with the project root.
///
/// The project root is the directory holding `site.toml`, or the current
/// directory when no config file is found.
pub(super) fn load_project(
    overrides: CliOverrides,
    verbose: bool,
) -> Result<(SiteConfig, PathBuf), ExitCode> {
    let (mut config, project_root) = match find_config() {
        Some(config_path) => {
            if verbose {
                println!("Using config: {}", config_path.display());
            }
            let cfg = match load_config(Some(&config_path)) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("Error loading config: {}", e);
                    return Err(ExitCode::from(EXIT_ERROR));
                }
            };
            let root = config_path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
            (cfg, root)
        }
        None => {
            if verbose {
                println!("No site.toml found, using defaults");
            }
            (default_config(), std::env::current_dir().unwrap_or_default())
        }
    };

    merge_cli_overrides(&mut config, &overrides);
    Ok((config, project_root))
}

/// Run the build command
pub fn run_build(
    src: Option<&Path>,
    out: Option<&Path>,
    dry_run: bool,
    keep_going: bool,
    verbose: bool,
) -> ExitCode {
    let overrides = CliOverrides {
        src: src.map(|p| p.to_path_buf()),
        out: out.map(|p| p.to_path_buf()),
        ..Default::default()
    };
    let (config, project_root) = match load_project(overrides, verbose) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let context = BuildContext::new(config, project_root).with_verbose(verbose);
    let src_dir = context.src_dir();
    if !src_dir.exists() {
        eprintln!("Error: Source directory not found: {}", src_dir.display());
        eprintln!("Create the directory or specify a different path with --src");
        return ExitCode::from(EXIT_ERROR);
    }

    let pipeline = BuildPipeline::new(context).with_fail_fast(!keep_going).with_dry_run(dry_run);

    let result = match pipeline.build() {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    for stage_result in &result.stages {
        if verbose {
            println!(
                "  {}: {} ({} files, {:?})",
                stage_result.stage,
                stage_result.status,
                stage_result.outputs.len(),
                stage_result.duration
            );
        }
        for warning in &stage_result.warnings {
            eprintln!("Warning: {}", warning);
        }
    }

    println!("{}", result.summary());

    if result.is_success() {
        ExitCode::from(EXIT_SUCCESS)
    } else {
        ExitCode::from(EXIT_ERROR)
    }
}

/// Run the clean command
pub fn run_clean(out: Option<&Path>) -> ExitCode {
    let overrides = CliOverrides { out: out.map(|p| p.to_path_buf()), ..Default::default() };
    let (config, project_root) = match load_project(overrides, false) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let context = BuildContext::new(config, project_root);
    let out_dir = context.out_dir();
    let existed = out_dir.exists();
    let pipeline = BuildPipeline::new(context);
    let result = pipeline.execute_stage(Stage::Clean);
    if result.status.is_failure() {
        eprintln!("Error: {}", result.status);
        return ExitCode::from(EXIT_ERROR);
    }

    println!("{}", clean_summary(&out_dir, existed));
    ExitCode::from(EXIT_SUCCESS)
}

/// Message printed after the cleaner runs. Says what actually happened: a
/// missing output directory was not removed.
fn clean_summary(out_dir: &Path, existed: bool) -> String {
    if existed {
        format!("Removed {}", out_dir.display())
    } else {
        format!("Nothing to remove at {}", out_dir.display())
    }
}
