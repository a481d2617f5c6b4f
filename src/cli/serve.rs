//! Serve command implementation

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use super::{build::load_project, EXIT_ERROR};
use crate::build::{BuildContext, BuildPipeline};
use crate::config::CliOverrides;
use crate::server::{serve, ReloadHub};
use crate::watch::watch_and_rebuild;

/// Run the serve command: full build, then serve with live reload while
/// watching the source tree for changes.
pub fn run_serve(
    port: Option<u16>,
    src: Option<&Path>,
    out: Option<&Path>,
    verbose: bool,
) -> ExitCode {
    let overrides = CliOverrides {
        port,
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
        return ExitCode::from(EXIT_ERROR);
    }

    // Initial build so there is something to serve
    let pipeline = BuildPipeline::new(context);
    let result = match pipeline.build() {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    for warning in result.warnings() {
        eprintln!("Warning: {}", warning);
    }
    if !result.is_success() {
        eprintln!("Error: initial build failed");
        eprintln!("{}", result.summary());
        return ExitCode::from(EXIT_ERROR);
    }
    println!("{}", result.summary());

    let hub = Arc::new(ReloadHub::new());
    let server_config = pipeline.context().config().server.clone();
    let out_dir = pipeline.context().out_dir();

    let server_hub = Arc::clone(&hub);
    std::thread::spawn(move || {
        if let Err(e) = serve(out_dir, &server_config, server_hub) {
            eprintln!("Error: {}", e);
            std::process::exit(i32::from(EXIT_ERROR));
        }
    });

    // Watch loop runs on this thread until interrupted
    if let Err(e) = watch_and_rebuild(&pipeline, hub) {
        eprintln!("Error: {}", e);
    }
    ExitCode::from(EXIT_ERROR)
}
