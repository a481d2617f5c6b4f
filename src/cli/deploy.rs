//! Deploy command implementation

use std::process::ExitCode;

use super::{build::load_project, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};
use crate::build::BuildContext;
use crate::config::CliOverrides;

/// Run the deploy command
pub fn run_deploy(
    remote: Option<&str>,
    branch: Option<&str>,
    message: Option<&str>,
) -> ExitCode {
    if remote.is_some_and(|r| r.trim().is_empty()) {
        eprintln!("Error: --remote must not be empty");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }
    if branch.is_some_and(|b| b.trim().is_empty() || b.contains(' ')) {
        eprintln!("Error: --branch must be a valid git branch name");
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let overrides = CliOverrides {
        remote: remote.map(str::to_string),
        branch: branch.map(str::to_string),
        ..Default::default()
    };
    let (config, project_root) = match load_project(overrides, false) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let context = BuildContext::new(config, project_root);
    match crate::deploy::deploy(&context, message) {
        Ok(target) => {
            println!("Deployed to {}", target);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}
