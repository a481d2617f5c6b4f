//! Sitekit - Command-line tool for building, serving and deploying static websites

use std::process::ExitCode;

use sitekit::cli;

fn main() -> ExitCode {
    cli::run()
}
