//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod build;
mod deploy;
mod serve;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Sitekit - build, serve and deploy a static website
#[derive(Parser)]
#[command(name = "sitekit")]
#[command(about = "Sitekit - static website asset pipeline with dev server and git deploy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full build pipeline: clean, copy, optimize, compile, minify
    Build {
        /// Source directory (overrides site.toml)
        #[arg(long)]
        src: Option<PathBuf>,

        /// Output directory (overrides site.toml)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Show what would be built without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Continue past a failing stage instead of stopping
        #[arg(long)]
        keep_going: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Build, then serve the output with live reload, rebuilding on change
    Serve {
        /// Port to bind on 127.0.0.1
        #[arg(short, long)]
        port: Option<u16>,

        /// Source directory (overrides site.toml)
        #[arg(long)]
        src: Option<PathBuf>,

        /// Output directory (overrides site.toml)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Remove the output directory
    Clean {
        /// Output directory (overrides site.toml)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Push the built output tree to a git hosting branch
    Deploy {
        /// Remote name or URL (overrides site.toml)
        #[arg(long)]
        remote: Option<String>,

        /// Branch to force push to (overrides site.toml)
        #[arg(long)]
        branch: Option<String>,

        /// Commit message for the deploy snapshot
        #[arg(short, long)]
        message: Option<String>,
    },
}

/// Parse arguments and run
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { src, out, dry_run, keep_going, verbose } => {
            build::run_build(src.as_deref(), out.as_deref(), dry_run, keep_going, verbose)
        }
        Commands::Serve { port, src, out, verbose } => {
            serve::run_serve(port, src.as_deref(), out.as_deref(), verbose)
        }
        Commands::Clean { out } => build::run_clean(out.as_deref()),
        Commands::Deploy { remote, branch, message } => {
            deploy::run_deploy(remote.as_deref(), branch.as_deref(), message.as_deref())
        }
    }
}
