//! Sitekit - Library for building, serving and deploying static websites
//!
//! This library provides functionality to:
//! - Run a declarative asset pipeline (copy, image optimization, SVG
//!   sprites, HTML/CSS/JS compilation and minification)
//! - Serve the built output with live reload while watching for changes
//! - Deploy the output tree to a git hosting branch

pub mod build;
pub mod cli;
pub mod config;
pub mod deploy;
pub mod server;
pub mod stages;
pub mod watch;
