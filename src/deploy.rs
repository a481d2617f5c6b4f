//! Deployment of the built output tree to a git hosting branch.
//!
//! The output directory is staged into a throwaway repository and force
//! pushed as a single commit, so the hosting branch always holds exactly
//! one snapshot of the latest build.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use thiserror::Error;

use crate::build::BuildContext;

/// Error during deployment
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeployError {
    /// The `git` binary was not found on PATH
    #[error("git not found on PATH; install git to deploy")]
    GitMissing,
    /// The output directory does not exist or is empty
    #[error("Nothing to deploy: {} is missing or empty (run a build first)", .0.display())]
    OutputMissing(PathBuf),
    /// The configured remote name has no URL in the enclosing repository
    #[error("Remote '{0}' has no configured URL")]
    RemoteUnknown(String),
    /// Filesystem error while staging the output tree
    #[error("Failed to stage output for deploy: {}: {source}", path.display())]
    Stage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A git command failed
    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },
    /// Failed to spawn git
    #[error("Failed to run git: {0}")]
    Spawn(std::io::Error),
}

/// Deploy the built output tree.
///
/// Stages `out_dir` into a fresh temporary repository, commits it, and
/// force pushes to `branch` on the resolved remote. Requires a prior
/// successful build; never pushes a partial tree.
pub fn deploy(ctx: &BuildContext, message: Option<&str>) -> Result<String, DeployError> {
    ensure_git_available()?;

    let out_dir = ctx.out_dir();
    if !has_content(&out_dir) {
        return Err(DeployError::OutputMissing(out_dir));
    }

    let deploy_config = &ctx.config().deploy;
    let url = resolve_remote_url(ctx.project_root(), &deploy_config.remote)?;
    let branch = &deploy_config.branch;

    let commit_message = match message {
        Some(m) => m.to_string(),
        None => format!("Deploy {}", commit_stamp()),
    };

    let staging = TempDir::new().map_err(|e| DeployError::Stage {
        path: std::env::temp_dir(),
        source: e,
    })?;
    copy_tree(&out_dir, staging.path())?;

    git(staging.path(), &["init", "-q"])?;
    git(staging.path(), &["add", "-A"])?;
    git(
        staging.path(),
        &[
            "-c",
            "user.name=sitekit",
            "-c",
            "user.email=sitekit@localhost",
            "commit",
            "-q",
            "-m",
            &commit_message,
        ],
    )?;
    git(
        staging.path(),
        &["push", "--force", "-q", &url, &format!("HEAD:refs/heads/{branch}")],
    )?;

    Ok(format!("{url} ({branch})"))
}

/// Resolve a remote setting to a pushable URL.
///
/// A value that already looks like a URL is used as-is; otherwise it is
/// treated as a remote name in the repository enclosing `project_root`.
pub fn resolve_remote_url(project_root: &Path, remote: &str) -> Result<String, DeployError> {
    if is_url(remote) {
        return Ok(remote.to_string());
    }

    let output = Command::new("git")
        .current_dir(project_root)
        .args(["config", "--get", &format!("remote.{remote}.url")])
        .output()
        .map_err(DeployError::Spawn)?;

    if !output.status.success() {
        return Err(DeployError::RemoteUnknown(remote.to_string()));
    }

    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if url.is_empty() {
        return Err(DeployError::RemoteUnknown(remote.to_string()));
    }
    Ok(url)
}

/// Whether a remote setting is a URL rather than a remote name.
fn is_url(remote: &str) -> bool {
    remote.contains("://") || (remote.contains('@') && remote.contains(':'))
}

fn ensure_git_available() -> Result<(), DeployError> {
    match Command::new("git").arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        _ => Err(DeployError::GitMissing),
    }
}

fn has_content(dir: &Path) -> bool {
    fs::read_dir(dir).map(|mut entries| entries.next().is_some()).unwrap_or(false)
}

/// Copy a directory tree, preserving relative layout.
fn copy_tree(from: &Path, to: &Path) -> Result<(), DeployError> {
    let entries = fs::read_dir(from).map_err(|e| DeployError::Stage {
        path: from.to_path_buf(),
        source: e,
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| DeployError::Stage {
            path: from.to_path_buf(),
            source: e,
        })?;
        let source = entry.path();
        let dest = to.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| DeployError::Stage {
            path: source.clone(),
            source: e,
        })?;
        if file_type.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| DeployError::Stage {
                path: dest.clone(),
                source: e,
            })?;
            copy_tree(&source, &dest)?;
        } else if file_type.is_file() {
            fs::copy(&source, &dest).map_err(|e| DeployError::Stage {
                path: source.clone(),
                source: e,
            })?;
        }
        // Symlinks are skipped; the output tree never contains them
    }
    Ok(())
}

fn git(dir: &Path, args: &[&str]) -> Result<(), DeployError> {
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .map_err(DeployError::Spawn)?;
    if !output.status.success() {
        return Err(DeployError::Git {
            command: args.join(" "),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Coarse timestamp used in default commit messages.
fn commit_stamp() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("@{secs}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config;
    use tempfile::TempDir;

    #[test]
    fn test_is_url_detection() {
        assert!(is_url("https://github.com/user/site.git"));
        assert!(is_url("ssh://git@host/repo.git"));
        assert!(is_url("git@github.com:user/site.git"));
        assert!(!is_url("origin"));
        assert!(!is_url("upstream"));
    }

    #[test]
    fn test_resolve_url_passthrough() {
        let temp = TempDir::new().unwrap();
        let url = resolve_remote_url(temp.path(), "https://example.com/repo.git").unwrap();
        assert_eq!(url, "https://example.com/repo.git");
    }

    #[test]
    fn test_resolve_unknown_remote_name() {
        let temp = TempDir::new().unwrap();
        // Not a git repository, so no remote can resolve
        let result = resolve_remote_url(temp.path(), "origin");
        assert!(matches!(result, Err(DeployError::RemoteUnknown(_))));
    }

    #[test]
    fn test_copy_tree_preserves_layout() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("from");
        let to = temp.path().join("to");
        fs::create_dir_all(from.join("css")).unwrap();
        fs::create_dir_all(&to).unwrap();
        fs::write(from.join("index.html"), "<p>hi</p>").unwrap();
        fs::write(from.join("css/styles.css"), "body{}").unwrap();

        copy_tree(&from, &to).unwrap();
        assert_eq!(fs::read_to_string(to.join("index.html")).unwrap(), "<p>hi</p>");
        assert_eq!(fs::read_to_string(to.join("css/styles.css")).unwrap(), "body{}");
    }

    #[test]
    fn test_deploy_requires_built_output() {
        let temp = TempDir::new().unwrap();
        let ctx = crate::build::BuildContext::new(default_config(), temp.path().to_path_buf());
        let result = deploy(&ctx, None);
        assert!(matches!(result, Err(DeployError::OutputMissing(_))));
    }
}
