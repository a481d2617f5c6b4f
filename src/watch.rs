//! Watch mode for automatic rebuilds on file changes.
//!
//! Observes the source tree with debouncing and re-runs only the stage a
//! change maps to: stylesheets recompile and push an in-place CSS refresh,
//! markup re-minifies and triggers a full reload, scripts re-minify.

use notify::RecursiveMode;
use notify_debouncer_mini::{new_debouncer, DebouncedEventKind};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::build::{BuildPipeline, Stage};
use crate::server::{ReloadEvent, ReloadHub};

/// Error during watch mode
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WatchError {
    /// Failed to initialize the file watcher
    #[error("Failed to initialize file watcher: {0}")]
    WatcherInit(notify::Error),
    /// Failed to add a watch path
    #[error("Failed to watch path: {0}")]
    WatchPath(notify::Error),
    /// Channel receive error
    #[error("Watch channel error: {0}")]
    Channel(String),
    /// Source directory not found
    #[error("Source directory not found: {}", .0.display())]
    SourceNotFound(PathBuf),
}

/// What a changed path means for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    /// A stylesheet changed
    Styles,
    /// A top-level markup file changed
    Markup,
    /// A top-level script changed
    Scripts,
}

impl ChangeKind {
    /// The stage to re-run for this change.
    pub fn stage(&self) -> Stage {
        match self {
            ChangeKind::Styles => Stage::Styles,
            ChangeKind::Markup => Stage::Html,
            ChangeKind::Scripts => Stage::Scripts,
        }
    }

    /// The event pushed to browsers after a successful re-run.
    ///
    /// Script changes push nothing: the browser is not told to reload,
    /// mirroring the historical behavior of this pipeline.
    pub fn reload_event(&self) -> Option<ReloadEvent> {
        match self {
            ChangeKind::Styles => Some(ReloadEvent::RefreshCss),
            ChangeKind::Markup => Some(ReloadEvent::Reload),
            ChangeKind::Scripts => None,
        }
    }
}

/// Classify a changed path, relative to the source tree.
///
/// Returns `None` for paths no stage cares about (build output, editor
/// droppings, nested files outside the watched shapes).
pub fn classify(path: &Path, src_dir: &Path) -> Option<ChangeKind> {
    let rel = path.strip_prefix(src_dir).ok()?;
    let ext = rel.extension().and_then(|e| e.to_str())?.to_ascii_lowercase();

    match ext.as_str() {
        // Any stylesheet, at any depth; partials feed the single entry
        "scss" | "sass" => Some(ChangeKind::Styles),
        // Markup is only minified from the source root
        "html" if rel.parent() == Some(Path::new("")) => Some(ChangeKind::Markup),
        // Scripts are only minified from the top of js/
        "js" if rel.parent() == Some(Path::new("js")) => Some(ChangeKind::Scripts),
        _ => None,
    }
}

/// Get current timestamp for logging
fn timestamp() -> String {
    use std::time::SystemTime;
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = now.as_secs() % 86400; // seconds since midnight
    format!("{:02}:{:02}:{:02}", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}

/// Clear the terminal screen
fn clear_screen() {
    // ANSI escape code to clear screen and move cursor to top-left
    print!("\x1B[2J\x1B[1;1H");
}

/// Watch the source tree and re-run stages on change.
///
/// Blocks until the process is interrupted. Watch errors are logged and
/// watching continues; only setup failures return an error.
pub fn watch_and_rebuild(pipeline: &BuildPipeline, hub: Arc<ReloadHub>) -> Result<(), WatchError> {
    let ctx = pipeline.context();
    let src_dir = ctx.src_dir();
    if !src_dir.exists() {
        return Err(WatchError::SourceNotFound(src_dir));
    }

    let watch_config = ctx.config().watch.clone();
    let (tx, rx) = channel();
    let debounce = Duration::from_millis(watch_config.debounce_ms);
    let mut debouncer = new_debouncer(debounce, tx).map_err(WatchError::WatcherInit)?;
    debouncer
        .watcher()
        .watch(&src_dir, RecursiveMode::Recursive)
        .map_err(WatchError::WatchPath)?;

    println!("[{}] Watching {} for changes...", timestamp(), src_dir.display());

    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                // Coalesce one debounce window into a unique set of kinds
                let kinds: BTreeSet<ChangeKind> = events
                    .iter()
                    .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
                    .filter_map(|e| classify(&e.path, &src_dir))
                    .collect();

                if kinds.is_empty() {
                    continue;
                }

                if watch_config.clear_screen {
                    clear_screen();
                }

                for event in &events {
                    if classify(&event.path, &src_dir).is_some() {
                        if let Some(name) = event.path.file_name() {
                            println!("[{}] Changed: {}", timestamp(), name.to_string_lossy());
                        }
                    }
                }

                for kind in kinds {
                    rerun(pipeline, kind, &hub);
                }
            }
            Ok(Err(error)) => {
                // Watch error (non-fatal) - log but continue watching
                eprintln!("[{}] Watch error: {:?}", timestamp(), error);
                eprintln!("[{}] Continuing to watch...", timestamp());
            }
            Err(e) => return Err(WatchError::Channel(e.to_string())),
        }
    }
}

/// Re-run one stage and push its reload event on success.
fn rerun(pipeline: &BuildPipeline, kind: ChangeKind, hub: &ReloadHub) {
    let stage = kind.stage();
    let result = pipeline.execute_stage(stage);

    for warning in &result.warnings {
        eprintln!("[{}] Warning: {}", timestamp(), warning);
    }

    if result.status.is_failure() {
        eprintln!("[{}] Stage {} failed: {}", timestamp(), stage, result.status);
        return;
    }

    println!(
        "[{}] {} rebuilt ({} files, {:?})",
        timestamp(),
        stage,
        result.outputs.len(),
        result.duration
    );

    // A style compile error produced no output; pushing a CSS refresh for it
    // would just re-fetch the stale sheet
    if result.outputs.is_empty() && kind == ChangeKind::Styles {
        return;
    }

    if let Some(event) = kind.reload_event() {
        hub.broadcast(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::BuildContext;
    use crate::config::default_config;
    use std::fs;
    use tempfile::TempDir;

    fn src() -> PathBuf {
        PathBuf::from("/project/source")
    }

    #[test]
    fn test_classify_styles_any_depth() {
        assert_eq!(
            classify(&src().join("sass/style.scss"), &src()),
            Some(ChangeKind::Styles)
        );
        assert_eq!(
            classify(&src().join("sass/blocks/_card.scss"), &src()),
            Some(ChangeKind::Styles)
        );
        assert_eq!(classify(&src().join("sass/legacy.sass"), &src()), Some(ChangeKind::Styles));
    }

    #[test]
    fn test_classify_markup_top_level_only() {
        assert_eq!(classify(&src().join("index.html"), &src()), Some(ChangeKind::Markup));
        assert_eq!(classify(&src().join("partials/nav.html"), &src()), None);
    }

    #[test]
    fn test_classify_scripts_top_of_js_only() {
        assert_eq!(classify(&src().join("js/app.js"), &src()), Some(ChangeKind::Scripts));
        assert_eq!(classify(&src().join("js/vendor/lib.js"), &src()), None);
        assert_eq!(classify(&src().join("app.js"), &src()), None);
    }

    #[test]
    fn test_classify_ignores_unrelated_paths() {
        assert_eq!(classify(&src().join("img/logo.png"), &src()), None);
        assert_eq!(classify(&src().join("notes.md"), &src()), None);
        assert_eq!(classify(Path::new("/elsewhere/style.scss"), &src()), None);
    }

    #[test]
    fn test_change_kind_stage_mapping() {
        assert_eq!(ChangeKind::Styles.stage(), Stage::Styles);
        assert_eq!(ChangeKind::Markup.stage(), Stage::Html);
        assert_eq!(ChangeKind::Scripts.stage(), Stage::Scripts);
    }

    #[test]
    fn test_change_kind_reload_events() {
        assert_eq!(ChangeKind::Styles.reload_event(), Some(ReloadEvent::RefreshCss));
        assert_eq!(ChangeKind::Markup.reload_event(), Some(ReloadEvent::Reload));
        assert_eq!(ChangeKind::Scripts.reload_event(), None);
    }

    #[test]
    fn test_watch_missing_source_dir() {
        let config = default_config();
        let ctx = BuildContext::new(config, PathBuf::from("/nonexistent/project"));
        let pipeline = BuildPipeline::new(ctx);
        let result = watch_and_rebuild(&pipeline, Arc::new(ReloadHub::new()));
        assert!(matches!(result, Err(WatchError::SourceNotFound(_))));
    }

    #[test]
    fn test_rerun_markup_pushes_reload() {
        let temp = TempDir::new().unwrap();
        let src_dir = temp.path().join("source");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("index.html"), "<p>  hi  </p>").unwrap();

        let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());
        let pipeline = BuildPipeline::new(ctx);
        let hub = ReloadHub::new();
        let rx = hub.subscribe();

        rerun(&pipeline, ChangeKind::Markup, &hub);
        assert_eq!(rx.try_recv().unwrap(), ReloadEvent::Reload);
        assert!(temp.path().join("build/index.html").exists());
    }

    #[test]
    fn test_rerun_scripts_pushes_nothing() {
        let temp = TempDir::new().unwrap();
        let src_dir = temp.path().join("source/js");
        fs::create_dir_all(&src_dir).unwrap();
        fs::write(src_dir.join("app.js"), "let x = 1;").unwrap();

        let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());
        let pipeline = BuildPipeline::new(ctx);
        let hub = ReloadHub::new();
        let rx = hub.subscribe();

        rerun(&pipeline, ChangeKind::Scripts, &hub);
        assert!(rx.try_recv().is_err());
        assert!(temp.path().join("build/js/app.min.js").exists());
    }

    #[test]
    fn test_rerun_broken_styles_pushes_nothing() {
        let temp = TempDir::new().unwrap();
        let sass = temp.path().join("source/sass");
        fs::create_dir_all(&sass).unwrap();
        fs::write(sass.join("style.scss"), "body { color: }}}").unwrap();

        let ctx = BuildContext::new(default_config(), temp.path().to_path_buf());
        let pipeline = BuildPipeline::new(ctx);
        let hub = ReloadHub::new();
        let rx = hub.subscribe();

        rerun(&pipeline, ChangeKind::Styles, &hub);
        assert!(rx.try_recv().is_err());
    }
}
