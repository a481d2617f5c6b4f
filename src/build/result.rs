//! Build result types.
//!
//! Contains types for representing the outcome of pipeline runs.

use crate::build::Stage;
use std::path::PathBuf;
use std::time::Duration;

/// Status of a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    /// Stage completed
    Success,
    /// Stage skipped (dry run)
    Skipped,
    /// Stage failed with error
    Failed(String),
}

impl StageStatus {
    /// Check if the status indicates success.
    pub fn is_success(&self) -> bool {
        matches!(self, StageStatus::Success | StageStatus::Skipped)
    }

    /// Check if the status indicates failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, StageStatus::Failed(_))
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageStatus::Success => write!(f, "success"),
            StageStatus::Skipped => write!(f, "skipped"),
            StageStatus::Failed(err) => write!(f, "failed: {}", err),
        }
    }
}

/// Result of running a single stage.
#[derive(Debug, Clone)]
pub struct StageResult {
    /// The stage that ran
    pub stage: Stage,
    /// Stage status
    pub status: StageStatus,
    /// Output files produced
    pub outputs: Vec<PathBuf>,
    /// Stage duration
    pub duration: Duration,
    /// Warning messages (if any)
    pub warnings: Vec<String>,
}

impl StageResult {
    /// Create a successful result.
    pub fn success(stage: Stage, outputs: Vec<PathBuf>, duration: Duration) -> Self {
        Self { stage, status: StageStatus::Success, outputs, duration, warnings: vec![] }
    }

    /// Create a skipped result.
    pub fn skipped(stage: Stage) -> Self {
        Self {
            stage,
            status: StageStatus::Skipped,
            outputs: vec![],
            duration: Duration::ZERO,
            warnings: vec![],
        }
    }

    /// Create a failed result.
    pub fn failed(stage: Stage, error: String, duration: Duration) -> Self {
        Self { stage, status: StageStatus::Failed(error), outputs: vec![], duration, warnings: vec![] }
    }

    /// Attach warnings to the result.
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

/// Aggregated result of a pipeline run.
#[derive(Debug, Default)]
pub struct BuildResult {
    /// Per-stage results in execution order
    pub stages: Vec<StageResult>,
    /// Total wall-clock duration of the run
    pub total_duration: Duration,
}

impl BuildResult {
    /// Create a new empty build result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stage result.
    pub fn add_result(&mut self, result: StageResult) {
        self.stages.push(result);
    }

    /// Check if every stage succeeded.
    pub fn is_success(&self) -> bool {
        self.stages.iter().all(|s| s.status.is_success())
    }

    /// Total number of output files written.
    pub fn files_written(&self) -> usize {
        self.stages.iter().map(|s| s.outputs.len()).sum()
    }

    /// Collected warnings from every stage.
    pub fn warnings(&self) -> Vec<&str> {
        self.stages.iter().flat_map(|s| s.warnings.iter().map(String::as_str)).collect()
    }

    /// One-line human summary of the run.
    pub fn summary(&self) -> String {
        let failed: Vec<&StageResult> =
            self.stages.iter().filter(|s| s.status.is_failure()).collect();
        if failed.is_empty() {
            format!(
                "Build complete in {:.2}s - {} stages, {} files",
                self.total_duration.as_secs_f64(),
                self.stages.len(),
                self.files_written()
            )
        } else {
            let names: Vec<String> = failed.iter().map(|s| s.stage.to_string()).collect();
            format!(
                "Build failed in {:.2}s - {} stage(s) failed: {}",
                self.total_duration.as_secs_f64(),
                failed.len(),
                names.join(", ")
            )
        }
    }
}
