//! Result and status models shared by steps and the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

use crate::processor::ProcessOutput;

/// Status of a single step execution.
///
/// `Pending` is only the default of a [`ProcessOutput`] that has not been
/// filled in; an executed step always lands on `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepStatus {
    /// Step has not produced an outcome
    Pending,
    /// Step completed successfully
    Completed,
    /// Step failed
    Failed,
}

impl StepStatus {
    /// Whether this status counts as a successful outcome.
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Completed)
    }
}

impl Default for StepStatus {
    fn default() -> Self {
        StepStatus::Pending
    }
}

/// Overall pipeline execution status.
///
/// A result is born `Running` and finalized to `Completed` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStatus {
    /// Pipeline is currently running
    Running,
    /// Pipeline completed (no fatal required-step failure)
    Completed,
    /// Pipeline failed
    Failed,
}

/// Outcome of one step execution.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// Name of the step that produced this result
    pub step_name: String,

    /// Terminal status of the step
    pub status: StepStatus,

    /// Processor-defined payload, if the processor was invoked and returned
    pub output: Option<ProcessOutput>,

    /// Wall-clock time spent executing the step, success or failure
    pub execution_time: Duration,

    /// Error text for a failed step, when one was captured
    pub error_message: Option<String>,

    /// Warnings reported by the processor
    pub warnings: Vec<String>,
}

impl StepResult {
    /// Synthesize a failed result without processor output.
    pub fn failed(step_name: impl Into<String>, error: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            step_name: step_name.into(),
            status: StepStatus::Failed,
            output: None,
            execution_time: elapsed,
            error_message: Some(error.into()),
            warnings: Vec::new(),
        }
    }
}

/// Outcome of one whole pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Name of the pipeline that ran
    pub pipeline_name: String,

    /// Unique execution id for this run
    pub execution_id: Uuid,

    /// Overall status
    pub status: PipelineStatus,

    /// The input artifact every step received
    pub original_file: PathBuf,

    /// One entry per step that actually executed, append-only.
    /// Silently skipped steps produce no entry.
    pub step_results: Vec<StepResult>,

    /// Wall-clock time for the whole run
    pub total_execution_time: Duration,

    /// Deduplicated union of every successful step's output and thumbnail paths
    pub processed_files: Vec<PathBuf>,

    /// Fatal errors (graph validation, fail-fast required failures)
    pub errors: Vec<String>,

    /// Non-fatal problems (optional failures, metadata extraction issues)
    pub warnings: Vec<String>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub completed_at: Option<DateTime<Utc>>,
}

impl PipelineResult {
    /// Create a fresh result for a run that is starting now.
    pub fn new(pipeline_name: impl Into<String>, original_file: impl Into<PathBuf>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            execution_id: Uuid::new_v4(),
            status: PipelineStatus::Running,
            original_file: original_file.into(),
            step_results: Vec::new(),
            total_execution_time: Duration::ZERO,
            processed_files: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Whether the run as a whole succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self.status, PipelineStatus::Completed)
    }

    /// Look up the result of a step by name, if it executed.
    pub fn step_result(&self, name: &str) -> Option<&StepResult> {
        self.step_results.iter().find(|r| r.step_name == name)
    }
}
