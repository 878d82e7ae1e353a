//! Step domain model

use crate::core::{Metadata, StepCondition, StepResult, StepStatus};
use crate::processor::Processor;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Execution mode of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    /// Failure is fatal to the run under fail-fast
    Required,
    /// Failure only produces a warning
    Optional,
    /// Runs only when its condition holds; failure only produces a warning
    Conditional,
}

/// A single node of the dependency graph.
///
/// Wraps one processor together with its options, execution mode, and
/// dependency/condition metadata. Every step receives the same original
/// input artifact; outputs are not chained between steps.
#[derive(Clone)]
pub struct Step {
    /// Unique step identifier
    pub name: String,

    /// The content transform this step runs
    pub processor: Arc<dyn Processor>,

    /// Opaque processor-specific options, passed through unmodified
    pub options: serde_json::Value,

    /// Execution mode
    pub mode: StepMode,

    /// Eligibility condition, only meaningful for conditional steps
    pub condition: Option<StepCondition>,

    /// Names of steps that must have completed successfully first
    pub depends_on: Vec<String>,

    /// Upper bound on the processor call, in seconds. `None` inherits the
    /// pipeline configuration's `timeout_seconds` when the step is added.
    pub timeout_secs: Option<u64>,
}

/// Fallback bound for steps executed outside a pipeline.
const DEFAULT_TIMEOUT_SECS: u64 = 300;

impl Step {
    /// Create a required step with default options and timeout.
    pub fn new(name: impl Into<String>, processor: Arc<dyn Processor>) -> Self {
        Self {
            name: name.into(),
            processor,
            options: serde_json::Value::Null,
            mode: StepMode::Required,
            condition: None,
            depends_on: Vec::new(),
            timeout_secs: None,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    pub fn with_mode(mut self, mode: StepMode) -> Self {
        self.mode = mode;
        self
    }

    /// Attach a condition and switch the step to conditional mode.
    pub fn with_condition(mut self, condition: StepCondition) -> Self {
        self.mode = StepMode::Conditional;
        self.condition = Some(condition);
        self
    }

    pub fn with_depends_on(mut self, depends_on: Vec<String>) -> Self {
        self.depends_on = depends_on;
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    /// Decide whether this step is eligible to run.
    ///
    /// Every dependency must appear in `completed` (the set of steps that
    /// completed *successfully*; a skipped or failed dependency blocks this
    /// step). Conditional steps additionally evaluate their condition
    /// against the shared run metadata, fail-closed.
    pub fn can_execute(&self, metadata: &Metadata, completed: &HashSet<String>) -> bool {
        if !self.depends_on.iter().all(|dep| completed.contains(dep)) {
            return false;
        }

        match (&self.mode, &self.condition) {
            (StepMode::Conditional, Some(condition)) => condition.evaluate(metadata),
            // A conditional step without a condition is always eligible.
            _ => true,
        }
    }

    /// Run the step against the input, capturing timing and errors.
    ///
    /// This never raises to its caller: validation rejections, processor
    /// errors, and timeouts are all converted into a failed [`StepResult`].
    pub async fn execute(&self, input: &Path) -> StepResult {
        let start = Instant::now();
        let timeout = self.timeout();
        debug!(step = %self.name, "executing step");

        // The bound applies to each processor call independently, so a
        // hanging validate cannot stall the run either.
        match tokio::time::timeout(timeout, self.processor.validate(input)).await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                warn!(step = %self.name, "input rejected by processor validation");
                return StepResult::failed(
                    &self.name,
                    format!("validation failed for step {}", self.name),
                    start.elapsed(),
                );
            }
            Ok(Err(e)) => {
                warn!(step = %self.name, "processor validation errored: {e}");
                return StepResult::failed(
                    &self.name,
                    format!("validation failed for step {}", self.name),
                    start.elapsed(),
                );
            }
            Err(_) => {
                warn!(step = %self.name, "validation timed out after {}s", timeout.as_secs());
                return StepResult::failed(
                    &self.name,
                    format!("step {} timed out after {}s", self.name, timeout.as_secs()),
                    start.elapsed(),
                );
            }
        }

        let outcome = match tokio::time::timeout(timeout, self.processor.process(input, &self.options)).await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(step = %self.name, "step timed out after {}s", timeout.as_secs());
                return StepResult::failed(
                    &self.name,
                    format!("step {} timed out after {}s", self.name, timeout.as_secs()),
                    start.elapsed(),
                );
            }
        };

        match outcome {
            Ok(output) => {
                let status = if output.success() {
                    StepStatus::Completed
                } else {
                    StepStatus::Failed
                };

                let error_message = if status == StepStatus::Failed && self.mode == StepMode::Required {
                    if output.errors.is_empty() {
                        Some(format!("step {} reported failure", self.name))
                    } else {
                        Some(output.errors.join("; "))
                    }
                } else {
                    None
                };

                StepResult {
                    step_name: self.name.clone(),
                    status,
                    warnings: output.warnings.clone(),
                    error_message,
                    execution_time: start.elapsed(),
                    output: Some(output),
                }
            }
            Err(e) => {
                warn!(step = %self.name, "processor error: {e}");
                StepResult::failed(&self.name, e.to_string(), start.elapsed())
            }
        }
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("depends_on", &self.depends_on)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
