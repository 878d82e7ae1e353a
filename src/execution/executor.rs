//! Pipeline run driver
//!
//! Drives one `Execute` invocation: graph validation, metadata loading,
//! sequential or leveled-parallel step execution, fail-fast policy, and
//! aggregation of per-step results into a [`PipelineResult`].

use crate::core::{
    Metadata, Pipeline, PipelineResult, PipelineStatus, Step, StepMode, StepResult, StepStatus,
};
use crate::execution::scheduler::{execution_levels, execution_order};
use crate::execution::validator::validate_graph;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Executes one pipeline run against a single input artifact.
pub struct PipelineExecutor<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    /// Run the pipeline, producing exactly one result.
    ///
    /// Nothing below this boundary raises: every failure mode is captured
    /// into the returned result. Fail-fast stops scheduling further work in
    /// both modes but always finalizes timing and aggregation.
    pub async fn run(&self, input: &Path) -> PipelineResult {
        let config = self.pipeline.config();
        let started = Instant::now();
        let mut result = PipelineResult::new(&config.name, input);

        info!(
            pipeline = %config.name,
            execution_id = %result.execution_id,
            input = %input.display(),
            "starting pipeline run"
        );

        if self.pipeline.steps().is_empty() {
            result.status = PipelineStatus::Completed;
            return self.finalize(result, started);
        }

        if let Err(e) = validate_graph(self.pipeline.steps()) {
            error!(pipeline = %config.name, "graph validation failed: {e}");
            result.status = PipelineStatus::Failed;
            result.errors.push(e.to_string());
            return self.finalize(result, started);
        }

        let metadata = self.load_metadata(input, &mut result).await;

        let execution = if config.parallel {
            self.run_parallel(input, &metadata, &mut result).await
        } else {
            self.run_sequential(input, &metadata, &mut result).await
        };

        if let Err(e) = execution {
            // Scheduling can only fail on a cycle the validator already
            // rules out; kept as the defensive second check.
            result.status = PipelineStatus::Failed;
            result.errors.push(e.to_string());
            return self.finalize(result, started);
        }

        let required_failure = result.step_results.iter().any(|sr| {
            sr.status == StepStatus::Failed
                && self
                    .pipeline
                    .get_step(&sr.step_name)
                    .is_some_and(|s| s.mode == StepMode::Required)
        });

        result.status = if config.fail_fast && required_failure {
            PipelineStatus::Failed
        } else {
            PipelineStatus::Completed
        };

        self.finalize(result, started)
    }

    /// Walk the topological order one step at a time.
    async fn run_sequential(
        &self,
        input: &Path,
        metadata: &Metadata,
        result: &mut PipelineResult,
    ) -> Result<(), crate::error::PipelineError> {
        let order = execution_order(self.pipeline.steps())?;
        let mut completed: HashSet<String> = HashSet::new();

        for name in &order {
            let Some(step) = self.pipeline.get_step(name) else {
                continue;
            };

            if !step.can_execute(metadata, &completed) {
                // Intentional silent skip: no StepResult is recorded.
                debug!(step = %name, "skipping step, preconditions not met");
                continue;
            }

            let step_result = step.execute(input).await;
            let failed = step_result.status == StepStatus::Failed;
            let reason = failure_reason(&step_result);
            result.step_results.push(step_result);

            if !failed {
                completed.insert(name.clone());
                continue;
            }

            match step.mode {
                StepMode::Required if self.pipeline.config().fail_fast => {
                    result
                        .errors
                        .push(format!("required step '{name}' failed: {reason}"));
                    warn!(step = %name, "required step failed, stopping run");
                    break;
                }
                StepMode::Required => {
                    result
                        .warnings
                        .push(format!("required step '{name}' failed: {reason}"));
                }
                StepMode::Optional | StepMode::Conditional => {
                    result.warnings.push(format!("step '{name}' failed: {reason}"));
                }
            }
        }

        Ok(())
    }

    /// Execute dependency levels in order, steps within a level concurrently
    /// under a semaphore sized to `max_workers`.
    async fn run_parallel(
        &self,
        input: &Path,
        metadata: &Metadata,
        result: &mut PipelineResult,
    ) -> Result<(), crate::error::PipelineError> {
        let config = self.pipeline.config();
        let levels = execution_levels(self.pipeline.steps())?;
        let limiter = Arc::new(Semaphore::new(config.max_workers));
        let mut completed: HashSet<String> = HashSet::new();
        let mut stop = false;

        for level in levels {
            if stop {
                break;
            }

            let runnable: Vec<&Step> = level
                .iter()
                .filter_map(|name| self.pipeline.get_step(name))
                .filter(|step| {
                    let eligible = step.can_execute(metadata, &completed);
                    if !eligible {
                        debug!(step = %step.name, "skipping step, preconditions not met");
                    }
                    eligible
                })
                .collect();

            let mut handles: Vec<(String, JoinHandle<StepResult>)> = Vec::new();
            for step in runnable {
                let step = step.clone();
                let input = input.to_path_buf();
                let limiter = Arc::clone(&limiter);
                let name = step.name.clone();

                handles.push((
                    name,
                    tokio::spawn(async move {
                        // The semaphore is never closed, so acquisition only
                        // ends with a permit.
                        let _permit = limiter.acquire_owned().await.ok();
                        step.execute(&input).await
                    }),
                ));
            }

            // Barrier: the whole level finishes before bookkeeping. The
            // completed set is only mutated here, single-threaded.
            for (name, handle) in handles {
                let step_result = match handle.await {
                    Ok(step_result) => step_result,
                    Err(e) => {
                        error!(step = %name, "step task aborted: {e}");
                        StepResult::failed(
                            &name,
                            format!("step task aborted: {e}"),
                            std::time::Duration::ZERO,
                        )
                    }
                };

                let failed = step_result.status == StepStatus::Failed;
                let reason = failure_reason(&step_result);
                result.step_results.push(step_result);

                if !failed {
                    completed.insert(name.clone());
                    continue;
                }

                let mode = self
                    .pipeline
                    .get_step(&name)
                    .map(|s| s.mode)
                    .unwrap_or(StepMode::Required);

                match mode {
                    StepMode::Required if config.fail_fast => {
                        result
                            .errors
                            .push(format!("required step '{name}' failed: {reason}"));
                        warn!(step = %name, "required step failed, unexecuted levels will not start");
                        stop = true;
                    }
                    StepMode::Required => {
                        result
                            .warnings
                            .push(format!("required step '{name}' failed: {reason}"));
                    }
                    StepMode::Optional | StepMode::Conditional => {
                        result.warnings.push(format!("step '{name}' failed: {reason}"));
                    }
                }
            }
        }

        Ok(())
    }

    /// Load the shared metadata snapshot once per run.
    ///
    /// Prefers a dedicated metadata source when configured, falling back to
    /// the first step's processor in execution order. Extraction problems
    /// degrade to empty metadata with a warning; conditions then evaluate
    /// fail-closed against it.
    async fn load_metadata(&self, input: &Path, result: &mut PipelineResult) -> Metadata {
        let source = self
            .pipeline
            .metadata_source()
            .or_else(|| self.pipeline.first_processor());

        let Some(processor) = source else {
            return Metadata::new();
        };

        match processor.extract_metadata(input).await {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("metadata extraction failed: {e}");
                result
                    .warnings
                    .push(format!("metadata extraction failed: {e}"));
                Metadata::new()
            }
        }
    }

    /// Collect processed files and close out timing, regardless of outcome.
    fn finalize(&self, mut result: PipelineResult, started: Instant) -> PipelineResult {
        let mut seen: HashSet<PathBuf> = HashSet::new();
        for step_result in &result.step_results {
            if !step_result.status.is_success() {
                continue;
            }
            if let Some(output) = &step_result.output {
                for path in output.processed_files.iter().chain(output.thumbnails.iter()) {
                    if seen.insert(path.clone()) {
                        result.processed_files.push(path.clone());
                    }
                }
            }
        }

        result.total_execution_time = started.elapsed();
        result.completed_at = Some(chrono::Utc::now());

        info!(
            pipeline = %result.pipeline_name,
            execution_id = %result.execution_id,
            status = ?result.status,
            steps = result.step_results.len(),
            "pipeline run finished in {:?}",
            result.total_execution_time
        );

        result
    }
}

fn failure_reason(step_result: &StepResult) -> String {
    if let Some(message) = &step_result.error_message {
        return message.clone();
    }
    if let Some(output) = &step_result.output {
        if !output.errors.is_empty() {
            return output.errors.join("; ");
        }
    }
    "unspecified failure".to_string()
}
