//! Pipeline domain model and builder API

use crate::core::{PipelineConfig, PipelineResult, Step, StepCondition, StepMode};
use crate::error::PipelineError;
use crate::execution::{execution_order, validate_graph, PipelineExecutor};
use crate::processor::Processor;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// A pipeline of named processing steps forming a dependency graph.
///
/// Built once by adding steps, then executed any number of times against
/// different inputs. Each `execute` call validates the graph, computes an
/// execution order, and produces exactly one [`PipelineResult`]. Steps must
/// not be mutated concurrently with execution.
pub struct Pipeline {
    config: PipelineConfig,
    steps: HashMap<String, Step>,
    metadata_source: Option<Arc<dyn Processor>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("steps", &self.steps)
            .finish()
    }
}

impl Pipeline {
    /// Create a pipeline from a validated configuration.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            config,
            steps: HashMap::new(),
            metadata_source: None,
        })
    }

    /// Use a dedicated processor for the once-per-run metadata extraction
    /// instead of the first scheduled step's processor.
    pub fn with_metadata_source(mut self, source: Arc<dyn Processor>) -> Self {
        self.metadata_source = Some(source);
        self
    }

    /// Register a step. Fails if a step with the same name already exists.
    pub fn add_step(&mut self, mut step: Step) -> Result<&mut Self, PipelineError> {
        if self.steps.contains_key(&step.name) {
            return Err(PipelineError::DuplicateStep(step.name.clone()));
        }
        // Steps inherit the configured timeout unless explicitly overridden.
        if step.timeout_secs.is_none() {
            step.timeout_secs = Some(self.config.timeout_seconds);
        }
        self.steps.insert(step.name.clone(), step);
        Ok(self)
    }

    /// Convenience wrapper that constructs and registers a [`Step`].
    #[allow(clippy::too_many_arguments)]
    pub fn add_processor(
        &mut self,
        name: impl Into<String>,
        processor: Arc<dyn Processor>,
        options: serde_json::Value,
        mode: StepMode,
        condition: Option<StepCondition>,
        depends_on: Vec<String>,
    ) -> Result<&mut Self, PipelineError> {
        let mut step = Step::new(name, processor)
            .with_options(options)
            .with_mode(mode)
            .with_depends_on(depends_on);
        step.condition = condition;
        self.add_step(step)
    }

    /// Get a registered step by name.
    pub fn get_step(&self, name: &str) -> Option<&Step> {
        self.steps.get(name)
    }

    /// Remove a step by name, returning whether it existed.
    pub fn remove_step(&mut self, name: &str) -> bool {
        self.steps.remove(name).is_some()
    }

    /// Number of registered steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub(crate) fn steps(&self) -> &HashMap<String, Step> {
        &self.steps
    }

    pub(crate) fn metadata_source(&self) -> Option<Arc<dyn Processor>> {
        self.metadata_source.clone()
    }

    /// Processor of the first step in execution order, used as the fallback
    /// metadata source.
    pub(crate) fn first_processor(&self) -> Option<Arc<dyn Processor>> {
        let order = execution_order(&self.steps).ok()?;
        order
            .first()
            .and_then(|name| self.steps.get(name))
            .map(|step| Arc::clone(&step.processor))
    }

    /// Execute every eligible step against the input artifact.
    pub async fn execute(&self, input: impl AsRef<Path>) -> PipelineResult {
        PipelineExecutor::new(self).run(input.as_ref()).await
    }

    /// Pre-flight check: the graph is valid and at least one step's
    /// processor accepts the input.
    pub async fn validate(&self, input: impl AsRef<Path>) -> bool {
        if validate_graph(&self.steps).is_err() {
            return false;
        }
        for step in self.steps.values() {
            if step.processor.validate(input.as_ref()).await.unwrap_or(false) {
                return true;
            }
        }
        false
    }
}
