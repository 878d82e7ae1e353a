//! Build and configuration errors
//!
//! These are the only errors that surface from the pipeline API. Step-level
//! failures never escape as errors; they are captured into typed results.

use thiserror::Error;

/// Errors raised while building or validating a pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// A step with this name is already registered.
    #[error("duplicate step name: '{0}'")]
    DuplicateStep(String),

    /// A step references a dependency that does not exist.
    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    /// The dependency graph contains a cycle.
    #[error("circular dependency detected involving step '{0}'")]
    CircularDependency(String),

    /// The pipeline configuration is invalid.
    #[error("invalid pipeline configuration: {0}")]
    InvalidConfig(String),
}
