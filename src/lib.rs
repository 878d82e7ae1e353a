//! stepdag - DAG-based step orchestrator for content processing pipelines

pub mod core;
pub mod error;
pub mod execution;
pub mod processor;

// Re-export commonly used types
pub use crate::core::{Metadata, Pipeline, PipelineConfig, Step, StepCondition, StepMode};
pub use crate::core::{ConditionPattern, PipelineResult, PipelineStatus, StepResult, StepStatus};
pub use crate::error::PipelineError;
pub use crate::execution::PipelineExecutor;
pub use crate::processor::{ProcessOutput, Processor};
