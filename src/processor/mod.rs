//! The [`Processor`] capability trait defines a single content transform.
//!
//! Concrete transforms (image resize, text extraction, thumbnailing, ...)
//! implement this trait; the pipeline core only ever calls through it and
//! never inspects concrete types.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::core::{Metadata, StepStatus};

/// Result of a processor's `process` call.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    /// Terminal status reported by the processor
    pub status: StepStatus,

    /// Error messages accumulated by the processor
    pub errors: Vec<String>,

    /// Paths of files the processor produced
    pub processed_files: Vec<PathBuf>,

    /// Paths of thumbnails the processor produced
    pub thumbnails: Vec<PathBuf>,

    /// Non-fatal problems the processor wants surfaced
    pub warnings: Vec<String>,
}

impl ProcessOutput {
    /// A successful output with no files.
    pub fn completed() -> Self {
        Self {
            status: StepStatus::Completed,
            ..Self::default()
        }
    }

    /// A failed output carrying the given error messages.
    pub fn failed(errors: Vec<String>) -> Self {
        Self {
            status: StepStatus::Failed,
            errors,
            ..Self::default()
        }
    }

    /// Whether the processor reported success (derived from the status).
    pub fn success(&self) -> bool {
        self.status.is_success()
    }
}

/// A single content transform consumed by the pipeline.
///
/// Implementations must be safe to call repeatedly; idempotent outputs are
/// the processor's responsibility, not the pipeline's.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Check that this processor can handle the given input.
    ///
    /// An I/O error here is treated by the step as a rejection.
    async fn validate(&self, input: &Path) -> anyhow::Result<bool>;

    /// Run the transform against the input with processor-specific options.
    async fn process(&self, input: &Path, options: &serde_json::Value)
        -> anyhow::Result<ProcessOutput>;

    /// Extract metadata describing the input artifact.
    ///
    /// Called at most once per pipeline run; the result is shared read-only
    /// with all conditional steps.
    async fn extract_metadata(&self, _input: &Path) -> anyhow::Result<Metadata> {
        Ok(Metadata::new())
    }
}
