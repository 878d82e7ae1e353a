//! Pipeline configuration from YAML

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Process-wide configuration for one pipeline instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name (must be non-empty)
    pub name: String,

    /// Abort remaining work when a required step fails
    #[serde(default = "default_fail_fast")]
    pub fail_fast: bool,

    /// Execute independent steps concurrently, level by level
    #[serde(default)]
    pub parallel: bool,

    /// Maximum number of concurrently running steps (parallel mode)
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-step timeout in seconds (individual steps may override)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Retry steps that failed (honored by downstream callers, not the core)
    #[serde(default)]
    pub retry_failed_steps: bool,

    /// Remove step outputs when the run fails (downstream concern)
    #[serde(default)]
    pub cleanup_on_failure: bool,

    /// Keep intermediate files produced by steps (downstream concern)
    #[serde(default)]
    pub preserve_intermediate: bool,
}

fn default_fail_fast() -> bool {
    true
}

fn default_max_workers() -> usize {
    4
}

fn default_timeout_seconds() -> u64 {
    300
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new("pipeline")
    }
}

impl PipelineConfig {
    /// Create a configuration with the given name and default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fail_fast: default_fail_fast(),
            parallel: false,
            max_workers: default_max_workers(),
            timeout_seconds: default_timeout_seconds(),
            retry_failed_steps: false,
            cleanup_on_failure: false,
            preserve_intermediate: false,
        }
    }

    /// Load pipeline configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse pipeline configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.name.trim().is_empty() {
            return Err(PipelineError::InvalidConfig(
                "pipeline name must not be empty".to_string(),
            ));
        }
        if self.max_workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(PipelineError::InvalidConfig(
                "timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
