//! Eligibility conditions for conditional steps
//!
//! A condition is a pure predicate over the run's [`Metadata`]. Conditions
//! evaluate fail-closed: a predicate error or a missing attribute makes the
//! step ineligible rather than failing the run.

use crate::core::metadata::Metadata;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Boxed predicate over metadata. Errors are treated as `false`.
pub type ConditionFn = Arc<dyn Fn(&Metadata) -> anyhow::Result<bool> + Send + Sync>;

/// Pattern for matching a metadata attribute value.
#[derive(Debug, Clone)]
pub enum ConditionPattern {
    /// Simple substring match
    Simple(String),
    /// Regular expression match
    Regex(Regex),
}

impl ConditionPattern {
    /// Check if the pattern matches the given text.
    pub fn matches(&self, text: &str) -> bool {
        match self {
            ConditionPattern::Simple(pattern) => text.contains(pattern),
            ConditionPattern::Regex(regex) => regex.is_match(text),
        }
    }
}

/// Condition deciding whether a conditional step is eligible to run.
#[derive(Clone)]
pub enum StepCondition {
    /// Arbitrary predicate over the metadata.
    Predicate(ConditionFn),

    /// Declarative check: a string attribute matches a pattern.
    FieldMatches {
        field: String,
        pattern: ConditionPattern,
    },
}

impl StepCondition {
    /// Wrap a closure predicate.
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&Metadata) -> anyhow::Result<bool> + Send + Sync + 'static,
    {
        StepCondition::Predicate(Arc::new(f))
    }

    /// Attribute `field` contains `needle` as a substring.
    pub fn field_contains(field: impl Into<String>, needle: impl Into<String>) -> Self {
        StepCondition::FieldMatches {
            field: field.into(),
            pattern: ConditionPattern::Simple(needle.into()),
        }
    }

    /// Attribute `field` matches the given regular expression.
    pub fn field_regex(field: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(StepCondition::FieldMatches {
            field: field.into(),
            pattern: ConditionPattern::Regex(Regex::new(pattern)?),
        })
    }

    /// Evaluate the condition against the run metadata, fail-closed.
    pub fn evaluate(&self, metadata: &Metadata) -> bool {
        match self {
            StepCondition::Predicate(f) => match f(metadata) {
                Ok(eligible) => eligible,
                Err(e) => {
                    tracing::warn!("condition predicate failed, treating as ineligible: {e}");
                    false
                }
            },
            StepCondition::FieldMatches { field, pattern } => metadata
                .get_str(field)
                .map(|value| pattern.matches(value))
                .unwrap_or(false),
        }
    }
}

impl fmt::Debug for StepCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepCondition::Predicate(_) => f.write_str("StepCondition::Predicate(..)"),
            StepCondition::FieldMatches { field, pattern } => f
                .debug_struct("StepCondition::FieldMatches")
                .field("field", field)
                .field("pattern", pattern)
                .finish(),
        }
    }
}
