//! Metadata value object - shared input attributes for one pipeline run
//!
//! Metadata is an opaque bag of attributes extracted once per run and shared
//! read-only with every conditional step's eligibility check. The pipeline
//! core never interprets the attributes itself; only conditions do.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Attributes describing the input artifact (file type, dimensions, etc.).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    attributes: HashMap<String, Value>,
}

impl Metadata {
    /// Create an empty metadata bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Builder-style attribute setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a raw attribute value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// Get an attribute as a string slice.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(|v| v.as_str())
    }

    /// Get an attribute as an unsigned integer.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.attributes.get(key).and_then(|v| v.as_u64())
    }

    /// Get an attribute as a boolean.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.attributes.get(key).and_then(|v| v.as_bool())
    }

    /// Convenience accessor for the conventional `file_type` attribute.
    pub fn file_type(&self) -> Option<&str> {
        self.get_str("file_type")
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
