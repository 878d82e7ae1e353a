//! Core domain models for stepdag
//!
//! This module defines the fundamental data structures that represent
//! pipelines, steps, conditions, and their results.

pub mod condition;
pub mod config;
pub mod metadata;
pub mod pipeline;
pub mod result;
pub mod step;

pub use condition::*;
pub use config::*;
pub use metadata::*;
pub use pipeline::*;
pub use result::*;
pub use step::*;
