//! Pipeline execution: graph validation, scheduling, and the run driver

pub mod executor;
pub mod scheduler;
pub mod validator;

pub use executor::PipelineExecutor;
pub use scheduler::{execution_levels, execution_order};
pub use validator::validate_graph;
