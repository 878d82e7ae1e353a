//! Dependency graph validation
//!
//! Checks run once, before any step executes: every dependency must name an
//! existing step, and the graph must be acyclic. A cyclic graph must never
//! partially execute.

use crate::core::Step;
use crate::error::PipelineError;
use std::collections::{HashMap, HashSet};

/// Validate dependency references and acyclicity of the whole step map.
pub fn validate_graph(steps: &HashMap<String, Step>) -> Result<(), PipelineError> {
    for step in steps.values() {
        for dep in &step.depends_on {
            if !steps.contains_key(dep) {
                return Err(PipelineError::UnknownDependency {
                    step: step.name.clone(),
                    dependency: dep.clone(),
                });
            }
        }
    }

    check_cycles(steps)
}

/// Depth-first cycle check with an explicit frame stack.
///
/// Uses an on-stack marker set rather than call recursion so that stack
/// depth stays bounded for large graphs.
fn check_cycles(steps: &HashMap<String, Step>) -> Result<(), PipelineError> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut on_stack: HashSet<&str> = HashSet::new();

    // Deterministic traversal order
    let mut roots: Vec<&str> = steps.keys().map(String::as_str).collect();
    roots.sort_unstable();

    for root in roots {
        if visited.contains(root) {
            continue;
        }

        // Each frame is (step, index of the next dependency to explore).
        let mut stack: Vec<(&str, usize)> = vec![(root, 0)];
        on_stack.insert(root);

        while let Some((name, next_dep)) = stack.pop() {
            let deps = steps
                .get(name)
                .map(|s| s.depends_on.as_slice())
                .unwrap_or(&[]);

            if next_dep < deps.len() {
                stack.push((name, next_dep + 1));
                let dep = deps[next_dep].as_str();

                if on_stack.contains(dep) {
                    return Err(PipelineError::CircularDependency(dep.to_string()));
                }
                if !visited.contains(dep) {
                    on_stack.insert(dep);
                    stack.push((dep, 0));
                }
            } else {
                on_stack.remove(name);
                visited.insert(name);
            }
        }
    }

    Ok(())
}
