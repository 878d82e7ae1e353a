//! Topological scheduling over the step dependency graph
//!
//! Sequential mode consumes a total order computed with Kahn's algorithm.
//! Parallel mode consumes a leveled partition: level k holds every step
//! whose dependencies are all scheduled in levels < k.

use crate::core::Step;
use crate::error::PipelineError;
use std::collections::{HashMap, HashSet, VecDeque};

/// Compute a total execution order with Kahn's algorithm.
///
/// Ties are broken lexicographically by step name so that the order is
/// deterministic. The validator runs before scheduling, so an incomplete
/// order here means a cycle slipped through; that defensive check raises
/// the same error class as the validator.
pub fn execution_order(steps: &HashMap<String, Step>) -> Result<Vec<String>, PipelineError> {
    let mut in_degree: HashMap<&str, usize> = steps
        .values()
        .map(|s| (s.name.as_str(), s.depends_on.len()))
        .collect();

    // dependency -> steps that list it
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    for step in steps.values() {
        for dep in &step.depends_on {
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(step.name.as_str());
        }
    }

    let mut ready: Vec<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .collect();
    ready.sort_unstable();
    let mut queue: VecDeque<&str> = ready.into();

    let mut order = Vec::with_capacity(steps.len());
    while let Some(name) = queue.pop_front() {
        order.push(name.to_string());

        let mut unlocked = Vec::new();
        if let Some(children) = dependents.get(name) {
            for &child in children {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        unlocked.push(child);
                    }
                }
            }
        }
        unlocked.sort_unstable();
        queue.extend(unlocked);
    }

    if order.len() != steps.len() {
        let stuck = steps
            .keys()
            .find(|name| !order.contains(name))
            .cloned()
            .unwrap_or_default();
        return Err(PipelineError::CircularDependency(stuck));
    }

    Ok(order)
}

/// Partition steps into ordered dependency levels.
///
/// Equivalent to peeling off the whole ready frontier from the Kahn queue
/// at once instead of one node at a time. Steps within a level carry no
/// execution-order guarantee relative to each other.
pub fn execution_levels(steps: &HashMap<String, Step>) -> Result<Vec<Vec<String>>, PipelineError> {
    let mut scheduled: HashSet<&str> = HashSet::new();
    let mut remaining: Vec<&Step> = steps.values().collect();
    let mut levels = Vec::new();

    while !remaining.is_empty() {
        let (ready, blocked): (Vec<&Step>, Vec<&Step>) = remaining.into_iter().partition(|s| {
            s.depends_on
                .iter()
                .all(|dep| scheduled.contains(dep.as_str()))
        });

        if ready.is_empty() {
            let stuck = blocked
                .first()
                .map(|s| s.name.clone())
                .unwrap_or_default();
            return Err(PipelineError::CircularDependency(stuck));
        }

        let mut level: Vec<String> = ready.iter().map(|s| s.name.clone()).collect();
        level.sort_unstable();
        scheduled.extend(ready.iter().map(|s| s.name.as_str()));
        levels.push(level);
        remaining = blocked;
    }

    Ok(levels)
}
