//! Test: leveled parallel execution under a bounded worker pool

use crate::helpers::*;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use stepdag::{Step, StepMode};

/// A diamond graph executes level by level: a dependent never starts before
/// its dependencies' level has fully completed.
#[tokio::test]
async fn test_diamond_graph_runs_in_levels() {
    let mut pipeline = parallel_pipeline(4);

    pipeline
        .add_step(Step::new("probe", Arc::new(MockProcessor::succeeding())))
        .unwrap();
    pipeline
        .add_step(
            Step::new("resize", Arc::new(MockProcessor::succeeding()))
                .with_depends_on(vec!["probe".into()]),
        )
        .unwrap();
    pipeline
        .add_step(
            Step::new("extract", Arc::new(MockProcessor::succeeding()))
                .with_depends_on(vec!["probe".into()]),
        )
        .unwrap();
    pipeline
        .add_step(
            Step::new("report", Arc::new(MockProcessor::succeeding()))
                .with_depends_on(vec!["resize".into(), "extract".into()]),
        )
        .unwrap();

    let result = pipeline.execute("/tmp/input.mkv").await;

    assert_pipeline_completed(&result);
    assert_eq!(result.step_results.len(), 4);

    let names = executed_names(&result);
    let pos = |n: &str| names.iter().position(|x| x == n).unwrap();
    assert_eq!(pos("probe"), 0);
    assert_eq!(pos("report"), 3);
    assert!(pos("resize") < pos("report"));
    assert!(pos("extract") < pos("report"));
}

/// In-flight step count never exceeds `max_workers`.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrency_bounded_by_max_workers() {
    let tracker = Arc::new(InFlightTracker::default());
    let mut pipeline = parallel_pipeline(2);

    for name in ["a", "b", "c", "d"] {
        pipeline
            .add_step(Step::new(
                name,
                Arc::new(
                    MockProcessor::succeeding()
                        .with_delay(Duration::from_millis(25))
                        .with_tracker(Arc::clone(&tracker)),
                ),
            ))
            .unwrap();
    }

    let result = pipeline.execute("/tmp/input.png").await;

    assert_pipeline_completed(&result);
    assert_eq!(result.step_results.len(), 4);
    assert!(
        tracker.peak() <= 2,
        "peak concurrency {} exceeded max_workers",
        tracker.peak()
    );
}

/// A required failure with fail-fast stops before the next level starts.
#[tokio::test]
async fn test_parallel_fail_fast_stops_next_level() {
    let mut pipeline = parallel_pipeline(4);

    let downstream = MockProcessor::succeeding();
    let downstream_calls = downstream.call_counter();

    pipeline
        .add_step(Step::new(
            "a",
            Arc::new(MockProcessor::failing(vec!["encoder crashed"])),
        ))
        .unwrap();
    pipeline.add_step(Step::new("b", Arc::new(downstream))).unwrap();
    // "c" is in the next level and must never start.
    let c = MockProcessor::succeeding();
    let c_calls = c.call_counter();
    pipeline
        .add_step(Step::new("c", Arc::new(c)).with_depends_on(vec!["b".into()]))
        .unwrap();

    let result = pipeline.execute("/tmp/input.mkv").await;

    assert_pipeline_failed(&result);
    // The failing step's own level still ran to the barrier.
    assert_eq!(downstream_calls.load(Ordering::SeqCst), 1);
    assert_eq!(c_calls.load(Ordering::SeqCst), 0);
    assert_step_skipped(&result, "c");
    // Aggregation and timing still finalize when stopping early.
    assert!(result.completed_at.is_some());
}

/// An optional failure in a level does not prevent later levels.
#[tokio::test]
async fn test_parallel_optional_failure_continues() {
    let mut pipeline = parallel_pipeline(4);

    pipeline
        .add_step(
            Step::new("a", Arc::new(MockProcessor::failing(vec!["no audio"])))
                .with_mode(StepMode::Optional),
        )
        .unwrap();
    pipeline
        .add_step(Step::new("b", Arc::new(MockProcessor::succeeding())))
        .unwrap();
    pipeline
        .add_step(
            Step::new("c", Arc::new(MockProcessor::succeeding()))
                .with_depends_on(vec!["b".into()]),
        )
        .unwrap();

    let result = pipeline.execute("/tmp/input.mkv").await;

    assert_pipeline_completed(&result);
    assert_step_executed(&result, "c");
    assert!(!result.warnings.is_empty());
}

/// A step whose dependency failed in an earlier level is filtered out of its
/// own level without a result entry.
#[tokio::test]
async fn test_parallel_dependency_gated_skip() {
    let mut pipeline = parallel_pipeline(4);

    pipeline
        .add_step(
            Step::new("a", Arc::new(MockProcessor::failing(vec!["bad frame"])))
                .with_mode(StepMode::Optional),
        )
        .unwrap();
    pipeline
        .add_step(
            Step::new("b", Arc::new(MockProcessor::succeeding()))
                .with_depends_on(vec!["a".into()]),
        )
        .unwrap();

    let result = pipeline.execute("/tmp/input.png").await;

    assert_pipeline_completed(&result);
    assert_execution_order(&result, &["a"]);
    assert_step_skipped(&result, "b");
}

/// max_workers of 1 serializes execution but still completes every level.
#[tokio::test]
async fn test_single_worker_completes_all_levels() {
    let mut pipeline = parallel_pipeline(1);

    for name in ["a", "b"] {
        pipeline
            .add_step(Step::new(name, Arc::new(MockProcessor::succeeding())))
            .unwrap();
    }
    pipeline
        .add_step(
            Step::new("c", Arc::new(MockProcessor::succeeding()))
                .with_depends_on(vec!["a".into(), "b".into()]),
        )
        .unwrap();

    let result = pipeline.execute("/tmp/input.png").await;

    assert_pipeline_completed(&result);
    assert_eq!(result.step_results.len(), 3);
}
