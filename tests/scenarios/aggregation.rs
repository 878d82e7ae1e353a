//! Test: result aggregation - processed files, timing, reuse across runs

use crate::helpers::*;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use stepdag::{Step, StepMode};

/// An empty pipeline completes immediately with no results.
#[tokio::test]
async fn test_empty_pipeline_completes() {
    let pipeline = sequential_pipeline();
    let result = pipeline.execute("/tmp/input.png").await;

    assert_pipeline_completed(&result);
    assert!(result.step_results.is_empty());
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
    assert!(result.completed_at.is_some());
}

/// `processed_files` is the deduplicated union of successful steps' outputs
/// and thumbnails, even when two steps report the same path.
#[tokio::test]
async fn test_processed_files_deduplicated() {
    let mut pipeline = sequential_pipeline();

    pipeline
        .add_step(Step::new(
            "resize",
            Arc::new(
                MockProcessor::succeeding()
                    .with_outputs(vec!["/out/img_640.png", "/out/shared.png"]),
            ),
        ))
        .unwrap();
    pipeline
        .add_step(Step::new(
            "thumbs",
            Arc::new(
                MockProcessor::succeeding()
                    .with_outputs(vec!["/out/shared.png"])
                    .with_thumbnails(vec!["/out/thumb.png"]),
            ),
        ))
        .unwrap();

    let result = pipeline.execute("/tmp/input.png").await;

    assert_pipeline_completed(&result);
    assert_eq!(
        result.processed_files,
        vec![
            PathBuf::from("/out/img_640.png"),
            PathBuf::from("/out/shared.png"),
            PathBuf::from("/out/thumb.png"),
        ]
    );
}

/// Failed steps contribute nothing to `processed_files`.
#[tokio::test]
async fn test_failed_step_outputs_excluded() {
    let mut pipeline = sequential_pipeline();
    pipeline
        .add_step(
            Step::new(
                "broken",
                Arc::new(MockProcessor::failing(vec!["half-written file"])),
            )
            .with_mode(StepMode::Optional),
        )
        .unwrap();
    pipeline
        .add_step(Step::new(
            "ok",
            Arc::new(MockProcessor::succeeding().with_outputs(vec!["/out/good.png"])),
        ))
        .unwrap();

    let result = pipeline.execute("/tmp/input.png").await;
    assert_eq!(result.processed_files, vec![PathBuf::from("/out/good.png")]);
}

/// The pipeline object is reusable: each execute produces one independent
/// result with its own execution id.
#[tokio::test]
async fn test_pipeline_reusable_across_runs() {
    let mut pipeline = sequential_pipeline();

    let processor = MockProcessor::succeeding();
    let calls = processor.call_counter();
    pipeline
        .add_step(Step::new("resize", Arc::new(processor)))
        .unwrap();

    let first = pipeline.execute("/tmp/one.png").await;
    let second = pipeline.execute("/tmp/two.png").await;

    assert_pipeline_completed(&first);
    assert_pipeline_completed(&second);
    assert_ne!(first.execution_id, second.execution_id);
    assert_eq!(first.original_file, PathBuf::from("/tmp/one.png"));
    assert_eq!(second.original_file, PathBuf::from("/tmp/two.png"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

/// The original input path and wall-clock timing are always recorded.
#[tokio::test]
async fn test_run_records_input_and_timing() {
    let mut input = tempfile::NamedTempFile::new().unwrap();
    writeln!(input, "fake image bytes").unwrap();

    let mut pipeline = sequential_pipeline();
    pipeline
        .add_step(Step::new(
            "fail",
            Arc::new(MockProcessor::failing(vec!["boom"])),
        ))
        .unwrap();

    let result = pipeline.execute(input.path()).await;

    assert_pipeline_failed(&result);
    assert_eq!(result.original_file, input.path());
    assert!(result.completed_at.is_some());
    assert!(result.completed_at.unwrap() >= result.started_at);
}

/// Pre-flight validation reports whether any processor accepts the input.
#[tokio::test]
async fn test_preflight_validation() {
    let mut pipeline = sequential_pipeline();
    pipeline
        .add_step(Step::new("a", Arc::new(MockProcessor::rejecting())))
        .unwrap();

    assert!(!pipeline.validate("/tmp/input.bin").await);

    pipeline
        .add_step(Step::new("b", Arc::new(MockProcessor::succeeding())))
        .unwrap();
    assert!(pipeline.validate("/tmp/input.bin").await);
}
