//! Tests for progress reporting across the analysis passes.

mod common;

use heapdump::{
    NewNode, NoProgress, NodeMap, PROGRESS_INTERVAL, Phase, ProgressEvent, RecordingProgress, TracingProgress, collapse,
    compute_parents, compute_retained_sizes, load_lines, prune_expensive,
};
use pretty_assertions::assert_eq;

use common::{EXAMPLE_DUMP, INSTANCE_DUMP, load};

/// A pass reports start, periodic advances, and finish.
#[test]
fn pass_reports_start_advance_finish() {
    let mut map = load(&EXAMPLE_DUMP);
    let mut progress = RecordingProgress::new();
    compute_parents(&mut map, &mut progress);
    assert_eq!(
        progress.events(),
        &[
            ProgressEvent::Start {
                phase: Phase::ComputeParents,
                total: 7
            },
            ProgressEvent::Advance {
                phase: Phase::ComputeParents,
                done: 0,
                total: 7
            },
            ProgressEvent::Finish {
                phase: Phase::ComputeParents,
                done: 7
            },
        ]
    );
}

/// Advances arrive every `PROGRESS_INTERVAL` items.
#[test]
fn advances_every_interval() {
    let mut map = NodeMap::new();
    for id in 0..1200 {
        map.insert(NewNode::new(id, "int", 12));
    }
    let mut progress = RecordingProgress::new();
    compute_retained_sizes(&map, &mut progress);
    let advances: Vec<usize> = progress
        .events()
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Advance { done, .. } => Some(*done),
            _ => None,
        })
        .collect();
    assert_eq!(advances, vec![0, PROGRESS_INTERVAL, 2 * PROGRESS_INTERVAL]);
    assert_eq!(progress.finished(Phase::RetainedSizes), Some(1200));
}

/// Duplicate records after an interval boundary do not repeat the advance.
#[test]
fn duplicate_records_do_not_repeat_load_advances() {
    let mut lines: Vec<String> = (1..=PROGRESS_INTERVAL)
        .map(|id| format!(r#"{{"address": {id}, "type": "int", "size": 12, "refs": []}}"#))
        .collect();
    let last = lines[PROGRESS_INTERVAL - 1].clone();
    lines.extend(std::iter::repeat_n(last, 3));

    let mut progress = RecordingProgress::new();
    let map = load_lines(&lines, &mut progress).unwrap();
    assert_eq!(map.len(), PROGRESS_INTERVAL);
    let advances: Vec<usize> = progress
        .events()
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::Advance { done, .. } => Some(*done),
            _ => None,
        })
        .collect();
    assert_eq!(advances, vec![PROGRESS_INTERVAL]);
}

/// Phases appear in the order the passes run, including implicit recomputation.
#[test]
fn pipeline_phase_order() {
    let mut progress = RecordingProgress::new();
    let mut map = load_lines(INSTANCE_DUMP, &mut progress).unwrap();
    prune_expensive(&mut map, &mut progress);
    collapse(&mut map, &mut progress);

    assert_eq!(
        progress.phases(),
        vec![
            Phase::Load,
            Phase::Prune,
            Phase::ComputeParents,
            Phase::Collapse,
            Phase::ComputeParents,
        ]
    );
    assert_eq!(progress.finished(Phase::Load), Some(15));
}

#[test]
fn phase_names() {
    assert_eq!(Phase::ComputeParents.as_str(), "compute_parents");
    assert_eq!(Phase::RetainedSizes.as_str(), "retained_sizes");
    assert_eq!(Phase::Load.as_str(), "load");
}

/// The tracing observer logs without disturbing the results.
#[test]
fn tracing_progress_logs_passes() {
    let subscriber = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        let mut progress = TracingProgress::new();
        let mut map = load_lines(EXAMPLE_DUMP, &mut progress).unwrap();
        compute_parents(&mut map, &mut progress);
        compute_retained_sizes(&map, &mut progress);
        assert_eq!(map.lookup(1).unwrap().retained_size(), Some(261));
    });

    let mut map = load(&EXAMPLE_DUMP);
    compute_parents(&mut map, &mut NoProgress);
    assert!(map.parents_computed());
}
