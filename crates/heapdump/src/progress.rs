//! Progress reporting for long analysis passes.
//!
//! Loading a snapshot or computing retained sizes over millions of nodes takes a
//! while, and none of the passes can be interrupted. Each pass instead reports
//! coarse progress to a [`Progress`] observer chosen by the caller:
//!
//! | Observer | Purpose |
//! |----------|---------|
//! | [`NoProgress`] | Zero-cost no-op (library and test default) |
//! | [`TracingProgress`] | Emits `tracing` events, for CLIs and services |
//! | [`RecordingProgress`] | Keeps every event, for tests and post-mortems |
//!
//! Passes take the observer as `&mut impl Progress`, so with [`NoProgress`] every
//! hook is inlined away.

use std::time::Instant;

use strum::IntoStaticStr;

/// Passes report progress every `PROGRESS_INTERVAL` items.
pub const PROGRESS_INTERVAL: usize = 512;

/// Returns true when `done` items into a pass warrant an `on_advance` call.
#[inline]
pub(crate) fn should_report(done: usize) -> bool {
    done % PROGRESS_INTERVAL == 0
}

/// The analysis pass a progress event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Load,
    ComputeParents,
    RetainedSizes,
    Prune,
    Collapse,
    Summarize,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// Observer for pass progress.
///
/// All methods default to no-ops; implementations override what they need.
/// `total` is 0 when the pass cannot know its size up front (loading from a stream).
pub trait Progress: std::fmt::Debug {
    /// Called once before a pass starts.
    #[inline(always)]
    fn on_start(&mut self, _phase: Phase, _total: usize) {}

    /// Called every [`PROGRESS_INTERVAL`] items.
    #[inline(always)]
    fn on_advance(&mut self, _phase: Phase, _done: usize, _total: usize) {}

    /// Called once after a pass completes, with the number of items processed.
    #[inline(always)]
    fn on_finish(&mut self, _phase: Phase, _done: usize) {}
}

/// A progress observer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Reports progress as `tracing` events.
///
/// Starts and finishes are logged at `INFO`, advances at `DEBUG`. The finish event
/// carries the elapsed wall time of the pass.
#[derive(Debug, Default)]
pub struct TracingProgress {
    started: Option<Instant>,
}

impl TracingProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for TracingProgress {
    fn on_start(&mut self, phase: Phase, total: usize) {
        self.started = Some(Instant::now());
        tracing::info!(phase = phase.as_str(), total, "pass started");
    }

    fn on_advance(&mut self, phase: Phase, done: usize, total: usize) {
        tracing::debug!(phase = phase.as_str(), done, total, "pass progress");
    }

    fn on_finish(&mut self, phase: Phase, done: usize) {
        let elapsed_ms = self
            .started
            .take()
            .map_or(0, |t| u64::try_from(t.elapsed().as_millis()).unwrap_or(u64::MAX));
        tracing::info!(phase = phase.as_str(), done, elapsed_ms, "pass finished");
    }
}

/// A single recorded progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    Start { phase: Phase, total: usize },
    Advance { phase: Phase, done: usize, total: usize },
    Finish { phase: Phase, done: usize },
}

/// Records every progress event in order.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Vec<ProgressEvent>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[ProgressEvent] {
        &self.events
    }

    /// Phases in the order they started.
    pub fn phases(&self) -> Vec<Phase> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Start { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    /// The item count reported when `phase` last finished.
    pub fn finished(&self, phase: Phase) -> Option<usize> {
        self.events.iter().rev().find_map(|event| match *event {
            ProgressEvent::Finish { phase: p, done } if p == phase => Some(done),
            _ => None,
        })
    }
}

impl Progress for RecordingProgress {
    fn on_start(&mut self, phase: Phase, total: usize) {
        self.events.push(ProgressEvent::Start { phase, total });
    }

    fn on_advance(&mut self, phase: Phase, done: usize, total: usize) {
        self.events.push(ProgressEvent::Advance { phase, done, total });
    }

    fn on_finish(&mut self, phase: Phase, done: usize) {
        self.events.push(ProgressEvent::Finish { phase, done });
    }
}
