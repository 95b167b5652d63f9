// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the scheduler and the reconciler.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! the renderer calls as tasks run and roots render and commit. All method
//! bodies default to no-ops, so implementing only the events you care about
//! is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! [`CommitSummaryBuilder`] collects phase timestamps and mutation counts
//! during one render-and-commit and produces a [`CommitSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`): gates [`FiberMutation`] records and the
//!   corresponding `TraceSink` method.

use crate::lane::Lanes;
use crate::root::RootId;
use crate::scheduler::{PriorityLevel, TaskId};
use crate::time::HostTime;

#[cfg(feature = "trace-rich")]
use crate::fiber::FiberId;
#[cfg(feature = "trace-rich")]
use crate::host::InstanceId;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a render-and-commit is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Building the work-in-progress tree. May span several slices.
    Render,
    /// Applying host mutations and layout effects.
    Mutation,
    /// Running deferred passive effects.
    Passive,
}

impl PhaseKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Render => "render",
            Self::Mutation => "mutation",
            Self::Passive => "passive",
        }
    }
}

/// What happened to a scheduler task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskEventKind {
    /// The task was queued.
    Scheduled,
    /// The task started running.
    Started,
    /// The task ran out of slice and left a continuation.
    Yielded,
    /// The task finished.
    Completed,
    /// The task was cancelled before it ran to completion.
    Cancelled,
}

impl TaskEventKind {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Started => "started",
            Self::Yielded => "yielded",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Which host mutation a fiber caused.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Inserted or moved.
    Placement,
    /// Attributes or direct text changed.
    Update,
    /// Text node content changed.
    TextUpdate,
    /// Removed with its subtree.
    Deletion,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted as a scheduler task changes state.
#[derive(Clone, Copy, Debug)]
pub struct TaskEvent {
    /// The task.
    pub task: TaskId,
    /// What happened.
    pub kind: TaskEventKind,
    /// The task's priority class.
    pub priority: PriorityLevel,
    /// Host time of the event.
    pub timestamp: HostTime,
}

/// Emitted when a root's render task is (re)scheduled.
#[derive(Clone, Copy, Debug)]
pub struct RootScheduledEvent {
    /// The root.
    pub root: RootId,
    /// The lanes the next render will cover.
    pub lanes: Lanes,
    /// Priority of the new task.
    pub priority: PriorityLevel,
    /// `true` if an older task for the root was cancelled.
    pub replaced: bool,
    /// Host time of scheduling.
    pub timestamp: HostTime,
}

/// Marks the beginning of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// The root being worked on.
    pub root: RootId,
    /// Lanes of the render.
    pub lanes: Lanes,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// The root being worked on.
    pub root: RootId,
    /// Lanes of the render.
    pub lanes: Lanes,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Per-commit summary produced by [`CommitSummaryBuilder`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitSummary {
    /// Number of commits of this root before this one.
    pub commit_index: u64,
    /// Root index.
    pub root: u32,
    /// Lanes the commit finished.
    pub lanes: Lanes,
    /// Host nodes inserted or moved.
    pub placements: u32,
    /// Host nodes whose attributes or text changed.
    pub updates: u32,
    /// Subtrees removed.
    pub deletions: u32,
    /// Render phase duration in ticks, first slice start to last slice end.
    pub render_ticks: u64,
    /// Mutation phase duration in ticks.
    pub commit_ticks: u64,
    /// Number of slices the render took.
    pub slices: u32,
}

/// A per-commit fiber mutation record.
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct FiberMutation {
    /// The fiber that caused the mutation.
    pub fiber: FiberId,
    /// What happened.
    pub kind: MutationKind,
    /// The host node touched, if any.
    pub instance: Option<InstanceId>,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the renderer.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called as a scheduler task changes state.
    fn on_task(&mut self, e: &TaskEvent) {
        _ = e;
    }

    /// Called when a root's render task is scheduled.
    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        _ = e;
    }

    /// Called at the beginning of a phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called once per commit.
    fn on_commit_summary(&mut self, s: &CommitSummary) {
        _ = s;
    }

    /// Called with the fiber mutations of a commit (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        _ = (commit_index, mutations);
    }
}

impl<T: TraceSink + ?Sized> TraceSink for &mut T {
    fn on_task(&mut self, e: &TaskEvent) {
        (**self).on_task(e);
    }

    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        (**self).on_root_scheduled(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        (**self).on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        (**self).on_phase_end(e);
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        (**self).on_commit_summary(s);
    }

    #[cfg(feature = "trace-rich")]
    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        (**self).on_fiber_mutations(commit_index, mutations);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Emits a [`TaskEvent`].
    #[inline]
    pub fn task(&mut self, e: &TaskEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_task(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RootScheduledEvent`].
    #[inline]
    pub fn root_scheduled(&mut self, e: &RootScheduledEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_root_scheduled(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`CommitSummary`].
    #[inline]
    pub fn commit_summary(&mut self, s: &CommitSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_commit_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits fiber mutations (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        if let Some(s) = &mut self.sink {
            s.on_fiber_mutations(commit_index, mutations);
        }
    }
}

// ---------------------------------------------------------------------------
// CommitSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps and mutation counts for one render-and-commit
/// and produces a [`CommitSummary`].
#[derive(Clone, Copy, Debug)]
pub struct CommitSummaryBuilder {
    summary: CommitSummary,
    phase_starts: [Option<HostTime>; 3],
    phase_ends: [Option<HostTime>; 3],
}

impl CommitSummaryBuilder {
    /// Starts a summary for a render of `lanes` on `root`.
    #[must_use]
    pub fn new(root: RootId, lanes: Lanes) -> Self {
        Self {
            summary: CommitSummary {
                root: root.index(),
                lanes,
                ..CommitSummary::default()
            },
            phase_starts: [None; 3],
            phase_ends: [None; 3],
        }
    }

    /// Records the start of a phase. Only the first start is kept, so a
    /// render resumed across slices measures from its first slice.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        let slot = &mut self.phase_starts[phase_index(phase)];
        if slot.is_none() {
            *slot = Some(t);
        }
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Counts one more render slice.
    pub fn slice(&mut self) {
        self.summary.slices += 1;
    }

    /// Adds mutation counts.
    pub fn mutations(&mut self, placements: u32, updates: u32, deletions: u32) {
        self.summary.placements += placements;
        self.summary.updates += updates;
        self.summary.deletions += deletions;
    }

    /// Consumes the builder and produces the final [`CommitSummary`].
    #[must_use]
    pub fn finish(self, commit_index: u64) -> CommitSummary {
        CommitSummary {
            commit_index,
            render_ticks: self.phase_duration(PhaseKind::Render),
            commit_ticks: self.phase_duration(PhaseKind::Mutation),
            ..self.summary
        }
    }

    fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).ticks(),
            _ => 0,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Render => 0,
        PhaseKind::Mutation => 1,
        PhaseKind::Passive => 2,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task() -> TaskEvent {
        TaskEvent {
            task: TaskId(3),
            kind: TaskEventKind::Started,
            priority: PriorityLevel::Normal,
            timestamp: HostTime(1_000),
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_task(&sample_task());
        sink.on_commit_summary(&CommitSummary::default());
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        tracer.task(&sample_task());
        tracer.commit_summary(&CommitSummary::default());
    }

    #[test]
    fn summary_builder_measures_from_first_slice() {
        let mut builder = CommitSummaryBuilder::new(RootId::new(2), Lanes::TRANSITION_1);
        builder.phase_begin(PhaseKind::Render, HostTime(100));
        builder.slice();
        builder.phase_begin(PhaseKind::Render, HostTime(900));
        builder.slice();
        builder.phase_end(PhaseKind::Render, HostTime(1_500));
        builder.phase_begin(PhaseKind::Mutation, HostTime(1_500));
        builder.phase_end(PhaseKind::Mutation, HostTime(1_550));
        builder.mutations(2, 1, 0);
        builder.mutations(1, 0, 1);

        let summary = builder.finish(7);
        assert_eq!(summary.render_ticks, 1_400, "measured from the first slice");
        assert_eq!(summary.commit_ticks, 50);
        assert_eq!(summary.slices, 2);
        assert_eq!((summary.placements, summary.updates, summary.deletions), (3, 1, 1));
        assert_eq!(summary.commit_index, 7);
        assert_eq!(summary.root, 2);
        assert_eq!(summary.lanes, Lanes::TRANSITION_1);
    }

    #[test]
    fn summary_builder_missing_phases_are_zero() {
        let summary = CommitSummaryBuilder::new(RootId::new(0), Lanes::SYNC).finish(0);
        assert_eq!(summary.render_ticks, 0);
        assert_eq!(summary.commit_ticks, 0);
    }

    #[test]
    fn names_are_stable() {
        assert_eq!(PhaseKind::Mutation.as_str(), "mutation");
        assert_eq!(TaskEventKind::Yielded.as_str(), "yielded");
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            tasks: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_task(&mut self, e: &TaskEvent) {
                self.tasks.push(e.task.0);
            }
        }

        let mut sink = RecordingSink { tasks: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        tracer.task(&sample_task());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.tasks, &[3]);
    }
}
