// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`].
//!
//! Fiber mutation batches ([`on_fiber_mutations`](TraceSink::on_fiber_mutations))
//! store only the count.

use arbor_core::lane::Lanes;
use arbor_core::root::RootId;
use arbor_core::scheduler::{PriorityLevel, TaskId};
use arbor_core::time::HostTime;
use arbor_core::trace::{
    CommitSummary, FiberMutation, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RootScheduledEvent,
    TaskEvent, TaskEventKind, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TASK: u8 = 1;
const TAG_ROOT_SCHEDULED: u8 = 2;
const TAG_PHASE_BEGIN: u8 = 3;
const TAG_PHASE_END: u8 = 4;
const TAG_COMMIT_SUMMARY: u8 = 5;
const TAG_FIBER_MUTATIONS_COUNT: u8 = 6;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything recorded so far.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_priority(&mut self, p: PriorityLevel) {
        self.write_u8(match p {
            PriorityLevel::Immediate => 1,
            PriorityLevel::UserBlocking => 2,
            PriorityLevel::Normal => 3,
            PriorityLevel::Low => 4,
            PriorityLevel::Idle => 5,
        });
    }

    fn write_task_kind(&mut self, k: TaskEventKind) {
        self.write_u8(match k {
            TaskEventKind::Scheduled => 0,
            TaskEventKind::Started => 1,
            TaskEventKind::Yielded => 2,
            TaskEventKind::Completed => 3,
            TaskEventKind::Cancelled => 4,
        });
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Render => 0,
            PhaseKind::Mutation => 1,
            PhaseKind::Passive => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_task(&mut self, e: &TaskEvent) {
        self.write_u8(TAG_TASK);
        self.write_u64(e.task.0);
        self.write_task_kind(e.kind);
        self.write_priority(e.priority);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        self.write_u8(TAG_ROOT_SCHEDULED);
        self.write_u32(e.root.index());
        self.write_u32(e.lanes.bits());
        self.write_priority(e.priority);
        self.write_u8(u8::from(e.replaced));
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u32(e.root.index());
        self.write_u32(e.lanes.bits());
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u32(e.root.index());
        self.write_u32(e.lanes.bits());
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        self.write_u8(TAG_COMMIT_SUMMARY);
        self.write_u64(s.commit_index);
        self.write_u32(s.root);
        self.write_u32(s.lanes.bits());
        self.write_u32(s.placements);
        self.write_u32(s.updates);
        self.write_u32(s.deletions);
        self.write_u64(s.render_ticks);
        self.write_u64(s.commit_ticks);
        self.write_u32(s.slices);
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        self.write_u8(TAG_FIBER_MUTATIONS_COUNT);
        self.write_u64(commit_index);
        #[expect(
            clippy::cast_possible_truncation,
            reason = "mutation count capped at u32::MAX for recording"
        )]
        self.write_u32(mutations.len().min(u32::MAX as usize) as u32);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`TaskEvent`].
    Task(TaskEvent),
    /// A [`RootScheduledEvent`].
    RootScheduled(RootScheduledEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`CommitSummary`].
    CommitSummary(CommitSummary),
    /// Fiber-mutation count for a commit.
    FiberMutationsCount {
        /// Commit counter of the root.
        commit_index: u64,
        /// Number of mutation records.
        count: u32,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_priority(&mut self) -> Option<PriorityLevel> {
        Some(match self.read_u8()? {
            1 => PriorityLevel::Immediate,
            2 => PriorityLevel::UserBlocking,
            3 => PriorityLevel::Normal,
            4 => PriorityLevel::Low,
            _ => PriorityLevel::Idle,
        })
    }

    fn read_task_kind(&mut self) -> Option<TaskEventKind> {
        Some(match self.read_u8()? {
            0 => TaskEventKind::Scheduled,
            1 => TaskEventKind::Started,
            2 => TaskEventKind::Yielded,
            3 => TaskEventKind::Completed,
            _ => TaskEventKind::Cancelled,
        })
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Render,
            1 => PhaseKind::Mutation,
            _ => PhaseKind::Passive,
        })
    }

    fn read_root(&mut self) -> Option<RootId> {
        self.read_u32().map(RootId::from_index)
    }

    fn read_lanes(&mut self) -> Option<Lanes> {
        self.read_u32().map(Lanes::from_bits)
    }

    fn decode_task(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Task(TaskEvent {
            task: TaskId(self.read_u64()?),
            kind: self.read_task_kind()?,
            priority: self.read_priority()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_root_scheduled(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RootScheduled(RootScheduledEvent {
            root: self.read_root()?,
            lanes: self.read_lanes()?,
            priority: self.read_priority()?,
            replaced: self.read_u8()? != 0,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            root: self.read_root()?,
            lanes: self.read_lanes()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            root: self.read_root()?,
            lanes: self.read_lanes()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_commit_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CommitSummary(CommitSummary {
            commit_index: self.read_u64()?,
            root: self.read_u32()?,
            lanes: self.read_lanes()?,
            placements: self.read_u32()?,
            updates: self.read_u32()?,
            deletions: self.read_u32()?,
            render_ticks: self.read_u64()?,
            commit_ticks: self.read_u64()?,
            slices: self.read_u32()?,
        }))
    }

    fn decode_fiber_mutations_count(&mut self) -> Option<RecordedEvent> {
        let commit_index = self.read_u64()?;
        let count = self.read_u32()?;
        Some(RecordedEvent::FiberMutationsCount {
            commit_index,
            count,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_TASK => self.decode_task(),
            TAG_ROOT_SCHEDULED => self.decode_root_scheduled(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_COMMIT_SUMMARY => self.decode_commit_summary(),
            TAG_FIBER_MUTATIONS_COUNT => self.decode_fiber_mutations_count(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::element::el;
    use arbor_harness::Harness;

    fn sample_summary() -> CommitSummary {
        CommitSummary {
            commit_index: 3,
            root: 1,
            lanes: Lanes::DEFAULT,
            placements: 4,
            updates: 2,
            deletions: 1,
            render_ticks: 1500,
            commit_ticks: 200,
            slices: 2,
        }
    }

    #[test]
    fn task_events_keep_their_fields() {
        let mut rec = RecorderSink::new();
        rec.on_task(&TaskEvent {
            task: TaskId(9),
            kind: TaskEventKind::Yielded,
            priority: PriorityLevel::UserBlocking,
            timestamp: HostTime(2_000),
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::Task(e) => {
                assert_eq!(e.task, TaskId(9));
                assert_eq!(e.kind, TaskEventKind::Yielded);
                assert_eq!(e.priority, PriorityLevel::UserBlocking);
                assert_eq!(e.timestamp, HostTime(2_000));
            }
            other => panic!("expected Task, got {other:?}"),
        }
    }

    #[test]
    fn commit_summary_survives_recording() {
        let mut rec = RecorderSink::new();
        rec.on_commit_summary(&sample_summary());
        let events: Vec<_> = decode(rec.as_bytes()).collect();
        match &events[..] {
            [RecordedEvent::CommitSummary(s)] => assert_eq!(*s, sample_summary()),
            other => panic!("expected one CommitSummary, got {other:?}"),
        }
    }

    #[test]
    fn truncated_record_ends_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_commit_summary(&sample_summary());
        rec.on_commit_summary(&sample_summary());
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];
        assert_eq!(decode(cut).count(), 1, "the partial second record is dropped");
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn recording_a_mount_sees_every_stage() {
        let mut h = Harness::with_sink(RecorderSink::new());
        h.mount(el("ul").child(el("li").child("a")).child(el("li").child("b")));
        h.run_until_idle().unwrap();

        let events: Vec<_> = decode(h.renderer().sink().as_bytes()).collect();
        assert!(
            events.iter().any(|e| matches!(e, RecordedEvent::RootScheduled(_))),
            "root scheduled"
        );
        let phases: Vec<PhaseKind> = events
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::PhaseBegin(b) => Some(b.phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases, [PhaseKind::Render, PhaseKind::Mutation]);
        let summary = events.iter().find_map(|e| match e {
            RecordedEvent::CommitSummary(s) => Some(*s),
            _ => None,
        });
        let summary = summary.expect("a commit summary");
        assert_eq!(summary.commit_index, 0);
        assert_eq!(summary.placements, 1, "the list mounts as one placement");
        assert_eq!(summary.slices, 1);
        assert!(events.iter().any(|e| matches!(
            e,
            RecordedEvent::FiberMutationsCount { count: 1, .. }
        )));
    }
}
