// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Host times
//! are printed in milliseconds.

use std::io::Write;

use arbor_core::time::HostTime;
use arbor_core::trace::{
    CommitSummary, FiberMutation, PhaseBeginEvent, PhaseEndEvent, RootScheduledEvent, TaskEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    verbose: bool,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self::with_writer(writer)
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            verbose: false,
        }
    }

    /// Also prints one line per fiber mutation instead of a count.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(t: HostTime) -> f64 {
    ticks_ms(t.ticks())
}

fn ticks_ms(ticks: u64) -> f64 {
    ticks as f64 / 1000.0
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_task(&mut self, e: &TaskEvent) {
        let _ = writeln!(
            self.writer,
            "[task] {:?} {} {} at {:.3}ms",
            e.task,
            e.kind.as_str(),
            e.priority.as_str(),
            ms(e.timestamp),
        );
    }

    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        let replaced = if e.replaced { " (replaced)" } else { "" };
        let _ = writeln!(
            self.writer,
            "[schedule] root={} lanes={:?} priority={}{replaced}",
            e.root.index(),
            e.lanes,
            e.priority.as_str(),
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] root={} {} lanes={:?} at {:.3}ms",
            e.root.index(),
            e.phase.as_str(),
            e.lanes,
            ms(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] root={} {} at {:.3}ms",
            e.root.index(),
            e.phase.as_str(),
            ms(e.timestamp),
        );
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        let _ = writeln!(
            self.writer,
            "[commit] root={} #{} lanes={:?} placed={} updated={} deleted={} \
             render={:.3}ms slices={} commit={:.3}ms",
            s.root,
            s.commit_index,
            s.lanes,
            s.placements,
            s.updates,
            s.deletions,
            ticks_ms(s.render_ticks),
            s.slices,
            ticks_ms(s.commit_ticks),
        );
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        if !self.verbose {
            let _ = writeln!(
                self.writer,
                "[mutations] commit={commit_index} count={}",
                mutations.len(),
            );
            return;
        }
        for m in mutations {
            let _ = writeln!(
                self.writer,
                "[mutation] commit={commit_index} {:?} {:?} instance={:?}",
                m.kind, m.fiber, m.instance,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_core::lane::Lanes;
    use arbor_core::root::RootId;
    use arbor_core::scheduler::{PriorityLevel, TaskId};
    use arbor_core::trace::{PhaseKind, TaskEventKind};

    fn output(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn task_lines_name_kind_and_priority() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_task(&TaskEvent {
            task: TaskId(4),
            kind: TaskEventKind::Started,
            priority: PriorityLevel::Normal,
            timestamp: HostTime(1_500),
        });
        let out = output(sink);
        assert!(out.starts_with("[task]"), "got: {out}");
        assert!(out.contains("started normal at 1.500ms"), "got: {out}");
    }

    #[test]
    fn phase_lines_carry_the_root() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_phase_begin(&PhaseBeginEvent {
            root: RootId::from_index(2),
            lanes: Lanes::DEFAULT,
            phase: PhaseKind::Render,
            timestamp: HostTime::ZERO,
        });
        let out = output(sink);
        assert!(out.contains("root=2 render"), "got: {out}");
    }

    #[test]
    fn commit_summary_line() {
        let mut sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_commit_summary(&CommitSummary {
            placements: 3,
            slices: 2,
            ..CommitSummary::default()
        });
        let out = output(sink);
        assert!(out.contains("placed=3"), "got: {out}");
        assert!(out.contains("slices=2"), "got: {out}");
    }
}
