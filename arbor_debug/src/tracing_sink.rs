// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bridge from [`TraceSink`] to the [`tracing`] ecosystem.
//!
//! [`TracingSink`] forwards every event as a structured `tracing` event
//! under the `arbor` target. Task transitions and phase boundaries are
//! logged at `TRACE`, root scheduling and fiber mutations at `DEBUG`, and
//! commit summaries at `INFO`, so a subscriber filtering at `info` sees one
//! line per commit.

use arbor_core::trace::{
    CommitSummary, FiberMutation, PhaseBeginEvent, PhaseEndEvent, RootScheduledEvent, TaskEvent,
    TraceSink,
};

/// A [`TraceSink`] that emits `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Creates the bridge.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl TraceSink for TracingSink {
    fn on_task(&mut self, e: &TaskEvent) {
        tracing::trace!(
            target: "arbor",
            task = e.task.0,
            kind = e.kind.as_str(),
            priority = e.priority.as_str(),
            at_us = e.timestamp.ticks(),
            "task"
        );
    }

    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        tracing::debug!(
            target: "arbor",
            root = e.root.index(),
            lanes = ?e.lanes,
            priority = e.priority.as_str(),
            replaced = e.replaced,
            "root scheduled"
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        tracing::trace!(
            target: "arbor",
            root = e.root.index(),
            phase = e.phase.as_str(),
            lanes = ?e.lanes,
            at_us = e.timestamp.ticks(),
            "phase begin"
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        tracing::trace!(
            target: "arbor",
            root = e.root.index(),
            phase = e.phase.as_str(),
            at_us = e.timestamp.ticks(),
            "phase end"
        );
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        tracing::info!(
            target: "arbor",
            root = s.root,
            commit = s.commit_index,
            lanes = ?s.lanes,
            placements = s.placements,
            updates = s.updates,
            deletions = s.deletions,
            render_us = s.render_ticks,
            commit_us = s.commit_ticks,
            slices = s.slices,
            "commit"
        );
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        for m in mutations {
            tracing::debug!(
                target: "arbor",
                commit = commit_index,
                kind = ?m.kind,
                fiber = ?m.fiber,
                instance = ?m.instance,
                "fiber mutation"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use arbor_core::element::el;
    use arbor_harness::Harness;

    use super::*;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn commits_reach_a_tracing_subscriber() {
        let buffer = Buffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut h = Harness::with_sink(TracingSink::new());
            h.mount(el("p").child("hi"));
            h.run_until_idle().unwrap();
        });

        let out = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert!(out.contains("arbor"), "target is logged: {out}");
        assert!(out.contains("commit"), "got: {out}");
        assert!(out.contains("placements=1"), "got: {out}");
        assert!(!out.contains("phase begin"), "trace level is filtered out: {out}");
    }
}
