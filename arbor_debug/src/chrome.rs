// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Each root gets its own track (`tid` = root index); scheduler task events
//! go to track `0` of a separate `Scheduler` process so that slices and
//! yields line up against the render phases they drove.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

const PID_RENDERER: u32 = 1;
const PID_SCHEDULER: u32 = 2;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Host times are already in microseconds, the unit the format expects.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Instant events without their own timestamp are placed at the last
    // time seen.
    let mut last_ts = 0_u64;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Task(e) => {
                last_ts = e.timestamp.ticks();
                events.push(json!({
                    "ph": "i",
                    "name": format!("task {}", e.kind.as_str()),
                    "cat": "Scheduler",
                    "ts": last_ts,
                    "pid": PID_SCHEDULER,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "task": e.task.0,
                        "priority": e.priority.as_str(),
                    }
                }));
            }
            RecordedEvent::RootScheduled(e) => {
                last_ts = e.timestamp.ticks();
                events.push(json!({
                    "ph": "i",
                    "name": "RootScheduled",
                    "cat": "Scheduler",
                    "ts": last_ts,
                    "pid": PID_RENDERER,
                    "tid": e.root.index(),
                    "s": "t",
                    "args": {
                        "lanes": format!("{:?}", e.lanes),
                        "priority": e.priority.as_str(),
                        "replaced": e.replaced,
                    }
                }));
            }
            RecordedEvent::PhaseBegin(e) => {
                last_ts = e.timestamp.ticks();
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.as_str(),
                    "cat": "Commit",
                    "ts": last_ts,
                    "pid": PID_RENDERER,
                    "tid": e.root.index(),
                    "args": {
                        "lanes": format!("{:?}", e.lanes),
                    }
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last_ts = e.timestamp.ticks();
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.as_str(),
                    "cat": "Commit",
                    "ts": last_ts,
                    "pid": PID_RENDERER,
                    "tid": e.root.index(),
                }));
            }
            RecordedEvent::CommitSummary(s) => {
                events.push(json!({
                    "ph": "i",
                    "name": "CommitSummary",
                    "cat": "Summary",
                    "ts": last_ts,
                    "pid": PID_RENDERER,
                    "tid": s.root,
                    "s": "t",
                    "args": {
                        "commit_index": s.commit_index,
                        "lanes": format!("{:?}", s.lanes),
                        "placements": s.placements,
                        "updates": s.updates,
                        "deletions": s.deletions,
                        "render_us": s.render_ticks,
                        "commit_us": s.commit_ticks,
                        "slices": s.slices,
                    }
                }));
            }
            RecordedEvent::FiberMutationsCount {
                commit_index,
                count,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "FiberMutations",
                    "cat": "Rich",
                    "ts": last_ts,
                    "pid": PID_RENDERER,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "commit_index": commit_index,
                        "count": count,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use arbor_core::element::el;
    use arbor_core::lane::Lanes;
    use arbor_core::root::RootId;
    use arbor_core::time::HostTime;
    use arbor_core::trace::{PhaseBeginEvent, PhaseEndEvent, PhaseKind, TraceSink};
    use arbor_harness::Harness;

    fn parse(out: Vec<u8>) -> Vec<Value> {
        let json_str = String::from_utf8(out).unwrap();
        serde_json::from_str(&json_str).unwrap()
    }

    #[test]
    fn phases_become_duration_events() {
        let mut rec = RecorderSink::new();
        let root = RootId::from_index(3);
        rec.on_phase_begin(&PhaseBeginEvent {
            root,
            lanes: Lanes::DEFAULT,
            phase: PhaseKind::Render,
            timestamp: HostTime(1_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            root,
            lanes: Lanes::DEFAULT,
            phase: PhaseKind::Render,
            timestamp: HostTime(1_250),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed = parse(out);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0]["ph"], "B");
        assert_eq!(parsed[0]["name"], "render");
        assert_eq!(parsed[0]["tid"], 3);
        assert_eq!(parsed[1]["ph"], "E");
        assert_eq!(parsed[1]["ts"], 1_250);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        assert!(parse(out).is_empty());
    }

    #[test]
    fn a_full_mount_exports_balanced_phases() {
        let mut h = Harness::with_sink(RecorderSink::new());
        h.mount(el("div").child(el("span").child("x")));
        h.run_until_idle().unwrap();

        let mut out = Vec::new();
        export(h.renderer().sink().as_bytes(), &mut out).unwrap();
        let parsed = parse(out);
        let count = |ph: &str| parsed.iter().filter(|e| e["ph"] == ph).count();
        assert_eq!(count("B"), count("E"), "every phase that begins ends");
        assert!(
            parsed.iter().any(|e| e["name"] == "CommitSummary"),
            "summary exported"
        );
    }
}
