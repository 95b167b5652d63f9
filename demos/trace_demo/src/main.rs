// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drives a keyed list through the harness and exercises the diagnostics
//! pipeline.
//!
//! The list is mounted, reversed, relabelled in place, then grown inside a
//! transition so the render is time-sliced. Every event goes to a
//! [`RecorderSink`] and, depending on the flags, to a [`PrettyPrintSink`] on
//! stderr or to a `tracing` subscriber through [`TracingSink`]. The
//! recording is exported as a Chrome trace at the end.
//!
//! ```text
//! trace_demo [OUT.json] [--tracing] [--verbose]
//! ```

use std::error::Error;
use std::fs::File;
use std::io::BufWriter;

use arbor_core::element::{Component, Memo, Node, Value, el};
use arbor_core::host::ManualLoop;
use arbor_core::renderer::RendererConfig;
use arbor_core::time::Duration;
use arbor_core::trace::{
    CommitSummary, FiberMutation, PhaseBeginEvent, PhaseEndEvent, RootScheduledEvent, TaskEvent,
    TraceSink,
};
use arbor_debug::pretty::PrettyPrintSink;
use arbor_debug::recorder::RecorderSink;
use arbor_debug::tracing_sink::TracingSink;
use arbor_harness::Harness;
use tracing_subscriber::filter::LevelFilter;

/// Virtual cost of every clock read, so render work appears to take time.
const CLOCK_STEP: Duration = Duration::from_micros(150);

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Echo {
    Pretty(PrettyPrintSink),
    Tracing(TracingSink),
}

impl Echo {
    fn sink(&mut self) -> &mut dyn TraceSink {
        match self {
            Self::Pretty(s) => s,
            Self::Tracing(s) => s,
        }
    }
}

/// Records every event and echoes it to a human-readable destination.
#[derive(Debug)]
struct DemoSink {
    recorder: RecorderSink,
    echo: Echo,
}

impl TraceSink for DemoSink {
    fn on_task(&mut self, e: &TaskEvent) {
        self.recorder.on_task(e);
        self.echo.sink().on_task(e);
    }

    fn on_root_scheduled(&mut self, e: &RootScheduledEvent) {
        self.recorder.on_root_scheduled(e);
        self.echo.sink().on_root_scheduled(e);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.recorder.on_phase_begin(e);
        self.echo.sink().on_phase_begin(e);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.recorder.on_phase_end(e);
        self.echo.sink().on_phase_end(e);
    }

    fn on_commit_summary(&mut self, s: &CommitSummary) {
        self.recorder.on_commit_summary(s);
        self.echo.sink().on_commit_summary(s);
    }

    fn on_fiber_mutations(&mut self, commit_index: u64, mutations: &[FiberMutation]) {
        self.recorder.on_fiber_mutations(commit_index, mutations);
        self.echo.sink().on_fiber_mutations(commit_index, mutations);
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

fn row() -> Memo {
    Memo::new(Component::new("Row", |_, props| {
        let label = props
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        Ok(el("li").child(label).into_node())
    }))
}

fn list(row: &Memo, ids: &[u32], suffix: &str) -> Node {
    el("ul")
        .prop("id", "list")
        .children(ids.iter().map(|id| {
            row.element()
                .key(format!("row-{id}"))
                .prop("label", format!("item {id}{suffix}"))
        }))
        .into_node()
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn Error>> {
    let mut out_path = String::from("trace.json");
    let mut use_tracing = false;
    let mut verbose = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--tracing" => use_tracing = true,
            "--verbose" => verbose = true,
            _ => out_path = arg,
        }
    }

    let echo = if use_tracing {
        tracing_subscriber::fmt()
            .with_max_level(if verbose {
                LevelFilter::TRACE
            } else {
                LevelFilter::DEBUG
            })
            .with_writer(std::io::stderr)
            .init();
        Echo::Tracing(TracingSink::new())
    } else {
        Echo::Pretty(PrettyPrintSink::stderr().verbose(verbose))
    };
    let sink = DemoSink {
        recorder: RecorderSink::new(),
        echo,
    };

    let mut h = Harness::with_config(
        RendererConfig::DEFAULT,
        ManualLoop::with_auto_advance(CLOCK_STEP),
        sink,
    );
    let row = row();
    let mut ids: Vec<u32> = (0..40).collect();

    // 1. Mount.
    let root = h.act(|h| h.mount(list(&row, &ids, "")))?;

    // 2. Reverse the keys; every row is moved, none is recreated.
    ids.reverse();
    h.act(|h| h.render(list(&row, &ids, "")))??;

    // 3. Relabel in place.
    h.act(|h| h.render(list(&row, &ids, "*")))??;

    // 4. Grow the list inside a transition; the render yields between slices.
    ids.extend(40..400);
    let updates = h.renderer().updates();
    updates.start_transition(|| h.render(list(&row, &ids, "*")))?;
    let steps = h.run_until_idle()?;

    let report = h.slice_report();
    println!(
        "commits: {}  transition steps: {steps}  host nodes: {}",
        h.renderer().commit_count(root).unwrap_or_default(),
        h.renderer().host().live_count(),
    );
    println!(
        "slices: {} ({} yielded, {} overruns)  longest {:.3}ms  grade {}",
        report.total_slices,
        report.yielded_slices,
        report.overruns,
        report.longest_ms,
        report.grade.as_str(),
    );
    println!("recent: [{}]", h.slices().sparkline_ascii());

    h.unmount()?;

    let file = File::create(&out_path)?;
    let mut writer = BufWriter::new(file);
    arbor_debug::chrome::export(h.renderer().sink().recorder.as_bytes(), &mut writer)?;
    println!("Wrote {out_path}");
    Ok(())
}
