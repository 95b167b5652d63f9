// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deterministic driver for tests and demos.
//!
//! [`Harness`] owns a [`Renderer`] over a [`MemoryHost`] and a [`ManualLoop`],
//! with one container to mount into. It answers the messages the scheduler
//! posts one at a time, measures each answered slice on the virtual clock,
//! and feeds the measurements to a [`SliceTracker`].
//!
//! ```
//! use arbor_core::element::el;
//! use arbor_harness::Harness;
//!
//! let mut h = Harness::new();
//! h.mount(el("p").child("hi"));
//! h.run_until_idle().unwrap();
//! assert_eq!(h.markup(), "<p>hi</p>");
//! ```

#![no_std]

extern crate alloc;

mod slices;

pub use slices::{SliceGrade, SliceReport, SliceSample, SliceTracker};

use alloc::rc::Rc;
use alloc::string::String;

use arbor_core::element::{Node, Value};
use arbor_core::error::Error;
use arbor_core::host::{InstanceId, ManualLoop, MemoryHost};
use arbor_core::priority::InputCategory;
use arbor_core::renderer::{Renderer, RendererConfig};
use arbor_core::root::RootId;
use arbor_core::time::Duration;
use arbor_core::trace::{NoopSink, TraceSink};

/// Number of slices the harness keeps in its rolling window.
pub const SLICE_WINDOW: usize = 32;

/// A renderer wired to an in-memory host and a manual event loop.
#[derive(Debug)]
pub struct Harness<S: TraceSink = NoopSink> {
    renderer: Renderer<MemoryHost, S>,
    host_loop: ManualLoop,
    container: InstanceId,
    root: Option<RootId>,
    slices: SliceTracker<SLICE_WINDOW>,
}

impl Harness {
    /// Creates a harness with the default configuration and no tracing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sink(NoopSink)
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TraceSink> Harness<S> {
    /// Creates a harness that reports to `sink`.
    #[must_use]
    pub fn with_sink(sink: S) -> Self {
        Self::with_config(RendererConfig::DEFAULT, ManualLoop::new(), sink)
    }

    /// Creates a harness with an explicit configuration and loop, for
    /// example one built with [`ManualLoop::with_auto_advance`].
    #[must_use]
    pub fn with_config(config: RendererConfig, host_loop: ManualLoop, sink: S) -> Self {
        let mut host = MemoryHost::new();
        let container = host.create_container();
        let renderer = Renderer::with_sink(host, Rc::new(host_loop.clone()), config, sink);
        Self {
            renderer,
            host_loop,
            container,
            root: None,
            slices: SliceTracker::new(config.scheduler.frame_interval),
        }
    }

    // -- Tree --

    /// Mounts `node` into the harness container. Nothing renders until the
    /// posted message is answered.
    pub fn mount(&mut self, node: impl Into<Node>) -> RootId {
        let root = self.renderer.mount(self.container, node);
        self.root = Some(root);
        root
    }

    /// Schedules `node` to replace the mounted tree.
    pub fn render(&mut self, node: impl Into<Node>) -> Result<(), Error> {
        let root = self.root()?;
        self.renderer.render(root, node)
    }

    /// Unmounts the tree synchronously.
    pub fn unmount(&mut self) -> Result<(), Error> {
        let root = self.root()?;
        self.root = None;
        self.renderer.unmount(root)
    }

    fn root(&self) -> Result<RootId, Error> {
        // Nothing is mounted; no renderer ever issues this id.
        self.root.ok_or(Error::StaleRoot(RootId::from_index(u32::MAX)))
    }

    // -- Driving --

    /// Answers one posted message. Returns `Ok(false)` if none was pending.
    pub fn step(&mut self) -> Result<bool, Error> {
        if !self.host_loop.take_message() {
            return Ok(false);
        }
        let start = self.host_loop.peek_now();
        let result = self.renderer.perform_work_until_deadline();
        let duration = self.host_loop.peek_now().saturating_duration_since(start);
        let _ = self.slices.observe(SliceSample {
            duration,
            yielded: matches!(result, Ok(true)),
        });
        result.map(|_| true)
    }

    /// Answers posted messages until none are left. Every message is
    /// answered; the first error is returned at the end.
    pub fn run_until_idle(&mut self) -> Result<u32, Error> {
        let mut steps = 0;
        let mut first = Ok(());
        loop {
            match self.step() {
                Ok(true) => steps += 1,
                Ok(false) => break,
                Err(err) => {
                    steps += 1;
                    first = first.and(Err(err));
                }
            }
        }
        first.map(|()| steps)
    }

    /// Runs `f`, then answers every message it caused.
    pub fn act<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> Result<R, Error> {
        let out = f(self);
        self.run_until_idle()?;
        Ok(out)
    }

    /// Moves the virtual clock forward and fires the scheduler timer if it
    /// came due.
    pub fn advance(&mut self, by: Duration) {
        self.host_loop.advance(by);
        if self.host_loop.take_due_timer() {
            self.renderer.handle_timeout();
        }
    }

    // -- Events --

    /// Finds the first element whose attribute `key` equals `value`.
    #[must_use]
    pub fn find(&self, key: &str, value: impl Into<Value>) -> Option<InstanceId> {
        self.renderer
            .host()
            .find_by_prop(self.container, key, &value.into())
    }

    /// Invokes the handler `event` of `instance` with `payload`, at the
    /// priority the event name implies. Returns `Ok(false)` if the instance
    /// has no such handler.
    pub fn fire(
        &mut self,
        instance: InstanceId,
        event: &str,
        payload: impl Into<Value>,
    ) -> Result<bool, Error> {
        let Some(handler) = self.renderer.host().handler(instance, event) else {
            return Ok(false);
        };
        let category = InputCategory::from_event_name(event);
        self.renderer
            .dispatch_event(category, &[handler], &payload.into())?;
        Ok(true)
    }

    // -- Access --

    /// Markup of the container's children.
    #[must_use]
    pub fn markup(&self) -> String {
        self.renderer.host().markup(self.container)
    }

    /// The container instance.
    #[must_use]
    pub const fn container(&self) -> InstanceId {
        self.container
    }

    /// The mounted root, if any.
    #[must_use]
    pub const fn mounted_root(&self) -> Option<RootId> {
        self.root
    }

    /// The renderer.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer<MemoryHost, S> {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut Renderer<MemoryHost, S> {
        &mut self.renderer
    }

    /// The host, mutably, for draining recorded operations.
    pub fn host_mut(&mut self) -> &mut MemoryHost {
        self.renderer.host_mut()
    }

    /// The event loop.
    #[must_use]
    pub const fn host_loop(&self) -> &ManualLoop {
        &self.host_loop
    }

    /// Slice measurements so far.
    #[must_use]
    pub fn slice_report(&self) -> SliceReport {
        self.slices.report()
    }

    /// The slice tracker.
    #[must_use]
    pub const fn slices(&self) -> &SliceTracker<SLICE_WINDOW> {
        &self.slices
    }
}
