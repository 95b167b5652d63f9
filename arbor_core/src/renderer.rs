// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The renderer: roots, root scheduling, and the render and commit drivers.
//!
//! A [`Renderer`] owns the fiber arena, the host, and a [`Scheduler`] whose
//! tasks are either a render of one root or a flush of deferred passive
//! effects. Updates reach it through the shared update inbox (see
//! [`updates`](crate::updates)); every entry point drains the inbox, marks
//! the updated lanes on the fibers and roots, and makes sure each root with
//! pending lanes has exactly one render task at the priority of its most
//! urgent lane.
//!
//! ## Rendering a root
//!
//! A render task picks the lanes to work on with
//! [`get_next_lanes`](crate::lane::get_next_lanes). If a render of the same
//! root and lanes is already in progress it resumes from the saved unit of
//! work; otherwise the in-progress tree is discarded and a fresh one is
//! started from the root. Units of work are performed one at a time. Renders
//! of non-blocking lanes (transitions, idle) check
//! [`Scheduler::should_yield_to_host`] between units and return a
//! continuation when the slice is used up; blocking lanes and expired tasks
//! run to completion.
//!
//! A finished tree is committed right away. A render error discards the
//! work-in-progress tree and drops the lanes it was rendering; the
//! committed tree stays as it was and the error is returned from the entry
//! point that drove the render.
//!
//! ## Driving the renderer
//!
//! The host answers each message posted through
//! [`HostLoop::request_callback`] by calling
//! [`perform_work_until_deadline`](Renderer::perform_work_until_deadline),
//! and each fired timer by calling [`handle_timeout`](Renderer::handle_timeout).
//! [`run_until_idle`](Renderer::run_until_idle) does the same in a loop
//! until no work is left, ignoring time slices.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use crate::commit::{CommitPass, PassiveBatch};
use crate::context::ContextStack;
use crate::element::{Callback, Node, Value};
use crate::error::Error;
use crate::fiber::{FiberState, FiberStore, INVALID, StateNode};
use crate::guard::GuardedBatch;
use crate::host::{Host, HostLoop, InstanceId};
use crate::lane::{Lane, Lanes, get_next_lanes};
use crate::priority::{EventPriority, InputCategory, scheduler_priority_for_lanes};
use crate::root::{FiberRoot, RootId};
use crate::scheduler::{PriorityLevel, RunningTask, Scheduler, SchedulerConfig, TaskId, TaskRunner};
use crate::trace::{
    CommitSummaryBuilder, NoopSink, PhaseBeginEvent, PhaseEndEvent, PhaseKind,
    RootScheduledEvent, TaskEvent, TaskEventKind, TraceSink, Tracer,
};
use crate::update_queue::{AnyRc, QueueState, Update};
use crate::updates::{RendererScope, ScheduledUpdate, UpdateContext, Updates};
use crate::work::RenderPass;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for a [`Renderer`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    /// Scheduler time slice and priority timeouts.
    pub scheduler: SchedulerConfig,
    /// Priority of the task that flushes passive effects after a commit.
    pub passive_priority: PriorityLevel,
}

impl RendererConfig {
    /// Default scheduler settings; passive effects at normal priority.
    pub const DEFAULT: Self = Self {
        scheduler: SchedulerConfig::DEFAULT,
        passive_priority: PriorityLevel::Normal,
    };

    /// Returns the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Returns a copy with different scheduler settings.
    #[must_use]
    pub const fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Returns a copy with a different passive-effect priority.
    #[must_use]
    pub const fn with_passive_priority(mut self, priority: PriorityLevel) -> Self {
        self.passive_priority = priority;
        self
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Payload of a renderer task.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Job {
    /// Render (or continue rendering) a root.
    Render(RootId),
    /// Flush the passive effects of the last commit.
    Passive(RootId),
}

/// A render in progress.
#[derive(Debug)]
struct WorkInProgress {
    root: RootId,
    /// The work-in-progress host-root fiber.
    root_fiber: u32,
    lanes: Lanes,
    /// Next unit of work, or `INVALID` once the tree is complete.
    next_unit: u32,
    builder: CommitSummaryBuilder,
}

/// Everything but the scheduler, so the scheduler can hand itself to the
/// task runner.
struct RendererState<H: Host, S: TraceSink> {
    host: H,
    sink: S,
    config: RendererConfig,
    fibers: FiberStore,
    roots: BTreeMap<RootId, FiberRoot>,
    next_root: u32,
    updates: Rc<UpdateContext>,
    contexts: ContextStack,
    wip: Option<WorkInProgress>,
    pending_passive: Option<PassiveBatch>,
    errors: GuardedBatch<Error>,
}

/// Reconciles element trees into a [`Host`].
///
/// `S` receives trace events; it defaults to [`NoopSink`].
///
/// At most one render is in progress at a time, across all roots. Starting
/// a render on another root (a discrete update flushed mid-transition, say)
/// discards the suspended one, and its root starts over from the committed
/// tree when its task next runs.
pub struct Renderer<H: Host, S: TraceSink = NoopSink> {
    scheduler: Scheduler<Job>,
    state: RendererState<H, S>,
}

impl<H: Host, S: TraceSink> fmt::Debug for Renderer<H, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("scheduler", &self.scheduler)
            .field("roots", &self.state.roots.len())
            .field("fibers", &self.state.fibers)
            .field("wip", &self.state.wip)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Renderer<H> {
    /// Creates a renderer with the default configuration and no tracing.
    #[must_use]
    pub fn new(host: H, host_loop: Rc<dyn HostLoop>) -> Self {
        Self::with_sink(host, host_loop, RendererConfig::DEFAULT, NoopSink)
    }
}

impl<H: Host, S: TraceSink> Renderer<H, S> {
    /// Creates a renderer that reports to `sink`.
    #[must_use]
    pub fn with_sink(host: H, host_loop: Rc<dyn HostLoop>, config: RendererConfig, sink: S) -> Self {
        let updates = Rc::new(UpdateContext::new(host_loop.clone()));
        Self {
            scheduler: Scheduler::new(config.scheduler, host_loop),
            state: RendererState {
                host,
                sink,
                config,
                fibers: FiberStore::new(),
                roots: BTreeMap::new(),
                next_root: 0,
                updates,
                contexts: ContextStack::default(),
                wip: None,
                pending_passive: None,
                errors: GuardedBatch::new(),
            },
        }
    }

    // -- Roots --

    /// Creates a root in `container` and schedules `node` to render into
    /// it.
    pub fn mount(&mut self, container: InstanceId, node: impl Into<Node>) -> RootId {
        let state = &mut self.state;
        let id = RootId::new(state.next_root);
        state.next_root += 1;
        let fiber = state.fibers.create_host_root(id);
        let root = FiberRoot::new(container, fiber);
        let initial: AnyRc = Rc::new(Node::Empty);
        state.fibers.memoized_state[fiber as usize] =
            FiberState::Root(QueueState::with_queue(initial, root.queue.clone()));
        state.roots.insert(id, root);

        let scope = RendererScope::enter(&state.updates);
        let lane = state.updates.request_update_lane();
        state.enqueue_root(id, lane, node.into());
        state.process_inbox(&mut self.scheduler);
        drop(scope);
        id
    }

    /// Schedules `node` to replace the element tree of `root`.
    ///
    /// The update lane follows the dispatch site: a transition inside
    /// [`start_transition`](Self::start_transition), the event's lane inside
    /// [`dispatch_event`](Self::dispatch_event), and the default lane
    /// otherwise.
    pub fn render(&mut self, root: RootId, node: impl Into<Node>) -> Result<(), Error> {
        if !self.is_mounted(root) {
            return Err(Error::StaleRoot(root));
        }
        let scope = RendererScope::enter(&self.state.updates);
        let lane = self.state.updates.request_update_lane();
        self.state.enqueue_root(root, lane, node.into());
        self.state.process_inbox(&mut self.scheduler);
        drop(scope);
        Ok(())
    }

    /// Unmounts `root` synchronously.
    ///
    /// Every host node is removed from the container, every cleanup runs,
    /// and the root handle becomes stale.
    pub fn unmount(&mut self, root: RootId) -> Result<(), Error> {
        let Some(r) = self.state.roots.get_mut(&root).filter(|r| !r.unmounting) else {
            return Err(Error::StaleRoot(root));
        };
        r.unmounting = true;
        let scope = RendererScope::enter(&self.state.updates);
        self.state.enqueue_root(root, Lanes::SYNC, Node::Empty);
        self.state.process_inbox(&mut self.scheduler);
        self.state.perform_work_on_root(&mut self.scheduler, root, false);
        // The root is gone, so nothing else can flush its effects.
        self.state.flush_pending_passive(&mut self.scheduler);
        self.state.process_inbox(&mut self.scheduler);
        drop(scope);
        self.state.take_error()
    }

    /// Returns `true` if `root` is mounted and not being unmounted.
    #[must_use]
    pub fn is_mounted(&self, root: RootId) -> bool {
        self.state.roots.get(&root).is_some_and(|r| !r.unmounting)
    }

    /// Host container of `root`.
    #[must_use]
    pub fn container(&self, root: RootId) -> Option<InstanceId> {
        self.state.roots.get(&root).map(|r| r.container)
    }

    /// Lanes with outstanding work on `root`.
    #[must_use]
    pub fn pending_lanes(&self, root: RootId) -> Option<Lanes> {
        self.state.roots.get(&root).map(|r| r.pending_lanes)
    }

    /// Number of commits `root` has seen.
    #[must_use]
    pub fn commit_count(&self, root: RootId) -> Option<u64> {
        self.state.roots.get(&root).map(|r| r.commit_count)
    }

    // -- Driving --

    /// Handles a message posted through [`HostLoop::request_callback`]:
    /// runs scheduled tasks until the time slice is used up.
    ///
    /// Returns whether more work is pending, or the first error raised by a
    /// render, an effect, or a cleanup during the slice.
    pub fn perform_work_until_deadline(&mut self) -> Result<bool, Error> {
        let scope = RendererScope::enter(&self.state.updates);
        self.state.process_inbox(&mut self.scheduler);
        let more = self.scheduler.perform_work_until_deadline(&mut self.state);
        self.state.process_inbox(&mut self.scheduler);
        drop(scope);
        self.state.take_error()?;
        Ok(more || self.scheduler.is_message_loop_running())
    }

    /// Handles the timer armed through [`HostLoop::request_timeout`].
    pub fn handle_timeout(&mut self) {
        self.scheduler.handle_timeout();
    }

    /// Runs until no ready work is left, ignoring time slices.
    ///
    /// Every task runs; the first error is returned at the end.
    pub fn run_until_idle(&mut self) -> Result<(), Error> {
        let scope = RendererScope::enter(&self.state.updates);
        loop {
            self.state.process_inbox(&mut self.scheduler);
            if !self.scheduler.is_message_loop_running() {
                break;
            }
            self.scheduler.perform_work_until_deadline(&mut self.state);
        }
        drop(scope);
        self.state.take_error()
    }

    /// Runs the passive effects of the last commit now, if any are
    /// pending. Returns whether there were any.
    pub fn flush_passive_effects(&mut self) -> Result<bool, Error> {
        let scope = RendererScope::enter(&self.state.updates);
        let flushed = self.state.flush_pending_passive(&mut self.scheduler);
        self.state.process_inbox(&mut self.scheduler);
        drop(scope);
        self.state.take_error()?;
        Ok(flushed)
    }

    /// Returns `true` while any task is scheduled.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.scheduler.has_pending_work() || self.state.updates.has_pending()
    }

    // -- Updates --

    /// Invokes `handlers` with `event` as one batch at the priority of
    /// `category`.
    ///
    /// Every handler runs even if an earlier one fails; the first error is
    /// returned. Updates dispatched by the handlers get the lane of the
    /// event priority, and after a discrete event synchronous work is
    /// rendered and committed before this returns.
    pub fn dispatch_event(
        &mut self,
        category: InputCategory,
        handlers: &[Callback],
        event: &Value,
    ) -> Result<(), Error> {
        let scope = RendererScope::enter(&self.state.updates);
        let priority = category.event_priority();
        let mut batch = GuardedBatch::new();
        self.state.updates.with_priority(priority, || {
            for handler in handlers {
                batch.invoke(|| handler.call(event).map_err(Error::from));
            }
        });
        self.state.errors.absorb(batch);
        self.state.process_inbox(&mut self.scheduler);
        if priority == EventPriority::Discrete {
            self.state.flush_sync_work(&mut self.scheduler);
        }
        drop(scope);
        self.state.take_error()
    }

    /// Runs `f` so that the updates it dispatches are transitions.
    pub fn start_transition<R>(&self, f: impl FnOnce() -> R) -> R {
        self.state.updates.start_transition(f)
    }

    /// A handle for prioritizing updates from outside the renderer.
    #[must_use]
    pub fn updates(&self) -> Updates {
        Updates(self.state.updates.clone())
    }

    // -- Access --

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.state.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.state.host
    }

    /// The trace sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.state.sink
    }

    /// The trace sink, mutably.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.state.sink
    }

    /// Number of live fibers across all roots, both generations.
    #[must_use]
    pub fn fiber_count(&self) -> usize {
        self.state.fibers.live_count()
    }

    /// The scheduler's clock.
    #[must_use]
    pub fn now(&self) -> crate::time::HostTime {
        self.scheduler.now()
    }
}

// ---------------------------------------------------------------------------
// Task running
// ---------------------------------------------------------------------------

impl<H: Host, S: TraceSink> TaskRunner<Job> for RendererState<H, S> {
    fn run_task(&mut self, scheduler: &mut Scheduler<Job>, task: RunningTask<Job>) -> Option<Job> {
        let RunningTask {
            id,
            priority,
            did_timeout,
            callback,
        } = task;
        self.trace_task(scheduler, id, TaskEventKind::Started, priority);
        let continuation = match callback {
            Job::Render(root) => {
                self.perform_work_on_root(scheduler, root, !did_timeout);
                self.process_inbox(scheduler);
                self.ensure_root_is_scheduled(scheduler, root);
                self.roots
                    .get(&root)
                    .filter(|r| r.callback_task == Some(id))
                    .map(|_| Job::Render(root))
            }
            Job::Passive(_) => {
                self.flush_pending_passive(scheduler);
                self.process_inbox(scheduler);
                None
            }
        };
        let kind = if continuation.is_some() {
            TaskEventKind::Yielded
        } else {
            TaskEventKind::Completed
        };
        self.trace_task(scheduler, id, kind, priority);
        continuation
    }
}

impl<H: Host, S: TraceSink> RendererState<H, S> {
    fn tracer(&mut self) -> Tracer<'_> {
        Tracer::new(&mut self.sink)
    }

    fn trace_task(
        &mut self,
        scheduler: &Scheduler<Job>,
        task: TaskId,
        kind: TaskEventKind,
        priority: PriorityLevel,
    ) {
        let e = TaskEvent {
            task,
            kind,
            priority,
            timestamp: scheduler.now(),
        };
        self.tracer().task(&e);
    }

    fn take_error(&mut self) -> Result<(), Error> {
        match self.errors.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    // -- Inbox --

    fn enqueue_root(&mut self, root: RootId, lane: Lane, node: Node) {
        let Some(r) = self.roots.get(&root) else {
            return;
        };
        r.queue.push(Update {
            lane,
            action: Rc::new(node),
        });
        self.updates.schedule(ScheduledUpdate::Root(root, lane));
    }

    /// Marks the lanes of every recorded update and schedules the roots
    /// they reach.
    fn process_inbox(&mut self, scheduler: &mut Scheduler<Job>) {
        loop {
            let pending = self.updates.take_pending();
            if pending.is_empty() {
                return;
            }
            let mut touched: Vec<RootId> = Vec::new();
            for update in pending {
                let (root, lane) = match update {
                    ScheduledUpdate::Fiber(id, lane) => {
                        // Updates to unmounted fibers are dropped.
                        let Some(fiber) = self.fibers.resolve(id) else {
                            continue;
                        };
                        let Some(host_root) = self.fibers.mark_update_lane_from_fiber_to_root(fiber, lane)
                        else {
                            continue;
                        };
                        let StateNode::Root(root) = self.fibers.state_node[host_root as usize] else {
                            continue;
                        };
                        (root, lane)
                    }
                    ScheduledUpdate::Root(root, lane) => {
                        let Some(r) = self.roots.get(&root) else {
                            continue;
                        };
                        let current = r.current;
                        self.fibers.lanes[current as usize] |= lane;
                        if let Some(alt) = self.fibers.alternate_of(current) {
                            self.fibers.lanes[alt as usize] |= lane;
                        }
                        (root, lane)
                    }
                };
                let rendering = self.wip.as_ref().is_some_and(|w| w.root == root);
                if let Some(r) = self.roots.get_mut(&root) {
                    r.mark_updated(lane, rendering);
                    if !touched.contains(&root) {
                        touched.push(root);
                    }
                }
            }
            for root in touched {
                self.ensure_root_is_scheduled(scheduler, root);
            }
        }
    }

    /// Makes sure `root` has one render task at the priority of its next
    /// lanes, reusing the existing task when the priority is unchanged.
    fn ensure_root_is_scheduled(&mut self, scheduler: &mut Scheduler<Job>, root: RootId) {
        let wip_lanes = self
            .wip
            .as_ref()
            .filter(|w| w.root == root)
            .map_or(Lanes::NONE, |w| w.lanes);
        let Some(r) = self.roots.get_mut(&root) else {
            return;
        };
        let next = get_next_lanes(r.pending_lanes, wip_lanes);
        let existing = r.callback_task;

        if next.is_empty() {
            if let Some(task) = existing {
                scheduler.cancel_callback(task);
            }
            r.callback_task = None;
            r.callback_priority = Lanes::NONE;
            return;
        }

        let lane = next.highest_priority_lane();
        if existing.is_some() && r.callback_priority == lane {
            return;
        }
        if let Some(task) = existing {
            scheduler.cancel_callback(task);
        }
        let priority = scheduler_priority_for_lanes(next);
        let task = scheduler.schedule_callback(priority, Job::Render(root), None);
        r.callback_task = Some(task);
        r.callback_priority = lane;

        let timestamp = scheduler.now();
        let mut tracer = self.tracer();
        if let Some(old) = existing {
            tracer.task(&TaskEvent {
                task: old,
                kind: TaskEventKind::Cancelled,
                priority,
                timestamp,
            });
        }
        tracer.task(&TaskEvent {
            task,
            kind: TaskEventKind::Scheduled,
            priority,
            timestamp,
        });
        tracer.root_scheduled(&RootScheduledEvent {
            root,
            lanes: next,
            priority,
            replaced: existing.is_some(),
            timestamp,
        });
    }

    // -- Render --

    /// Renders `root` at its next lanes and commits the result if the
    /// render finishes.
    ///
    /// With `allow_slicing`, renders of non-blocking lanes stop when the
    /// time slice is used up and resume on the next call.
    fn perform_work_on_root(&mut self, scheduler: &mut Scheduler<Job>, root: RootId, allow_slicing: bool) {
        self.flush_pending_passive(scheduler);
        self.process_inbox(scheduler);

        let wip_lanes = self
            .wip
            .as_ref()
            .filter(|w| w.root == root)
            .map_or(Lanes::NONE, |w| w.lanes);
        let Some(r) = self.roots.get(&root) else {
            return;
        };
        let lanes = get_next_lanes(r.pending_lanes, wip_lanes);
        if lanes.is_empty() {
            return;
        }

        let resume = self
            .wip
            .as_ref()
            .is_some_and(|w| w.root == root && w.lanes == lanes);
        if !resume {
            self.prepare_fresh_stack(root, lanes);
        }
        let time_slice = allow_slicing && !lanes.includes_blocking_lane();

        match self.work_loop(scheduler, time_slice) {
            Ok(true) => self.commit_root(scheduler),
            Ok(false) => {}
            Err(err) => {
                self.errors.record(err);
                self.drop_lanes(root, lanes);
            }
        }
    }

    /// Discards any render in progress and starts a new one from the
    /// committed root.
    fn prepare_fresh_stack(&mut self, root: RootId, lanes: Lanes) {
        self.wip = None;
        self.contexts.clear();
        let Some(r) = self.roots.get_mut(&root) else {
            return;
        };
        r.interleaved_lanes = Lanes::NONE;
        let current = r.current;
        let props = self.fibers.pending_props[current as usize].clone();
        let root_fiber = self.fibers.create_work_in_progress(current, props);
        self.wip = Some(WorkInProgress {
            root,
            root_fiber,
            lanes,
            next_unit: root_fiber,
            builder: CommitSummaryBuilder::new(root, lanes),
        });
    }

    /// Performs units of work until the tree is complete (`Ok(true)`) or
    /// the slice runs out (`Ok(false)`).
    fn work_loop(&mut self, scheduler: &Scheduler<Job>, time_slice: bool) -> Result<bool, Error> {
        let Some(mut wip) = self.wip.take() else {
            return Ok(false);
        };
        let start = scheduler.now();
        wip.builder.slice();
        wip.builder.phase_begin(PhaseKind::Render, start);
        self.tracer().phase_begin(&PhaseBeginEvent {
            root: wip.root,
            lanes: wip.lanes,
            phase: PhaseKind::Render,
            timestamp: start,
        });

        let mut pass = RenderPass {
            fibers: &mut self.fibers,
            host: &mut self.host,
            contexts: &mut self.contexts,
            updates: &self.updates,
            render_lanes: wip.lanes,
            root: wip.root_fiber,
        };
        let result = loop {
            if wip.next_unit == INVALID {
                break Ok(true);
            }
            if time_slice && scheduler.should_yield_to_host() {
                break Ok(false);
            }
            match pass.perform_unit_of_work(wip.next_unit) {
                Ok(next) => wip.next_unit = next,
                Err(err) => break Err(err),
            }
        };

        let end = scheduler.now();
        wip.builder.phase_end(PhaseKind::Render, end);
        self.tracer().phase_end(&PhaseEndEvent {
            root: wip.root,
            lanes: wip.lanes,
            phase: PhaseKind::Render,
            timestamp: end,
        });
        if result.is_ok() {
            self.wip = Some(wip);
        }
        result
    }

    /// Forgets a failed render: the work-in-progress tree is dropped and
    /// `lanes` are cleared from the root and every fiber. Queued updates
    /// stay queued.
    fn drop_lanes(&mut self, root: RootId, lanes: Lanes) {
        self.wip = None;
        self.contexts.clear();
        if let Some(r) = self.roots.get_mut(&root) {
            r.pending_lanes = r.pending_lanes.remove(lanes);
            r.interleaved_lanes = r.interleaved_lanes.remove(lanes);
        }
        for idx in 0..self.fibers.len as usize {
            if self.fibers.live[idx] {
                self.fibers.lanes[idx] = self.fibers.lanes[idx].remove(lanes);
                self.fibers.child_lanes[idx] = self.fibers.child_lanes[idx].remove(lanes);
            }
        }
    }

    /// Renders and commits every root with synchronous work pending.
    fn flush_sync_work(&mut self, scheduler: &mut Scheduler<Job>) {
        let roots: Vec<RootId> = self
            .roots
            .iter()
            .filter(|(_, r)| r.pending_lanes.includes_some(Lanes::SYNC))
            .map(|(id, _)| *id)
            .collect();
        for root in roots {
            self.perform_work_on_root(scheduler, root, false);
            self.process_inbox(scheduler);
            self.ensure_root_is_scheduled(scheduler, root);
        }
    }

    // -- Commit --

    fn commit_root(&mut self, scheduler: &mut Scheduler<Job>) {
        // Effects of the previous commit run before this one mutates.
        self.flush_pending_passive(scheduler);
        let Some(mut wip) = self.wip.take() else {
            return;
        };
        let root = wip.root;
        let Some(container) = self.roots.get(&root).map(|r| r.container) else {
            return;
        };

        let start = scheduler.now();
        wip.builder.phase_begin(PhaseKind::Mutation, start);
        self.tracer().phase_begin(&PhaseBeginEvent {
            root,
            lanes: wip.lanes,
            phase: PhaseKind::Mutation,
            timestamp: start,
        });

        let mut pass = CommitPass::new(
            &mut self.fibers,
            &mut self.host,
            root,
            wip.lanes,
            container,
            &mut self.errors,
        );
        pass.commit_mutation_effects(wip.root_fiber);
        // The finished tree is now the current one.
        if let Some(r) = self.roots.get_mut(&root) {
            r.current = wip.root_fiber;
        }
        pass.collect_passive_effects(wip.root_fiber);
        #[cfg(feature = "trace-rich")]
        let mutations = core::mem::take(&mut pass.mutations);
        wip.builder
            .mutations(pass.placements, pass.updates, pass.deletions);
        let mut passive = pass.passive;

        let end = scheduler.now();
        wip.builder.phase_end(PhaseKind::Mutation, end);
        self.tracer().phase_end(&PhaseEndEvent {
            root,
            lanes: wip.lanes,
            phase: PhaseKind::Mutation,
            timestamp: end,
        });

        let f = wip.root_fiber as usize;
        let remaining = self.fibers.lanes[f] | self.fibers.child_lanes[f];
        let Some(r) = self.roots.get_mut(&root) else {
            return;
        };
        let commit_index = r.commit_count;
        r.mark_finished(remaining);
        let unmounting = r.unmounting;

        if !passive.is_empty() {
            let task = scheduler.schedule_callback(self.config.passive_priority, Job::Passive(root), None);
            passive.task = Some(task);
            self.pending_passive = Some(passive);
        }

        if unmounting
            && let Some(r) = self.roots.remove(&root)
            && let Some(task) = r.callback_task
        {
            scheduler.cancel_callback(task);
        }
        let live: Vec<u32> = self.roots.values().map(|r| r.current).collect();
        self.fibers.sweep(&live);

        let summary = wip.builder.finish(commit_index);
        let mut tracer = self.tracer();
        tracer.commit_summary(&summary);
        #[cfg(feature = "trace-rich")]
        tracer.fiber_mutations(commit_index, &mutations);
    }

    /// Runs the pending passive effects, if any. Returns whether there
    /// were any.
    fn flush_pending_passive(&mut self, scheduler: &mut Scheduler<Job>) -> bool {
        let Some(mut batch) = self.pending_passive.take() else {
            return false;
        };
        if let Some(task) = batch.task.take() {
            scheduler.cancel_callback(task);
        }
        let (root, lanes) = (batch.root, batch.lanes);
        let start = scheduler.now();
        self.tracer().phase_begin(&PhaseBeginEvent {
            root,
            lanes,
            phase: PhaseKind::Passive,
            timestamp: start,
        });
        batch.flush(&mut self.errors);
        let end = scheduler.now();
        self.tracer().phase_end(&PhaseEndEvent {
            root,
            lanes,
            phase: PhaseKind::Passive,
            timestamp: end,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::boxed::Box;
    use alloc::format;
    use alloc::string::{String, ToString};
    use core::cell::{Cell, RefCell};

    use crate::element::{Component, Context, Memo, el};
    use crate::error::ComponentError;
    use crate::hooks::{Cleanup, SetState};
    use crate::host::{HostOp, ManualLoop, MemoryHost};
    use crate::time::Duration;

    type Log = Rc<RefCell<Vec<String>>>;

    struct Fixture {
        renderer: Renderer<MemoryHost>,
        host_loop: ManualLoop,
        container: InstanceId,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_loop(ManualLoop::new())
        }

        fn with_loop(host_loop: ManualLoop) -> Self {
            let mut host = MemoryHost::new();
            let container = host.create_container();
            let renderer = Renderer::new(host, Rc::new(host_loop.clone()));
            Self {
                renderer,
                host_loop,
                container,
            }
        }

        /// Answers posted messages until none are left.
        fn pump(&mut self) -> Result<(), Error> {
            let mut first = Ok(());
            while self.host_loop.take_message() {
                if let Err(err) = self.renderer.perform_work_until_deadline() {
                    first = first.and(Err(err));
                }
            }
            first
        }

        fn markup(&self) -> String {
            self.renderer.host().markup(self.container)
        }
    }

    fn list(keys: &[&str]) -> Node {
        el("ul")
            .children(keys.iter().map(|k| el("li").key(*k).child(*k)))
            .into_node()
    }

    fn logger() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn take(log: &Log) -> Vec<String> {
        core::mem::take(&mut *log.borrow_mut())
    }

    #[test]
    fn mount_renders_into_the_container() {
        let mut fx = Fixture::new();
        let root = fx.renderer.mount(fx.container, list(&["a", "b"]));
        assert_eq!(fx.markup(), "", "nothing happens before the host calls back");
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<ul><li>a</li><li>b</li></ul>");
        assert_eq!(fx.renderer.commit_count(root), Some(1));
        assert_eq!(fx.renderer.pending_lanes(root), Some(Lanes::NONE));
    }

    #[test]
    fn keyed_reorder_moves_instead_of_recreating() {
        let mut fx = Fixture::new();
        let root = fx.renderer.mount(fx.container, list(&["a", "b", "c", "d"]));
        fx.pump().unwrap();
        fx.renderer.host_mut().take_ops();

        fx.renderer.render(root, list(&["d", "a", "b", "c"])).unwrap();
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<ul><li>d</li><li>a</li><li>b</li><li>c</li></ul>");
        let ops = fx.renderer.host_mut().take_ops();
        assert!(
            !ops.iter().any(|op| matches!(op, HostOp::Create { .. } | HostOp::Remove { .. })),
            "instances are reused: {ops:?}"
        );
        let moves = ops.iter().filter(|op| op.is_structural()).count();
        assert_eq!(moves, 3, "a, b and c move behind d");
    }

    #[test]
    fn removed_and_inserted_children_touch_only_themselves() {
        let mut fx = Fixture::new();
        let root = fx.renderer.mount(fx.container, list(&["a", "b", "c"]));
        fx.pump().unwrap();
        fx.renderer.host_mut().take_ops();

        fx.renderer.render(root, list(&["a", "x", "c"])).unwrap();
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<ul><li>a</li><li>x</li><li>c</li></ul>");
        let ops = fx.renderer.host_mut().take_ops();
        let creates = ops.iter().filter(|op| matches!(op, HostOp::Create { .. })).count();
        let removes = ops.iter().filter(|op| matches!(op, HostOp::Remove { .. })).count();
        let inserts = ops.iter().filter(|op| matches!(op, HostOp::InsertBefore { .. })).count();
        assert_eq!((creates, removes, inserts), (1, 1, 1));
    }

    #[test]
    fn prop_and_text_changes_are_applied_in_place() {
        let mut fx = Fixture::new();
        let root = fx
            .renderer
            .mount(fx.container, el("p").prop("class", "a").child("one"));
        fx.pump().unwrap();
        fx.renderer.host_mut().take_ops();

        fx.renderer
            .render(root, el("p").prop("class", "b").child("two"))
            .unwrap();
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<p class=\"b\">two</p>");
        let ops = fx.renderer.host_mut().take_ops();
        assert!(ops.iter().all(|op| !op.is_structural()), "{ops:?}");
    }

    #[test]
    fn text_content_switches_to_element_children() {
        let mut fx = Fixture::new();
        let root = fx.renderer.mount(fx.container, el("div").child("plain"));
        fx.pump().unwrap();
        fx.renderer
            .render(root, el("div").child(el("b").child("bold")))
            .unwrap();
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<div><b>bold</b></div>");
        fx.renderer.render(root, el("div").child("again")).unwrap();
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<div>again</div>");
    }

    fn counter(setter: Rc<RefCell<Option<SetState<i64>>>>, renders: Rc<Cell<u32>>) -> Component {
        Component::new("Counter", move |cx, _props| {
            renders.set(renders.get() + 1);
            let (count, set) = cx.use_state(|| 0_i64);
            *setter.borrow_mut() = Some(set);
            Ok(el("span").child(count).into_node())
        })
    }

    #[test]
    fn state_updates_re_render_only_the_owner() {
        let mut fx = Fixture::new();
        let setter = Rc::new(RefCell::new(None));
        let renders = Rc::new(Cell::new(0));
        let comp = counter(setter.clone(), renders.clone());
        fx.renderer.mount(
            fx.container,
            el("div").child(comp.element()).child(el("i").child("static")),
        );
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<div><span>0</span><i>static</i></div>");

        let set = setter.borrow().clone().unwrap();
        set.set(2);
        assert_eq!(fx.host_loop.pending_messages(), 1, "outside updates wake the host");
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<div><span>2</span><i>static</i></div>");
        assert_eq!(renders.get(), 2);

        set.set(2);
        fx.pump().unwrap();
        assert_eq!(renders.get(), 3, "an equal value still renders once");
        assert_eq!(fx.markup(), "<div><span>2</span><i>static</i></div>");
    }

    fn effect_logger(log: Log) -> Component {
        Component::new("Effects", move |cx, props| {
            let dep = props.get("dep").cloned().unwrap_or(Value::Null);
            let name = |what: &str| format!("{what} {dep}");
            let (l1, l2) = (log.clone(), log.clone());
            let (mount_l, destroy_l) = (name("layout"), name("layout cleanup"));
            cx.use_layout_effect([dep.clone()], move || {
                l1.borrow_mut().push(mount_l);
                let cleanup: Cleanup = Box::new(move || {
                    l2.borrow_mut().push(destroy_l);
                    Ok(())
                });
                Ok(Some(cleanup))
            });
            let (p1, p2) = (log.clone(), log.clone());
            let (mount_p, destroy_p) = (name("passive"), name("passive cleanup"));
            cx.use_effect([dep.clone()], move || {
                p1.borrow_mut().push(mount_p);
                let cleanup: Cleanup = Box::new(move || {
                    p2.borrow_mut().push(destroy_p);
                    Ok(())
                });
                Ok(Some(cleanup))
            });
            Ok(Node::Empty)
        })
    }

    #[test]
    fn effects_run_in_commit_order_with_cleanup_before_recreate() {
        let mut fx = Fixture::new();
        let log = logger();
        let comp = effect_logger(log.clone());
        let root = fx.renderer.mount(fx.container, comp.element().prop("dep", 1));

        fx.host_loop.take_message();
        fx.renderer.perform_work_until_deadline().unwrap();
        assert_eq!(take(&log), ["layout 1", "passive 1"]);

        fx.renderer.render(root, comp.element().prop("dep", 2)).unwrap();
        fx.pump().unwrap();
        assert_eq!(
            take(&log),
            [
                "layout cleanup 1",
                "layout 2",
                "passive cleanup 1",
                "passive 2"
            ]
        );

        fx.renderer.render(root, comp.element().prop("dep", 2)).unwrap();
        fx.pump().unwrap();
        assert!(take(&log).is_empty(), "unchanged deps do not re-run");

        fx.renderer.unmount(root).unwrap();
        assert_eq!(take(&log), ["layout cleanup 2", "passive cleanup 2"]);
        assert!(!fx.renderer.is_mounted(root));
        assert_eq!(fx.renderer.render(root, Node::Empty), Err(Error::StaleRoot(root)));
    }

    #[test]
    fn passive_effects_are_a_separate_task() {
        let mut fx = Fixture::new();
        let log = logger();
        let clock = fx.host_loop.clone();
        let comp = {
            let log = log.clone();
            Component::new("Slow", move |cx, _| {
                let (l1, l2) = (log.clone(), log.clone());
                let clock = clock.clone();
                cx.use_layout_effect((), move || {
                    // Use up the slice so the passive task has to wait.
                    clock.advance(Duration::from_millis(10));
                    l1.borrow_mut().push("layout".into());
                    Ok(None)
                });
                cx.use_effect((), move || {
                    l2.borrow_mut().push("passive".into());
                    Ok(None)
                });
                Ok(Node::Empty)
            })
        };
        fx.renderer.mount(fx.container, comp.element());
        fx.host_loop.take_message();
        let more = fx.renderer.perform_work_until_deadline().unwrap();
        assert!(more);
        assert_eq!(take(&log), ["layout"]);
        assert!(fx.renderer.flush_passive_effects().unwrap());
        assert_eq!(take(&log), ["passive"]);
        assert!(!fx.renderer.flush_passive_effects().unwrap());
    }

    #[test]
    fn transitions_yield_between_units_of_work() {
        let mut fx = Fixture::with_loop(ManualLoop::with_auto_advance(Duration::from_millis(1)));
        let keys: Vec<String> = (0..40).map(|i| format!("k{i}")).collect();
        let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let root = fx.renderer.mount(fx.container, Node::Empty);
        fx.pump().unwrap();

        let updates = fx.renderer.updates();
        updates.start_transition(|| fx.renderer.render(root, list(&refs))).unwrap();
        let mut slices = 0;
        while fx.host_loop.take_message() {
            fx.renderer.perform_work_until_deadline().unwrap();
            slices += 1;
        }
        assert!(slices > 2, "render spread over {slices} slices");
        assert!(fx.markup().starts_with("<ul><li>k0</li>"));
        assert_eq!(fx.renderer.pending_lanes(root), Some(Lanes::NONE));
    }

    #[test]
    fn discrete_event_interrupts_a_transition() {
        let mut fx = Fixture::with_loop(ManualLoop::with_auto_advance(Duration::from_millis(1)));
        let setter = Rc::new(RefCell::new(None));
        let comp = counter(setter.clone(), Rc::new(Cell::new(0)));
        let root = fx.renderer.mount(fx.container, el("div").child(comp.element()));
        fx.pump().unwrap();

        let keys: Vec<String> = (0..40).map(|i| format!("k{i}")).collect();
        let slow = el("div")
            .child(comp.element())
            .child(list(&keys.iter().map(String::as_str).collect::<Vec<_>>()));
        let updates = fx.renderer.updates();
        updates
            .start_transition(|| fx.renderer.render(root, slow.into_node()))
            .unwrap();
        fx.host_loop.take_message();
        assert!(fx.renderer.perform_work_until_deadline().unwrap(), "transition yielded");
        assert_eq!(fx.markup(), "<div><span>0</span></div>");

        let set = setter.borrow().clone().unwrap();
        let click = Callback::new(move |_| {
            set.set(7);
            Ok(())
        });
        fx.renderer
            .dispatch_event(InputCategory::Discrete, &[click], &Value::Null)
            .unwrap();
        assert_eq!(fx.markup(), "<div><span>7</span></div>", "sync work commits first");

        fx.pump().unwrap();
        assert!(fx.markup().starts_with("<div><span>7</span><ul>"), "{}", fx.markup());
        assert_eq!(fx.renderer.pending_lanes(root), Some(Lanes::NONE));
    }

    #[test]
    fn render_errors_keep_the_committed_tree() {
        let mut fx = Fixture::new();
        let boom = Component::new("Boom", |_, props| {
            if props.get("fail").is_some() {
                return Err(ComponentError::new("render failed"));
            }
            Ok(el("b").child("fine").into_node())
        });
        let root = fx.renderer.mount(fx.container, boom.element());
        fx.pump().unwrap();

        fx.renderer.render(root, boom.element().prop("fail", true)).unwrap();
        let err = fx.pump().unwrap_err();
        assert_eq!(err, Error::Component(ComponentError::new("render failed")));
        assert_eq!(fx.markup(), "<b>fine</b>");
        assert_eq!(fx.renderer.pending_lanes(root), Some(Lanes::NONE), "lanes dropped");

        fx.renderer
            .render(root, el("i").child("recovered"))
            .unwrap();
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<i>recovered</i>");
    }

    #[test]
    fn dispatch_event_runs_every_handler_and_keeps_the_first_error() {
        let mut fx = Fixture::new();
        let ran = Rc::new(Cell::new(0));
        let handler = |fail: Option<&'static str>| {
            let ran = ran.clone();
            Callback::new(move |_| {
                ran.set(ran.get() + 1);
                fail.map_or(Ok(()), |msg| Err(ComponentError::new(msg)))
            })
        };
        let handlers = [handler(None), handler(Some("first")), handler(Some("second"))];
        let err = fx
            .renderer
            .dispatch_event(InputCategory::Discrete, &handlers, &Value::Null)
            .unwrap_err();
        assert_eq!(ran.get(), 3);
        assert_eq!(err.to_string(), "first");
    }

    #[test]
    fn context_changes_reach_readers_below_memoized_parents() {
        let mut fx = Fixture::new();
        let theme = Context::new("theme", "light");
        let reader = {
            let theme = theme.clone();
            Component::new("Reader", move |cx, _| {
                let value = cx.use_context(&theme);
                Ok(el("em").child(value.as_str().unwrap_or("?")).into_node())
            })
        };
        let renders = Rc::new(Cell::new(0));
        let middle = {
            let renders = renders.clone();
            let reader = reader.clone();
            Memo::new(Component::new("Middle", move |_, _| {
                renders.set(renders.get() + 1);
                Ok(reader.element().into_node())
            }))
        };
        let tree = |value: &str| theme.provider(value).child(middle.element()).into_node();

        let root = fx.renderer.mount(fx.container, tree("light"));
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<em>light</em>");

        fx.renderer.render(root, tree("dark")).unwrap();
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<em>dark</em>");
        assert_eq!(renders.get(), 1, "the memoized parent did not render again");
    }

    #[test]
    fn setters_of_unmounted_components_do_nothing() {
        let mut fx = Fixture::new();
        let setter = Rc::new(RefCell::new(None));
        let comp = counter(setter.clone(), Rc::new(Cell::new(0)));
        let root = fx.renderer.mount(fx.container, el("div").child(comp.element()));
        fx.pump().unwrap();

        fx.renderer.render(root, el("div")).unwrap();
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<div></div>");

        let set = setter.borrow().clone().unwrap();
        set.set(9);
        fx.pump().unwrap();
        assert_eq!(fx.markup(), "<div></div>");
        assert_eq!(fx.renderer.pending_lanes(root), Some(Lanes::NONE));
    }

    #[test]
    fn committed_trees_do_not_leak_fibers() {
        let mut fx = Fixture::new();
        let root = fx.renderer.mount(fx.container, list(&["a", "b", "c"]));
        fx.pump().unwrap();
        fx.renderer.render(root, list(&["c", "b", "a"])).unwrap();
        fx.pump().unwrap();
        let settled = fx.renderer.fiber_count();
        for round in 0..5 {
            let keys: &[&str] = if round % 2 == 0 { &["a", "b", "c"] } else { &["c", "b", "a"] };
            fx.renderer.render(root, list(keys)).unwrap();
            fx.pump().unwrap();
        }
        assert_eq!(fx.renderer.fiber_count(), settled);

        fx.renderer.unmount(root).unwrap();
        assert_eq!(fx.renderer.fiber_count(), 0);
        assert_eq!(fx.markup(), "");
    }

    #[test]
    fn run_until_idle_drains_every_task() {
        let mut fx = Fixture::new();
        let log = logger();
        let comp = effect_logger(log.clone());
        fx.renderer.mount(fx.container, comp.element().prop("dep", "x"));
        fx.renderer.run_until_idle().unwrap();
        assert_eq!(take(&log), ["layout x", "passive x"]);
        assert!(!fx.renderer.has_pending_work());
    }

    #[test]
    fn failing_effects_do_not_stop_the_commit() {
        let mut fx = Fixture::new();
        let ran = Rc::new(Cell::new(0));
        let comp = {
            let ran = ran.clone();
            Component::new("Fails", move |cx, _| {
                let (a, b) = (ran.clone(), ran.clone());
                cx.use_layout_effect((), move || {
                    a.set(a.get() + 1);
                    Err(ComponentError::new("layout failed"))
                });
                cx.use_layout_effect((), move || {
                    b.set(b.get() + 1);
                    Ok(None)
                });
                Ok(el("p").child("ok").into_node())
            })
        };
        fx.renderer.mount(fx.container, comp.element());
        let err = fx.pump().unwrap_err();
        assert_eq!(err.to_string(), "layout failed");
        assert_eq!(ran.get(), 2);
        assert_eq!(fx.markup(), "<p>ok</p>");
    }

    fn layout_logger(log: Log) -> Component {
        Component::new("Layout", move |cx, props| {
            let name = String::from(props.get("name").and_then(Value::as_str).unwrap_or("?"));
            let dep = props.get("dep").cloned().unwrap_or(Value::Null);
            let (mount, destroy) = (format!("{name} layout {dep}"), format!("{name} cleanup {dep}"));
            let (l1, l2) = (log.clone(), log.clone());
            cx.use_layout_effect([dep.clone()], move || {
                l1.borrow_mut().push(mount);
                let cleanup: Cleanup = Box::new(move || {
                    l2.borrow_mut().push(destroy);
                    Ok(())
                });
                Ok(Some(cleanup))
            });
            Ok(el("i").child(name).into_node())
        })
    }

    #[test]
    fn layout_effects_follow_each_component_in_tree_order() {
        let mut fx = Fixture::new();
        let log = logger();
        let comp = layout_logger(log.clone());
        let tree = |dep: i64| {
            el("div")
                .child(comp.element().key("a").prop("name", "A").prop("dep", dep))
                .child(comp.element().key("b").prop("name", "B").prop("dep", dep))
                .into_node()
        };
        let root = fx.renderer.mount(fx.container, tree(1));
        fx.pump().unwrap();
        assert_eq!(take(&log), ["A layout 1", "B layout 1"]);

        fx.renderer.render(root, tree(2)).unwrap();
        fx.pump().unwrap();
        assert_eq!(
            take(&log),
            ["A cleanup 1", "A layout 2", "B cleanup 1", "B layout 2"],
            "each component re-creates before its sibling cleans up"
        );
        assert_eq!(fx.markup(), "<div><i>A</i><i>B</i></div>");
    }

    #[test]
    fn memo_bailout_reuses_the_committed_subtree() {
        let mut fx = Fixture::new();
        let renders = Rc::new(Cell::new(0));
        let row = {
            let renders = renders.clone();
            Memo::new(Component::new("Row", move |_, props| {
                renders.set(renders.get() + 1);
                let label = String::from(props.get("label").and_then(Value::as_str).unwrap_or("?"));
                Ok(el("li").child(el("b").child(label)).into_node())
            }))
        };
        // Host root, then the memo fiber, then the `li` it rendered.
        let row_child = |fx: &Fixture, root: RootId| {
            let fibers = &fx.renderer.state.fibers;
            let memo = fibers.child[fx.renderer.state.roots[&root].current as usize];
            fibers.id(fibers.child[memo as usize])
        };

        let root = fx.renderer.mount(fx.container, row.element().prop("label", "x"));
        fx.pump().unwrap();
        let li = row_child(&fx, root);
        fx.renderer.render(root, row.element().prop("label", "x")).unwrap();
        fx.pump().unwrap();
        let settled = fx.renderer.fiber_count();
        fx.renderer.host_mut().take_ops();

        fx.renderer.render(root, row.element().prop("label", "x")).unwrap();
        fx.pump().unwrap();
        assert_eq!(renders.get(), 1, "equal props skip the render");
        assert_eq!(row_child(&fx, root), li, "the committed child is kept as is");
        assert_eq!(fx.renderer.fiber_count(), settled);
        let ops = fx.renderer.host_mut().take_ops();
        assert!(
            !ops.iter().any(|op| matches!(op, HostOp::Create { .. })),
            "nothing is recreated: {ops:?}"
        );
        assert_eq!(fx.markup(), "<li><b>x</b></li>");

        fx.renderer.render(root, row.element().prop("label", "y")).unwrap();
        fx.pump().unwrap();
        assert_eq!(renders.get(), 2);
        assert_eq!(fx.markup(), "<li><b>y</b></li>");
    }

    #[test]
    fn sync_work_on_another_root_restarts_a_yielded_render() {
        let mut fx = Fixture::with_loop(ManualLoop::with_auto_advance(Duration::from_millis(1)));
        let other = fx.renderer.host_mut().create_container();
        let renders = Rc::new(Cell::new(0));
        let slow_comp = counter(Rc::new(RefCell::new(None)), renders.clone());
        let setter = Rc::new(RefCell::new(None));
        let fast_comp = counter(setter.clone(), Rc::new(Cell::new(0)));
        let slow = fx.renderer.mount(fx.container, Node::Empty);
        let fast = fx.renderer.mount(other, fast_comp.element());
        fx.pump().unwrap();

        let keys: Vec<String> = (0..40).map(|i| format!("k{i}")).collect();
        let tree = el("div")
            .child(slow_comp.element())
            .child(list(&keys.iter().map(String::as_str).collect::<Vec<_>>()));
        let updates = fx.renderer.updates();
        updates
            .start_transition(|| fx.renderer.render(slow, tree.into_node()))
            .unwrap();
        while renders.get() == 0 {
            assert!(fx.host_loop.take_message());
            assert!(fx.renderer.perform_work_until_deadline().unwrap(), "transition yielded");
        }
        assert_eq!(fx.markup(), "");

        let set = setter.borrow().clone().unwrap();
        let click = Callback::new(move |_| {
            set.set(3);
            Ok(())
        });
        fx.renderer
            .dispatch_event(InputCategory::Discrete, &[click], &Value::Null)
            .unwrap();
        assert_eq!(fx.renderer.host().markup(other), "<span>3</span>");
        assert_eq!(fx.renderer.pending_lanes(fast), Some(Lanes::NONE));

        fx.pump().unwrap();
        assert_eq!(renders.get(), 2, "the discarded render started over");
        assert!(fx.markup().starts_with("<div><span>0</span><ul><li>k0</li>"), "{}", fx.markup());
        assert_eq!(fx.renderer.pending_lanes(slow), Some(Lanes::NONE));
    }
}
