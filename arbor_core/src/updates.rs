// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The update inbox and update-lane selection.
//!
//! State setters can be called from anywhere: from event handlers, from
//! effects, or by the embedding application between host messages. None of
//! those callers holds the renderer, so a setter only appends its update to
//! the fiber's queue and records a [`ScheduledUpdate`] here. The renderer
//! drains the inbox every time it is entered and again before it returns,
//! marking lanes and scheduling roots. An update that arrives while the
//! renderer is not running posts one wake-up message to the host loop so
//! the host comes back and drains it.
//!
//! The lane an update gets depends on where it is dispatched from: inside
//! [`Updates::start_transition`] it gets the transition lane claimed for
//! that scope, inside [`Renderer::dispatch_event`] the lane of the event's
//! priority, and [`Lanes::DEFAULT`] otherwise.
//!
//! [`Renderer::dispatch_event`]: crate::renderer::Renderer::dispatch_event

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use crate::fiber::FiberId;
use crate::host::HostLoop;
use crate::lane::{Lane, Lanes, TransitionLaneAllocator};
use crate::priority::EventPriority;
use crate::root::RootId;

/// An update waiting for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScheduledUpdate {
    /// A hook queue of `FiberId` received an update in the given lane.
    Fiber(FiberId, Lane),
    /// A root received a new element in the given lane.
    Root(RootId, Lane),
}

/// Shared state behind every dispatcher.
pub(crate) struct UpdateContext {
    host: Rc<dyn HostLoop>,
    update_priority: Cell<Option<EventPriority>>,
    transition_depth: Cell<u32>,
    transition_lane: Cell<Lane>,
    allocator: Cell<TransitionLaneAllocator>,
    pending: RefCell<Vec<ScheduledUpdate>>,
    entered: Cell<u32>,
    wake_posted: Cell<bool>,
}

impl fmt::Debug for UpdateContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateContext")
            .field("update_priority", &self.update_priority.get())
            .field("transition_depth", &self.transition_depth.get())
            .field("pending", &self.pending.borrow().len())
            .field("entered", &self.entered.get())
            .finish_non_exhaustive()
    }
}

impl UpdateContext {
    pub(crate) fn new(host: Rc<dyn HostLoop>) -> Self {
        Self {
            host,
            update_priority: Cell::new(None),
            transition_depth: Cell::new(0),
            transition_lane: Cell::new(Lanes::NONE),
            allocator: Cell::new(TransitionLaneAllocator::new()),
            pending: RefCell::new(Vec::new()),
            entered: Cell::new(0),
            wake_posted: Cell::new(false),
        }
    }

    /// The lane an update dispatched right now belongs to.
    pub(crate) fn request_update_lane(&self) -> Lane {
        if self.transition_depth.get() > 0 {
            let lane = self.transition_lane.get();
            if !lane.is_empty() {
                return lane;
            }
            let lane = self.claim_transition_lane();
            self.transition_lane.set(lane);
            return lane;
        }
        self.update_priority
            .get()
            .map_or(Lanes::DEFAULT, EventPriority::lane)
    }

    /// Claims a fresh transition lane.
    pub(crate) fn claim_transition_lane(&self) -> Lane {
        let mut allocator = self.allocator.get();
        let lane = allocator.claim();
        self.allocator.set(allocator);
        lane
    }

    /// Records an update for the renderer.
    pub(crate) fn schedule(&self, update: ScheduledUpdate) {
        self.pending.borrow_mut().push(update);
        if self.entered.get() == 0 && !self.wake_posted.get() {
            self.wake_posted.set(true);
            self.host.request_callback();
        }
    }

    /// Takes every recorded update.
    pub(crate) fn take_pending(&self) -> Vec<ScheduledUpdate> {
        self.wake_posted.set(false);
        core::mem::take(&mut *self.pending.borrow_mut())
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.borrow().is_empty()
    }

    /// Runs `f` with `priority` as the current update priority.
    pub(crate) fn with_priority<R>(&self, priority: EventPriority, f: impl FnOnce() -> R) -> R {
        let previous = self.update_priority.replace(Some(priority));
        let out = f();
        self.update_priority.set(previous);
        out
    }

    pub(crate) fn start_transition<R>(&self, f: impl FnOnce() -> R) -> R {
        let depth = self.transition_depth.get();
        self.transition_depth.set(depth + 1);
        let out = f();
        self.transition_depth.set(depth);
        if depth == 0 {
            self.transition_lane.set(Lanes::NONE);
        }
        out
    }

    pub(crate) fn is_in_transition(&self) -> bool {
        self.transition_depth.get() > 0
    }
}

/// Marks the renderer as running while alive.
///
/// Updates recorded while any scope is alive do not post a wake-up
/// message; the renderer drains them before it returns.
#[derive(Debug)]
pub(crate) struct RendererScope(Rc<UpdateContext>);

impl RendererScope {
    pub(crate) fn enter(cx: &Rc<UpdateContext>) -> Self {
        cx.entered.set(cx.entered.get() + 1);
        Self(cx.clone())
    }
}

impl Drop for RendererScope {
    fn drop(&mut self) {
        self.0.entered.set(self.0.entered.get().saturating_sub(1));
    }
}

/// A handle for controlling how updates are prioritized.
///
/// Obtained from [`Renderer::updates`](crate::renderer::Renderer::updates)
/// or, during render, from [`RenderCx::updates`](crate::hooks::RenderCx::updates).
#[derive(Clone)]
pub struct Updates(pub(crate) Rc<UpdateContext>);

impl Updates {
    /// Runs `f` so that every update it dispatches is a transition.
    ///
    /// All updates of one outermost scope share a single transition lane;
    /// the next scope claims the following lane.
    pub fn start_transition<R>(&self, f: impl FnOnce() -> R) -> R {
        self.0.start_transition(f)
    }

    /// Returns `true` while inside [`start_transition`](Self::start_transition).
    #[must_use]
    pub fn is_in_transition(&self) -> bool {
        self.0.is_in_transition()
    }

    /// Runs `f` as if handling an event of `priority`.
    pub fn with_priority<R>(&self, priority: EventPriority, f: impl FnOnce() -> R) -> R {
        self.0.with_priority(priority, f)
    }

    /// The lane an update dispatched right now would get.
    #[must_use]
    pub fn current_lane(&self) -> Lane {
        self.0.request_update_lane()
    }
}

impl fmt::Debug for Updates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Updates").field(&self.0).finish()
    }
}
