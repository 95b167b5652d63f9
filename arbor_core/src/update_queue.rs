// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lane-aware update queues.
//!
//! A queue has two halves. The *pending* half ([`SharedQueue`]) is shared
//! between both generations of a fiber and is where dispatchers append.
//! The *base* half lives in each generation's [`QueueState`]: a base state
//! plus the updates that have not been applied to it yet.
//!
//! Rendering first moves pending updates into the current generation's base
//! queue, so that a render that is thrown away loses nothing, then folds
//! the base queue over the base state. Updates whose lane is outside the
//! render lanes are skipped, and from the first skipped update on every
//! later update is kept as well. Applied updates that follow a skipped one
//! are kept with no lane, so they are applied again, in order, by whichever
//! render eventually includes the skipped lanes. The final state is the
//! same as if every update had been applied in dispatch order.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::Any;
use core::cell::RefCell;
use core::fmt;

use crate::lane::Lanes;

/// A type-erased, shared value.
pub(crate) type AnyRc = Rc<dyn Any>;

/// One queued update.
#[derive(Clone)]
pub(crate) struct Update {
    pub(crate) lane: Lanes,
    pub(crate) action: AnyRc,
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Update")
            .field("lane", &self.lane)
            .finish_non_exhaustive()
    }
}

/// The pending half of a queue.
#[derive(Default)]
pub(crate) struct SharedQueue {
    pending: RefCell<Vec<Update>>,
}

impl SharedQueue {
    pub(crate) fn push(&self, update: Update) {
        self.pending.borrow_mut().push(update);
    }

    pub(crate) fn take_pending(&self) -> Vec<Update> {
        core::mem::take(&mut *self.pending.borrow_mut())
    }

    pub(crate) fn pending_lanes(&self) -> Lanes {
        self.pending
            .borrow()
            .iter()
            .fold(Lanes::NONE, |acc, u| acc | u.lane)
    }
}

impl fmt::Debug for SharedQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedQueue")
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

/// The per-generation half of a queue.
#[derive(Clone)]
pub(crate) struct QueueState {
    /// State as of the last render.
    pub(crate) memoized: AnyRc,
    /// State before the first skipped update.
    pub(crate) base_state: AnyRc,
    /// Updates not yet folded into `base_state`.
    pub(crate) base_queue: Vec<Update>,
    pub(crate) queue: Rc<SharedQueue>,
}

impl fmt::Debug for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueState")
            .field("base_queue", &self.base_queue)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

/// Result of folding a queue for one render.
#[derive(Debug)]
pub(crate) struct Processed {
    pub(crate) next: QueueState,
    /// Lanes of updates left for a later render.
    pub(crate) skipped_lanes: Lanes,
}

impl QueueState {
    /// A fresh queue holding `initial`.
    pub(crate) fn new(initial: AnyRc) -> Self {
        Self {
            memoized: initial.clone(),
            base_state: initial,
            base_queue: Vec::new(),
            queue: Rc::new(SharedQueue::default()),
        }
    }

    /// A queue holding `initial` whose pending half is `queue`.
    pub(crate) fn with_queue(initial: AnyRc, queue: Rc<SharedQueue>) -> Self {
        Self {
            queue,
            ..Self::new(initial)
        }
    }

    /// Moves pending updates to the end of the base queue.
    pub(crate) fn absorb_pending(&mut self) {
        let pending = self.queue.take_pending();
        self.base_queue.extend(pending);
    }

    /// Folds the base queue for a render of `render_lanes`.
    pub(crate) fn process<E>(
        &self,
        render_lanes: Lanes,
        mut reduce: impl FnMut(&AnyRc, &AnyRc) -> Result<AnyRc, E>,
    ) -> Result<Processed, E> {
        let mut state = self.base_state.clone();
        let mut new_base_state = None;
        let mut new_base_queue: Vec<Update> = Vec::new();
        let mut skipped_lanes = Lanes::NONE;

        for update in &self.base_queue {
            if !render_lanes.contains(update.lane) {
                if new_base_queue.is_empty() {
                    new_base_state = Some(state.clone());
                }
                new_base_queue.push(update.clone());
                skipped_lanes |= update.lane;
            } else {
                if !new_base_queue.is_empty() {
                    new_base_queue.push(Update {
                        lane: Lanes::NONE,
                        action: update.action.clone(),
                    });
                }
                state = reduce(&state, &update.action)?;
            }
        }

        let base_state = new_base_state.unwrap_or_else(|| state.clone());
        Ok(Processed {
            next: Self {
                memoized: state,
                base_state,
                base_queue: new_base_queue,
                queue: self.queue.clone(),
            },
            skipped_lanes,
        })
    }
}
