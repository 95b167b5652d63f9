// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render phase.
//!
//! A render walks the work-in-progress tree depth first without recursion.
//! Entering a fiber ("begin") renders it and reconciles its children, then
//! moves to the first child. A fiber without children is exited
//! ("complete"), and so are its ancestors until one has a sibling to enter
//! next. Completion creates host instances, diffs host props and bubbles
//! lanes and flags up the tree.
//!
//! [`RenderPass`] holds what one unit of work needs. The renderer drives it
//! one unit at a time and checks for yielding between units, so a render can
//! stop after any unit and resume later from the saved next unit.

mod begin;
mod complete;

use alloc::rc::Rc;

use crate::context::ContextStack;
use crate::error::Error;
use crate::fiber::{FiberStore, INVALID};
use crate::host::Host;
use crate::lane::Lanes;
use crate::updates::UpdateContext;

/// Borrowed state for performing units of work.
pub(crate) struct RenderPass<'a, H: Host> {
    pub(crate) fibers: &'a mut FiberStore,
    pub(crate) host: &'a mut H,
    pub(crate) contexts: &'a mut ContextStack,
    pub(crate) updates: &'a Rc<UpdateContext>,
    pub(crate) render_lanes: Lanes,
    /// The work-in-progress host-root fiber.
    pub(crate) root: u32,
}

impl<H: Host> core::fmt::Debug for RenderPass<'_, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderPass")
            .field("render_lanes", &self.render_lanes)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl<H: Host> RenderPass<'_, H> {
    /// Performs one unit of work and returns the next one, or `INVALID`
    /// once the root has completed.
    pub(crate) fn perform_unit_of_work(&mut self, unit: u32) -> Result<u32, Error> {
        let next = self.begin_work(unit)?;
        let u = unit as usize;
        self.fibers.memoized_props[u] = Some(self.fibers.pending_props[u].clone());
        if next != INVALID {
            return Ok(next);
        }
        Ok(self.complete_unit_of_work(unit))
    }

    /// Completes `unit` and its ancestors up to the first one with a
    /// sibling, which is returned.
    fn complete_unit_of_work(&mut self, unit: u32) -> u32 {
        let mut node = unit;
        loop {
            self.complete_work(node);
            if node == self.root {
                return INVALID;
            }
            let sibling = self.fibers.sibling[node as usize];
            if sibling != INVALID {
                return sibling;
            }
            node = self.fibers.parent[node as usize];
            if node == INVALID {
                return INVALID;
            }
        }
    }
}
