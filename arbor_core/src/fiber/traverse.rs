// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::INVALID;
use super::store::FiberStore;

/// An iterator over the direct children of a fiber, by slot index.
///
/// Created by [`FiberStore::children`].
#[derive(Debug)]
pub(crate) struct Children<'a> {
    store: &'a FiberStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a FiberStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.sibling[idx as usize];
        Some(idx)
    }
}

impl FiberStore {
    /// Collects the children of `idx` so the store can be mutated while
    /// visiting them.
    pub(crate) fn child_list(&self, idx: u32) -> Vec<u32> {
        self.children(idx).collect()
    }

    /// Host instances directly below `idx`: the nearest host fibers in
    /// each branch, in tree order, not descending into them.
    pub(crate) fn top_host_fibers(&self, idx: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut stack: Vec<u32> = self.child_list(idx);
        stack.reverse();
        while let Some(node) = stack.pop() {
            if self.tag[node as usize].is_host() {
                out.push(node);
                continue;
            }
            let first = stack.len();
            stack.extend(self.children(node));
            stack[first..].reverse();
        }
        out
    }
}
