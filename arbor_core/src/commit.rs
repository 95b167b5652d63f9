// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The commit phase.
//!
//! Committing a finished work-in-progress tree runs one synchronous pass
//! followed by one deferred pass:
//!
//! 1. **Mutation.** Depth first. Each fiber first tears down the children it
//!    deleted, then visits its own children, then inserts itself if it was
//!    placed, then applies its own update: a host prop payload, a text
//!    change, or for a component the cleanups of its re-running layout
//!    effects immediately followed by their creations. Once the tree is
//!    swapped, the effect lists with passive work are collected.
//! 2. **Passive.** Scheduled as a separate task. Every cleanup (of deleted
//!    fibers first, then of effects that re-run) runs before any creation.
//!
//! User callbacks run through a [`GuardedBatch`], so one failing effect
//! does not stop the rest of the commit.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;

use crate::error::Error;
use crate::fiber::{EffectList, FiberStore, INVALID, StateNode, WorkTag};
use crate::flags::{Flags, HookFlags};
use crate::guard::GuardedBatch;
use crate::hooks::{Effect, EffectInstance};
use crate::host::{Host, InstanceId};
use crate::lane::Lanes;
use crate::root::RootId;
use crate::scheduler::TaskId;

#[cfg(feature = "trace-rich")]
use crate::trace::{FiberMutation, MutationKind};

// ---------------------------------------------------------------------------
// Passive effects
// ---------------------------------------------------------------------------

/// Passive work left behind by one commit.
#[derive(Debug)]
pub(crate) struct PassiveBatch {
    pub(crate) root: RootId,
    /// Lanes of the commit that produced the batch.
    pub(crate) lanes: Lanes,
    /// Passive cleanups of deleted fibers.
    pub(crate) deleted: Vec<Rc<EffectInstance>>,
    /// Effect lists of fibers with armed passive effects, children first.
    pub(crate) effects: Vec<EffectList>,
    /// The task scheduled to flush this batch.
    pub(crate) task: Option<TaskId>,
}

impl PassiveBatch {
    pub(crate) fn new(root: RootId, lanes: Lanes) -> Self {
        Self {
            root,
            lanes,
            deleted: Vec::new(),
            effects: Vec::new(),
            task: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.deleted.is_empty() && self.effects.is_empty()
    }

    /// Runs every cleanup, then every creation. Returns the number of
    /// callbacks invoked.
    pub(crate) fn flush(self, errors: &mut GuardedBatch<Error>) -> u32 {
        let mut batch = GuardedBatch::new();
        for inst in &self.deleted {
            batch.invoke(|| inst.run_destroy().map_err(Error::from));
        }
        let armed: Vec<&Rc<Effect>> = self
            .effects
            .iter()
            .flat_map(|list| list.iter())
            .filter(|e| e.is(HookFlags::PASSIVE) && e.has_effect())
            .collect();
        for effect in &armed {
            batch.invoke(|| effect.inst.run_destroy().map_err(Error::from));
        }
        for effect in &armed {
            batch.invoke(|| effect.mount().map_err(Error::from));
        }
        let invoked = batch.invoked();
        errors.absorb(batch);
        invoked
    }
}

// ---------------------------------------------------------------------------
// Mutation and layout
// ---------------------------------------------------------------------------

/// State for committing one finished tree.
pub(crate) struct CommitPass<'a, H: Host> {
    fibers: &'a mut FiberStore,
    host: &'a mut H,
    container: InstanceId,
    errors: &'a mut GuardedBatch<Error>,
    pub(crate) passive: PassiveBatch,
    pub(crate) placements: u32,
    pub(crate) updates: u32,
    pub(crate) deletions: u32,
    #[cfg(feature = "trace-rich")]
    pub(crate) mutations: Vec<FiberMutation>,
}

impl<H: Host> core::fmt::Debug for CommitPass<'_, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommitPass")
            .field("container", &self.container)
            .field("placements", &self.placements)
            .field("updates", &self.updates)
            .field("deletions", &self.deletions)
            .finish_non_exhaustive()
    }
}

impl<'a, H: Host> CommitPass<'a, H> {
    pub(crate) fn new(
        fibers: &'a mut FiberStore,
        host: &'a mut H,
        root: RootId,
        lanes: Lanes,
        container: InstanceId,
        errors: &'a mut GuardedBatch<Error>,
    ) -> Self {
        Self {
            fibers,
            host,
            container,
            errors,
            passive: PassiveBatch::new(root, lanes),
            placements: 0,
            updates: 0,
            deletions: 0,
            #[cfg(feature = "trace-rich")]
            mutations: Vec::new(),
        }
    }

    #[cfg(feature = "trace-rich")]
    fn note(&mut self, fiber: u32, kind: MutationKind) {
        let instance = self.fibers.state_node[fiber as usize].instance();
        self.mutations.push(FiberMutation {
            fiber: self.fibers.id(fiber),
            kind,
            instance,
        });
    }

    // -- Mutation pass --

    /// Applies host mutations for the subtree rooted at `fiber`.
    pub(crate) fn commit_mutation_effects(&mut self, fiber: u32) {
        let f = fiber as usize;
        if self.fibers.flags[f].contains(Flags::CHILD_DELETION) {
            let deleted = core::mem::take(&mut self.fibers.deletions[f]);
            for child in deleted {
                self.commit_deletion(fiber, child);
            }
        }

        if self.fibers.subtree_flags[f].intersects(Flags::MUTATION_MASK) {
            for child in self.fibers.child_list(fiber) {
                self.commit_mutation_effects(child);
            }
        }

        if self.fibers.flags[f].contains(Flags::PLACEMENT) {
            self.commit_placement(fiber);
            self.fibers.flags[f].remove(Flags::PLACEMENT);
        }

        let flags = self.fibers.flags[f];
        match self.fibers.tag[f] {
            WorkTag::FunctionComponent | WorkTag::SimpleMemoComponent => {
                if flags.contains(Flags::UPDATE) {
                    self.run_layout_destroys(fiber, true);
                    self.run_layout_mounts(fiber);
                }
            }
            WorkTag::HostComponent => {
                let Some(instance) = self.fibers.state_node[f].instance() else {
                    return;
                };
                if flags.contains(Flags::CONTENT_RESET) {
                    self.host.set_text_content(instance, "");
                    self.fibers.flags[f].remove(Flags::CONTENT_RESET);
                }
                if flags.contains(Flags::UPDATE)
                    && let Some(payload) = self.fibers.update_payload[f].take()
                {
                    for (key, value) in &payload.attrs {
                        self.host.set_property(instance, key, value.as_ref());
                    }
                    if let Some(text) = &payload.text {
                        self.host.set_text_content(instance, text);
                    }
                    self.updates += 1;
                    #[cfg(feature = "trace-rich")]
                    self.note(fiber, MutationKind::Update);
                }
            }
            WorkTag::HostText => {
                if flags.contains(Flags::UPDATE)
                    && let Some(instance) = self.fibers.state_node[f].instance()
                {
                    let text = self.fibers.memoized_props[f]
                        .as_ref()
                        .and_then(|p| p.text_content().cloned())
                        .unwrap_or_default();
                    self.host.commit_text_update(instance, &text);
                    self.updates += 1;
                    #[cfg(feature = "trace-rich")]
                    self.note(fiber, MutationKind::TextUpdate);
                }
            }
            WorkTag::HostRoot
            | WorkTag::ClassComponent
            | WorkTag::ContextProvider
            | WorkTag::ContextConsumer
            | WorkTag::MemoComponent
            | WorkTag::Fragment => {}
        }
    }

    /// Runs the cleanups of layout effects on `fiber`, or only of those
    /// about to re-run when `armed_only` is set.
    fn run_layout_destroys(&mut self, fiber: u32, armed_only: bool) {
        let Some(list) = self.fibers.effects[fiber as usize].clone() else {
            return;
        };
        for effect in list.iter() {
            if effect.is(HookFlags::LAYOUT) && (!armed_only || effect.has_effect()) {
                self.errors
                    .invoke(|| effect.inst.run_destroy().map_err(Error::from));
            }
        }
    }

    fn run_layout_mounts(&mut self, fiber: u32) {
        let Some(list) = self.fibers.effects[fiber as usize].clone() else {
            return;
        };
        for effect in list.iter() {
            if effect.is(HookFlags::LAYOUT) && effect.has_effect() {
                self.errors.invoke(|| effect.mount().map_err(Error::from));
            }
        }
    }

    /// Walks up from `fiber` (exclusive) to the nearest fiber that can hold
    /// host children.
    fn host_parent_fiber(&self, fiber: u32) -> Option<u32> {
        let mut node = self.fibers.parent[fiber as usize];
        while node != INVALID {
            if self.fibers.tag[node as usize].is_host_parent() {
                return Some(node);
            }
            node = self.fibers.parent[node as usize];
        }
        None
    }

    fn host_parent_instance(&self, parent_fiber: u32) -> Option<InstanceId> {
        match &self.fibers.state_node[parent_fiber as usize] {
            StateNode::Root(_) => Some(self.container),
            StateNode::Host(instance) => Some(*instance),
            StateNode::None | StateNode::Class(_) => None,
        }
    }

    /// Host fibers `fiber` contributes to its host parent.
    fn top_host_nodes(&self, fiber: u32) -> Vec<u32> {
        if self.fibers.tag[fiber as usize].is_host() {
            vec![fiber]
        } else {
            self.fibers.top_host_fibers(fiber)
        }
    }

    /// Finds the host instance `fiber` should be inserted before: the first
    /// host node to its right, under the same host parent, that is not
    /// itself being placed.
    fn host_sibling(&self, fiber: u32) -> Option<InstanceId> {
        let fibers = &*self.fibers;
        let mut node = fiber;
        'siblings: loop {
            while fibers.sibling[node as usize] == INVALID {
                let parent = fibers.parent[node as usize];
                if parent == INVALID || fibers.tag[parent as usize].is_host_parent() {
                    return None;
                }
                node = parent;
            }
            node = fibers.sibling[node as usize];
            while !fibers.tag[node as usize].is_host() {
                // A placed subtree moves too, so nothing in it is stable.
                if fibers.flags[node as usize].contains(Flags::PLACEMENT) {
                    continue 'siblings;
                }
                let child = fibers.child[node as usize];
                if child == INVALID {
                    continue 'siblings;
                }
                node = child;
            }
            if !fibers.flags[node as usize].contains(Flags::PLACEMENT) {
                return fibers.state_node[node as usize].instance();
            }
        }
    }

    fn commit_placement(&mut self, fiber: u32) {
        let Some(parent_fiber) = self.host_parent_fiber(fiber) else {
            self.errors
                .record(Error::MissingHostParent(self.fibers.id(fiber)));
            return;
        };
        let Some(parent) = self.host_parent_instance(parent_fiber) else {
            self.errors
                .record(Error::MissingHostParent(self.fibers.id(fiber)));
            return;
        };
        if self.fibers.flags[parent_fiber as usize].contains(Flags::CONTENT_RESET) {
            self.host.set_text_content(parent, "");
            self.fibers.flags[parent_fiber as usize].remove(Flags::CONTENT_RESET);
        }

        let before = self.host_sibling(fiber);
        for node in self.top_host_nodes(fiber) {
            let Some(instance) = self.fibers.state_node[node as usize].instance() else {
                continue;
            };
            match before {
                Some(before) => self.host.insert_before(parent, instance, before),
                None => self.host.append_child(parent, instance),
            }
        }
        self.placements += 1;
        #[cfg(feature = "trace-rich")]
        self.note(fiber, MutationKind::Placement);
    }

    /// Tears down `deleted`, a committed child of `parent`.
    ///
    /// Its top host nodes are detached from the host parent; every fiber
    /// below it then runs its layout cleanups and queues its passive ones,
    /// parents before children.
    fn commit_deletion(&mut self, parent: u32, deleted: u32) {
        let parent_fiber = if self.fibers.tag[parent as usize].is_host_parent() {
            Some(parent)
        } else {
            self.host_parent_fiber(parent)
        };
        let host_parent = parent_fiber.and_then(|p| self.host_parent_instance(p));
        match host_parent {
            Some(host_parent) => {
                for node in self.top_host_nodes(deleted) {
                    if let Some(instance) = self.fibers.state_node[node as usize].instance() {
                        self.host.remove_child(host_parent, instance);
                    }
                }
            }
            None => self
                .errors
                .record(Error::MissingHostParent(self.fibers.id(deleted))),
        }
        self.deletions += 1;
        #[cfg(feature = "trace-rich")]
        self.note(deleted, MutationKind::Deletion);

        let mut stack = vec![deleted];
        while let Some(node) = stack.pop() {
            let n = node as usize;
            match self.fibers.tag[n] {
                WorkTag::FunctionComponent | WorkTag::SimpleMemoComponent => {
                    self.run_layout_destroys(node, false);
                    if let Some(list) = &self.fibers.effects[n] {
                        self.passive.deleted.extend(
                            list.iter()
                                .filter(|e| e.is(HookFlags::PASSIVE))
                                .map(|e| e.inst.clone()),
                        );
                    }
                }
                WorkTag::HostComponent | WorkTag::HostText => {
                    if let Some(instance) = self.fibers.state_node[n].instance() {
                        self.host.detach_deleted_instance(instance);
                    }
                }
                _ => {}
            }
            let first = stack.len();
            stack.extend(self.fibers.children(node));
            stack[first..].reverse();
        }

        self.fibers.parent[deleted as usize] = INVALID;
        if let Some(alt) = self.fibers.alternate_of(deleted) {
            self.fibers.parent[alt as usize] = INVALID;
        }
    }

    // -- Passive collection --

    /// Collects the effect lists with passive work below `fiber`, children
    /// first.
    pub(crate) fn collect_passive_effects(&mut self, fiber: u32) {
        let f = fiber as usize;
        if self.fibers.subtree_flags[f].contains(Flags::PASSIVE) {
            for child in self.fibers.child_list(fiber) {
                self.collect_passive_effects(child);
            }
        }
        if !self.fibers.tag[f].has_hooks() || !self.fibers.flags[f].contains(Flags::PASSIVE) {
            return;
        }
        if let Some(list) = self.fibers.effects[f].clone() {
            self.passive.effects.push(list);
        }
    }
}
