// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays fiber storage with allocation, double buffering and
//! reclamation.

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use super::id::{FiberId, INVALID};
use super::traverse::Children;
use super::{FiberState, HostUpdate, StateNode, WorkTag};
use crate::context::ContextDependency;
use crate::element::{Element, ElementType, Key, Node, Props};
use crate::flags::Flags;
use crate::hooks::Effect;
use crate::lane::Lanes;
use crate::root::RootId;

/// Shared, immutable effect list of a function fiber.
pub(crate) type EffectList = Rc<[Rc<Effect>]>;

/// Storage for all fibers of all roots.
///
/// Fibers are addressed by slot index inside the crate. Reclaimed slots are
/// recycled through a free list, and generation counters make outstanding
/// [`FiberId`] handles detectably stale.
pub(crate) struct FiberStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) child: Vec<u32>,
    pub(crate) sibling: Vec<u32>,
    pub(crate) index: Vec<u32>,
    pub(crate) alternate: Vec<u32>,

    // -- Identity --
    pub(crate) tag: Vec<WorkTag>,
    pub(crate) key: Vec<Option<Key>>,
    pub(crate) element_type: Vec<Option<ElementType>>,
    pub(crate) state_node: Vec<StateNode>,

    // -- Inputs and state --
    pub(crate) pending_props: Vec<Props>,
    pub(crate) memoized_props: Vec<Option<Props>>,
    pub(crate) memoized_state: Vec<FiberState>,
    pub(crate) effects: Vec<Option<EffectList>>,
    pub(crate) update_payload: Vec<Option<HostUpdate>>,
    pub(crate) dependencies: Vec<Vec<ContextDependency>>,

    // -- Effects and priority --
    pub(crate) flags: Vec<Flags>,
    pub(crate) subtree_flags: Vec<Flags>,
    pub(crate) deletions: Vec<Vec<u32>>,
    pub(crate) lanes: Vec<Lanes>,
    pub(crate) child_lanes: Vec<Lanes>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) live: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl fmt::Debug for FiberStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiberStore")
            .field("len", &self.len)
            .field("free", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Default for FiberStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FiberStore {
    pub(crate) fn new() -> Self {
        Self {
            parent: Vec::new(),
            child: Vec::new(),
            sibling: Vec::new(),
            index: Vec::new(),
            alternate: Vec::new(),
            tag: Vec::new(),
            key: Vec::new(),
            element_type: Vec::new(),
            state_node: Vec::new(),
            pending_props: Vec::new(),
            memoized_props: Vec::new(),
            memoized_state: Vec::new(),
            effects: Vec::new(),
            update_payload: Vec::new(),
            dependencies: Vec::new(),
            flags: Vec::new(),
            subtree_flags: Vec::new(),
            deletions: Vec::new(),
            lanes: Vec::new(),
            child_lanes: Vec::new(),
            generation: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            len: 0,
        }
    }

    // -- Allocation --

    /// Allocates a detached fiber.
    pub(crate) fn alloc(
        &mut self,
        tag: WorkTag,
        key: Option<Key>,
        pending_props: Props,
        lanes: Lanes,
    ) -> u32 {
        if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.child[i] = INVALID;
            self.sibling[i] = INVALID;
            self.index[i] = 0;
            self.alternate[i] = INVALID;
            self.tag[i] = tag;
            self.key[i] = key;
            self.element_type[i] = None;
            self.state_node[i] = StateNode::None;
            self.pending_props[i] = pending_props;
            self.memoized_props[i] = None;
            self.memoized_state[i] = FiberState::None;
            self.effects[i] = None;
            self.update_payload[i] = None;
            self.dependencies[i].clear();
            self.flags[i] = Flags::empty();
            self.subtree_flags[i] = Flags::empty();
            self.deletions[i].clear();
            self.lanes[i] = lanes;
            self.child_lanes[i] = Lanes::NONE;
            self.live[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.child.push(INVALID);
            self.sibling.push(INVALID);
            self.index.push(0);
            self.alternate.push(INVALID);
            self.tag.push(tag);
            self.key.push(key);
            self.element_type.push(None);
            self.state_node.push(StateNode::None);
            self.pending_props.push(pending_props);
            self.memoized_props.push(None);
            self.memoized_state.push(FiberState::None);
            self.effects.push(None);
            self.update_payload.push(None);
            self.dependencies.push(Vec::new());
            self.flags.push(Flags::empty());
            self.subtree_flags.push(Flags::empty());
            self.deletions.push(Vec::new());
            self.lanes.push(lanes);
            self.child_lanes.push(Lanes::NONE);
            self.generation.push(0);
            self.live.push(true);
            idx
        }
    }

    /// Frees a slot. Its generation is bumped so outstanding handles fail
    /// validation.
    fn free(&mut self, idx: u32) {
        let i = idx as usize;
        debug_assert!(self.live[i], "double free of fiber slot");
        self.live[i] = false;
        self.generation[i] = self.generation[i].wrapping_add(1);
        // Drop whatever the slot keeps alive.
        self.state_node[i] = StateNode::None;
        self.memoized_state[i] = FiberState::None;
        self.memoized_props[i] = None;
        self.pending_props[i] = Props::new();
        self.element_type[i] = None;
        self.effects[i] = None;
        self.update_payload[i] = None;
        self.dependencies[i].clear();
        self.deletions[i].clear();
        self.free_list.push(idx);
    }

    /// Number of live fibers.
    pub(crate) fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    // -- Handles --

    pub(crate) fn id(&self, idx: u32) -> FiberId {
        FiberId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Returns whether the handle refers to a live fiber.
    pub(crate) fn is_alive(&self, id: FiberId) -> bool {
        id.idx < self.len
            && self.live[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Resolves a handle, returning `None` if it is stale.
    pub(crate) fn resolve(&self, id: FiberId) -> Option<u32> {
        self.is_alive(id).then_some(id.idx)
    }

    /// Resolves a handle that must be live.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[track_caller]
    pub(crate) fn validate(&self, id: FiberId) -> u32 {
        assert!(self.is_alive(id), "stale FiberId");
        id.idx
    }

    pub(crate) fn children(&self, idx: u32) -> Children<'_> {
        Children::new(self, self.child[idx as usize])
    }

    pub(crate) fn alternate_of(&self, idx: u32) -> Option<u32> {
        let alt = self.alternate[idx as usize];
        (alt != INVALID).then_some(alt)
    }

    // -- Creation --

    /// Creates the entry fiber of a root.
    pub(crate) fn create_host_root(&mut self, root: RootId) -> u32 {
        let idx = self.alloc(WorkTag::HostRoot, None, Props::new(), Lanes::NONE);
        self.state_node[idx as usize] = StateNode::Root(root);
        self.memoized_props[idx as usize] = Some(Props::new());
        idx
    }

    /// Creates a fiber for an element.
    pub(crate) fn create_from_element(&mut self, element: &Element, lanes: Lanes) -> u32 {
        let tag = match element.ty() {
            ElementType::Host(_) => WorkTag::HostComponent,
            ElementType::Function(_) => WorkTag::FunctionComponent,
            ElementType::Class(_) => WorkTag::ClassComponent,
            ElementType::Fragment => WorkTag::Fragment,
            ElementType::Provider(_) => WorkTag::ContextProvider,
            ElementType::Consumer(_) => WorkTag::ContextConsumer,
            ElementType::Memo(_) => WorkTag::MemoComponent,
        };
        let idx = self.alloc(tag, element.key().cloned(), element.props().clone(), lanes);
        self.element_type[idx as usize] = Some(element.ty().clone());
        idx
    }

    /// Creates a fiber rendering `ty` with `props` directly, without an
    /// element.
    pub(crate) fn create_from_type(&mut self, ty: ElementType, props: Props, lanes: Lanes) -> u32 {
        let element = Element::new(ty, None, props);
        self.create_from_element(&element, lanes)
    }

    /// Creates a text fiber.
    pub(crate) fn create_from_text(&mut self, text: Rc<str>, lanes: Lanes) -> u32 {
        self.alloc(
            WorkTag::HostText,
            None,
            Props::with_children(Node::Text(text)),
            lanes,
        )
    }

    /// Creates a fragment fiber for a nested list of children.
    pub(crate) fn create_from_fragment(
        &mut self,
        children: Node,
        key: Option<Key>,
        lanes: Lanes,
    ) -> u32 {
        let idx = self.alloc(WorkTag::Fragment, key, Props::with_children(children), lanes);
        self.element_type[idx as usize] = Some(ElementType::Fragment);
        idx
    }

    /// Returns the work-in-progress counterpart of `current`, reusing the
    /// alternate slot when one exists.
    ///
    /// The result shares `current`'s children, state, effect list and lanes;
    /// its effect flags and deletions start empty.
    pub(crate) fn create_work_in_progress(&mut self, current: u32, pending_props: Props) -> u32 {
        let c = current as usize;
        let wip = match self.alternate_of(current) {
            Some(wip) => {
                let w = wip as usize;
                self.pending_props[w] = pending_props;
                self.flags[w] = Flags::empty();
                self.subtree_flags[w] = Flags::empty();
                self.deletions[w].clear();
                self.update_payload[w] = None;
                wip
            }
            None => {
                let (tag, key) = (self.tag[c], self.key[c].clone());
                let wip = self.alloc(tag, key, pending_props, Lanes::NONE);
                let w = wip as usize;
                self.element_type[w] = self.element_type[c].clone();
                self.state_node[w] = self.state_node[c].clone();
                self.alternate[w] = current;
                self.alternate[c] = wip;
                wip
            }
        };
        let w = wip as usize;
        self.tag[w] = self.tag[c];
        self.lanes[w] = self.lanes[c];
        self.child_lanes[w] = self.child_lanes[c];
        self.child[w] = self.child[c];
        self.memoized_props[w] = self.memoized_props[c].clone();
        self.memoized_state[w] = self.memoized_state[c].clone();
        self.effects[w] = self.effects[c].clone();
        self.dependencies[w] = self.dependencies[c].clone();
        self.sibling[w] = self.sibling[c];
        self.index[w] = self.index[c];
        self.parent[w] = self.parent[c];
        wip
    }

    // -- Lanes --

    /// Records `lane` on `fiber` and on the child lanes of every ancestor,
    /// in both generations. Returns the root fiber reached, or `None` if the
    /// fiber is detached.
    pub(crate) fn mark_update_lane_from_fiber_to_root(
        &mut self,
        fiber: u32,
        lane: Lanes,
    ) -> Option<u32> {
        self.lanes[fiber as usize] |= lane;
        if let Some(alt) = self.alternate_of(fiber) {
            self.lanes[alt as usize] |= lane;
        }
        let mut node = fiber;
        let mut parent = self.parent[node as usize];
        while parent != INVALID {
            self.child_lanes[parent as usize] |= lane;
            if let Some(alt) = self.alternate_of(parent) {
                self.child_lanes[alt as usize] |= lane;
            }
            node = parent;
            parent = self.parent[node as usize];
        }
        (self.tag[node as usize] == WorkTag::HostRoot).then_some(node)
    }

    // -- Reclamation --

    /// Frees every fiber not reachable from `roots` through child and
    /// sibling links, together with the alternates of reachable fibers.
    /// Returns the number of freed fibers.
    pub(crate) fn sweep(&mut self, roots: &[u32]) -> usize {
        let mut marked = vec![false; self.len as usize];
        let mut stack: Vec<u32> = roots.iter().copied().filter(|&r| r != INVALID).collect();
        while let Some(idx) = stack.pop() {
            let i = idx as usize;
            if marked[i] {
                continue;
            }
            marked[i] = true;
            if let Some(alt) = self.alternate_of(idx) {
                marked[alt as usize] = true;
            }
            let child = self.child[i];
            if child != INVALID {
                stack.push(child);
            }
            let sibling = self.sibling[i];
            if sibling != INVALID {
                stack.push(sibling);
            }
        }

        let mut freed = 0;
        for idx in 0..self.len {
            if self.live[idx as usize] && !marked[idx as usize] {
                self.free(idx);
                freed += 1;
            }
        }
        freed
    }
}
