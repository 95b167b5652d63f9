// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child reconciliation.
//!
//! Given the first committed child of a fiber and the children description
//! it rendered, [`ChildReconciler::reconcile`] builds the new child list.
//! Fibers whose key and type match are reused through
//! [`FiberStore::create_work_in_progress`]; everything else is created
//! fresh. Committed children that are not reused are queued on the parent
//! for deletion.
//!
//! Lists are matched in two phases. A lockstep walk from the front handles
//! the common case of unchanged prefixes with appends or removals at the
//! tail. At the first key mismatch the remaining committed children go into
//! a map, by key or by position for unkeyed ones, and each remaining new
//! entry is looked up there.
//!
//! A reused child is flagged [`Flags::PLACEMENT`] when its previous
//! position is below the highest previous position placed so far in this
//! pass; that fiber moved left relative to its neighbors. Otherwise the
//! watermark advances. New fibers are always flagged.
//!
//! When a parent is mounting there is nothing to delete or move, so side
//! effects are not tracked at all and completion inserts the whole subtree
//! at once.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;

use crate::element::{Element, ElementType, Key, Node, Props};
use crate::fiber::{FiberStore, INVALID, WorkTag};
use crate::flags::Flags;
use crate::lane::Lanes;

/// Identity of a committed child during list reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SlotKey {
    Key(Key),
    Index(u32),
}

/// Reconciles the children of one fiber.
#[derive(Debug)]
pub(crate) struct ChildReconciler<'a> {
    fibers: &'a mut FiberStore,
    track_side_effects: bool,
    lanes: Lanes,
}

impl<'a> ChildReconciler<'a> {
    /// `track_side_effects` is `false` when the parent is mounting.
    pub(crate) fn new(fibers: &'a mut FiberStore, track_side_effects: bool, lanes: Lanes) -> Self {
        Self {
            fibers,
            track_side_effects,
            lanes,
        }
    }

    /// Builds the child list of `parent` for `children` and returns its
    /// first fiber, or `INVALID` when it renders nothing.
    pub(crate) fn reconcile(&mut self, parent: u32, current_first: u32, children: &Node) -> u32 {
        // An unkeyed fragment at the top is transparent.
        let children = match children {
            Node::Element(e) if matches!(e.ty(), ElementType::Fragment) && e.key().is_none() => {
                e.props().children()
            }
            other => other,
        };
        match children {
            Node::Element(element) => {
                let child = self.reconcile_single_element(parent, current_first, element);
                self.place_single_child(child)
            }
            Node::Text(text) => {
                let child = self.reconcile_single_text(parent, current_first, text);
                self.place_single_child(child)
            }
            Node::List(items) => self.reconcile_children_array(parent, current_first, items),
            Node::Empty => {
                self.delete_remaining_children(parent, current_first);
                INVALID
            }
        }
    }

    // -- Deletion --

    fn delete_child(&mut self, parent: u32, child: u32) {
        if !self.track_side_effects {
            return;
        }
        let p = parent as usize;
        self.fibers.deletions[p].push(child);
        self.fibers.flags[p] |= Flags::CHILD_DELETION;
    }

    fn delete_remaining_children(&mut self, parent: u32, first: u32) {
        if !self.track_side_effects {
            return;
        }
        let mut child = first;
        while child != INVALID {
            self.delete_child(parent, child);
            child = self.fibers.sibling[child as usize];
        }
    }

    // -- Reuse and creation --

    /// Reuses `current` as a lone child with new props.
    fn use_fiber(&mut self, parent: u32, current: u32, props: Props) -> u32 {
        let wip = self.fibers.create_work_in_progress(current, props);
        let w = wip as usize;
        self.fibers.index[w] = 0;
        self.fibers.sibling[w] = INVALID;
        self.fibers.parent[w] = parent;
        wip
    }

    fn adopt(&mut self, parent: u32, fiber: u32) -> u32 {
        self.fibers.parent[fiber as usize] = parent;
        fiber
    }

    fn is_same_type(&self, fiber: u32, ty: &ElementType) -> bool {
        self.fibers.element_type[fiber as usize]
            .as_ref()
            .is_some_and(|t| t.same(ty))
    }

    fn create_child(&mut self, parent: u32, child: &Node) -> Option<u32> {
        let fiber = match child {
            Node::Text(text) => self.fibers.create_from_text(text.clone(), self.lanes),
            Node::Element(element) => self.fibers.create_from_element(element, self.lanes),
            Node::List(_) => self
                .fibers
                .create_from_fragment(child.clone(), None, self.lanes),
            Node::Empty => return None,
        };
        Some(self.adopt(parent, fiber))
    }

    fn update_text_node(&mut self, parent: u32, current: u32, text: &Rc<str>) -> u32 {
        if current == INVALID || self.fibers.tag[current as usize] != WorkTag::HostText {
            let fiber = self.fibers.create_from_text(text.clone(), self.lanes);
            return self.adopt(parent, fiber);
        }
        self.use_fiber(parent, current, Props::with_children(Node::Text(text.clone())))
    }

    fn update_element(&mut self, parent: u32, current: u32, element: &Element) -> u32 {
        if current != INVALID && self.is_same_type(current, element.ty()) {
            return self.use_fiber(parent, current, element.props().clone());
        }
        let fiber = self.fibers.create_from_element(element, self.lanes);
        self.adopt(parent, fiber)
    }

    fn update_fragment(&mut self, parent: u32, current: u32, children: &Node) -> u32 {
        if current == INVALID || self.fibers.tag[current as usize] != WorkTag::Fragment {
            let fiber = self
                .fibers
                .create_from_fragment(children.clone(), None, self.lanes);
            return self.adopt(parent, fiber);
        }
        self.use_fiber(parent, current, Props::with_children(children.clone()))
    }

    // -- Placement --

    fn place_single_child(&mut self, fiber: u32) -> u32 {
        if self.track_side_effects && self.fibers.alternate_of(fiber).is_none() {
            self.fibers.flags[fiber as usize] |= Flags::PLACEMENT;
        }
        fiber
    }

    fn place_child(&mut self, fiber: u32, last_placed_index: u32, new_index: u32) -> u32 {
        let f = fiber as usize;
        self.fibers.index[f] = new_index;
        if !self.track_side_effects {
            return last_placed_index;
        }
        match self.fibers.alternate_of(fiber) {
            Some(current) => {
                let old_index = self.fibers.index[current as usize];
                if old_index < last_placed_index {
                    self.fibers.flags[f] |= Flags::PLACEMENT;
                    last_placed_index
                } else {
                    old_index
                }
            }
            None => {
                self.fibers.flags[f] |= Flags::PLACEMENT;
                last_placed_index
            }
        }
    }

    // -- Single child --

    fn reconcile_single_element(&mut self, parent: u32, current_first: u32, element: &Element) -> u32 {
        let mut child = current_first;
        while child != INVALID {
            let c = child as usize;
            if self.fibers.key[c].as_ref() == element.key() {
                if self.is_same_type(child, element.ty()) {
                    self.delete_remaining_children(parent, self.fibers.sibling[c]);
                    return self.use_fiber(parent, child, element.props().clone());
                }
                self.delete_remaining_children(parent, child);
                break;
            }
            self.delete_child(parent, child);
            child = self.fibers.sibling[c];
        }
        let fiber = self.fibers.create_from_element(element, self.lanes);
        self.adopt(parent, fiber)
    }

    fn reconcile_single_text(&mut self, parent: u32, current_first: u32, text: &Rc<str>) -> u32 {
        if current_first != INVALID && self.fibers.tag[current_first as usize] == WorkTag::HostText {
            let rest = self.fibers.sibling[current_first as usize];
            self.delete_remaining_children(parent, rest);
            return self.use_fiber(parent, current_first, Props::with_children(Node::Text(text.clone())));
        }
        self.delete_remaining_children(parent, current_first);
        let fiber = self.fibers.create_from_text(text.clone(), self.lanes);
        self.adopt(parent, fiber)
    }

    // -- Lists --

    /// Matches `old` against `child` in the lockstep walk. `None` means the
    /// slot's identity does not match.
    fn update_slot(&mut self, parent: u32, old: u32, child: &Node) -> Option<u32> {
        let old_key = if old == INVALID {
            None
        } else {
            self.fibers.key[old as usize].clone()
        };
        match child {
            Node::Text(text) => old_key
                .is_none()
                .then(|| self.update_text_node(parent, old, text)),
            Node::Element(element) => (element.key() == old_key.as_ref())
                .then(|| self.update_element(parent, old, element)),
            Node::List(_) => old_key
                .is_none()
                .then(|| self.update_fragment(parent, old, child)),
            Node::Empty => None,
        }
    }

    fn map_remaining_children(&self, first: u32) -> BTreeMap<SlotKey, u32> {
        let mut map = BTreeMap::new();
        let mut child = first;
        while child != INVALID {
            let c = child as usize;
            let slot = match &self.fibers.key[c] {
                Some(key) => SlotKey::Key(key.clone()),
                None => SlotKey::Index(self.fibers.index[c]),
            };
            map.insert(slot, child);
            child = self.fibers.sibling[c];
        }
        map
    }

    fn update_from_map(
        &mut self,
        existing: &BTreeMap<SlotKey, u32>,
        parent: u32,
        new_index: u32,
        child: &Node,
    ) -> Option<u32> {
        let lookup = |slot: &SlotKey| existing.get(slot).copied().unwrap_or(INVALID);
        match child {
            Node::Text(text) => {
                let matched = lookup(&SlotKey::Index(new_index));
                Some(self.update_text_node(parent, matched, text))
            }
            Node::Element(element) => {
                let slot = element
                    .key()
                    .map_or(SlotKey::Index(new_index), |k| SlotKey::Key(k.clone()));
                let matched = lookup(&slot);
                Some(self.update_element(parent, matched, element))
            }
            Node::List(_) => {
                let matched = lookup(&SlotKey::Index(new_index));
                Some(self.update_fragment(parent, matched, child))
            }
            Node::Empty => None,
        }
    }

    fn reconcile_children_array(&mut self, parent: u32, current_first: u32, items: &[Node]) -> u32 {
        let len = items.len() as u32;
        let mut result_first = INVALID;
        let mut previous_new = INVALID;
        let mut link = |fibers: &mut FiberStore, fiber: u32| {
            if previous_new == INVALID {
                result_first = fiber;
            } else {
                fibers.sibling[previous_new as usize] = fiber;
            }
            previous_new = fiber;
        };

        let mut old = current_first;
        let mut last_placed_index = 0;
        let mut new_index = 0;

        while old != INVALID && new_index < len {
            let next_old;
            if self.fibers.index[old as usize] > new_index {
                // The committed list had an empty slot here.
                next_old = old;
                old = INVALID;
            } else {
                next_old = self.fibers.sibling[old as usize];
            }
            let Some(fiber) = self.update_slot(parent, old, &items[new_index as usize]) else {
                if old == INVALID {
                    old = next_old;
                }
                break;
            };
            if self.track_side_effects && old != INVALID && self.fibers.alternate_of(fiber).is_none() {
                // Matched the slot but could not reuse the fiber.
                self.delete_child(parent, old);
            }
            last_placed_index = self.place_child(fiber, last_placed_index, new_index);
            link(self.fibers, fiber);
            old = next_old;
            new_index += 1;
        }

        if new_index == len {
            self.delete_remaining_children(parent, old);
            return result_first;
        }

        if old == INVALID {
            for (i, item) in items.iter().enumerate().skip(new_index as usize) {
                if let Some(fiber) = self.create_child(parent, item) {
                    last_placed_index = self.place_child(fiber, last_placed_index, i as u32);
                    link(self.fibers, fiber);
                }
            }
            return result_first;
        }

        let mut existing = self.map_remaining_children(old);
        for (i, item) in items.iter().enumerate().skip(new_index as usize) {
            let i = i as u32;
            let Some(fiber) = self.update_from_map(&existing, parent, i, item) else {
                continue;
            };
            if self.track_side_effects && self.fibers.alternate_of(fiber).is_some() {
                let slot = match &self.fibers.key[fiber as usize] {
                    Some(key) => SlotKey::Key(key.clone()),
                    None => SlotKey::Index(i),
                };
                existing.remove(&slot);
            }
            last_placed_index = self.place_child(fiber, last_placed_index, i);
            link(self.fibers, fiber);
        }

        if self.track_side_effects {
            for (_, stale) in existing {
                self.delete_child(parent, stale);
            }
        }
        result_first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::el;
    use alloc::vec::Vec;

    fn li(key: &str) -> Node {
        el("li").key(key).child(key).into()
    }

    fn list(keys: &[&str]) -> Node {
        Node::list(keys.iter().map(|k| li(k)))
    }

    /// Mounts `children` under a fresh parent and returns the parent.
    fn mount(store: &mut FiberStore, children: &Node) -> u32 {
        let parent = store.create_from_element(&el("ul").build(), Lanes::NONE);
        let first = ChildReconciler::new(store, false, Lanes::DEFAULT).reconcile(parent, INVALID, children);
        store.child[parent as usize] = first;
        parent
    }

    /// Reconciles `children` against the committed children of `parent`.
    fn update(store: &mut FiberStore, parent: u32, children: &Node) -> u32 {
        let wip = store.create_work_in_progress(parent, Props::new());
        let current_first = store.child[parent as usize];
        let first = ChildReconciler::new(store, true, Lanes::DEFAULT).reconcile(wip, current_first, children);
        store.child[wip as usize] = first;
        wip
    }

    fn keys(store: &FiberStore, parent: u32) -> Vec<(String, bool)> {
        store
            .children(parent)
            .map(|c| {
                let key = store.key[c as usize]
                    .as_ref()
                    .map(|k| k.as_str().into())
                    .unwrap_or_default();
                (key, store.flags[c as usize].contains(Flags::PLACEMENT))
            })
            .collect()
    }

    use alloc::string::String;

    fn deletions(store: &FiberStore, parent: u32) -> Vec<String> {
        store.deletions[parent as usize]
            .iter()
            .map(|&d| {
                store.key[d as usize]
                    .as_ref()
                    .map(|k| k.as_str().into())
                    .unwrap_or_default()
            })
            .collect()
    }

    fn s(k: &str, placed: bool) -> (String, bool) {
        (k.into(), placed)
    }

    #[test]
    fn identical_children_produce_no_effects() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b", "c"]));
        let wip = update(&mut store, parent, &list(&["a", "b", "c"]));
        assert_eq!(keys(&store, wip), [s("a", false), s("b", false), s("c", false)]);
        assert!(store.deletions[wip as usize].is_empty());
        assert!(!store.flags[wip as usize].contains(Flags::CHILD_DELETION));
        for c in store.children(wip) {
            assert!(store.alternate_of(c).is_some(), "every child reused");
        }
    }

    #[test]
    fn tail_append_places_only_the_new_child() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b"]));
        let wip = update(&mut store, parent, &list(&["a", "b", "c"]));
        assert_eq!(keys(&store, wip), [s("a", false), s("b", false), s("c", true)]);
        assert!(deletions(&store, wip).is_empty());
    }

    #[test]
    fn tail_removal_deletes_the_rest() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b", "c"]));
        let wip = update(&mut store, parent, &list(&["a"]));
        assert_eq!(keys(&store, wip), [s("a", false)]);
        assert_eq!(deletions(&store, wip), ["b", "c"]);
        assert!(store.flags[wip as usize].contains(Flags::CHILD_DELETION));
    }

    #[test]
    fn moving_first_to_last_places_one_child() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b", "c"]));
        let wip = update(&mut store, parent, &list(&["b", "c", "a"]));
        assert_eq!(keys(&store, wip), [s("b", false), s("c", false), s("a", true)]);
        assert!(deletions(&store, wip).is_empty());
    }

    #[test]
    fn moving_last_to_first_places_the_overtaken_children() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b", "c"]));
        let wip = update(&mut store, parent, &list(&["c", "a", "b"]));
        // `c` sets the watermark to 2; `a` and `b` sit below it.
        assert_eq!(keys(&store, wip), [s("c", false), s("a", true), s("b", true)]);
        assert!(deletions(&store, wip).is_empty(), "nothing recreated");
        for c in store.children(wip) {
            assert!(store.alternate_of(c).is_some());
        }
    }

    #[test]
    fn middle_insert_and_delete_use_the_key_map() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b", "c", "d"]));
        let wip = update(&mut store, parent, &list(&["a", "x", "c", "d"]));
        assert_eq!(
            keys(&store, wip),
            [s("a", false), s("x", true), s("c", false), s("d", false)]
        );
        assert_eq!(deletions(&store, wip), ["b"]);
    }

    #[test]
    fn type_change_with_same_key_recreates() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &Node::from(el("li").key("a")));
        let old = store.child[parent as usize];
        let wip = update(&mut store, parent, &Node::from(el("p").key("a")));
        let new = store.child[wip as usize];
        assert_ne!(store.alternate[new as usize], old);
        assert!(store.flags[new as usize].contains(Flags::PLACEMENT));
        assert_eq!(store.deletions[wip as usize], [old]);
    }

    #[test]
    fn single_element_deletes_unmatched_siblings() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b", "c"]));
        let wip = update(&mut store, parent, &li("b"));
        assert_eq!(keys(&store, wip), [s("b", false)]);
        assert_eq!(deletions(&store, wip), ["a", "c"]);
    }

    #[test]
    fn single_text_reuses_text_fiber() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &Node::text("one"));
        let old = store.child[parent as usize];
        let wip = update(&mut store, parent, &Node::text("two"));
        let new = store.child[wip as usize];
        assert_eq!(store.alternate[new as usize], old);
        assert!(store.flags[new as usize].is_empty());
        assert_eq!(store.pending_props[new as usize].text_content().map(|t| &**t), Some("two"));
    }

    #[test]
    fn empty_children_delete_everything() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b"]));
        let wip = update(&mut store, parent, &Node::Empty);
        assert_eq!(store.child[wip as usize], INVALID);
        assert_eq!(deletions(&store, wip), ["a", "b"]);
    }

    #[test]
    fn unkeyed_top_level_fragment_is_unwrapped() {
        let mut store = FiberStore::new();
        let frag: Node = crate::element::fragment().child(li("a")).child(li("b")).into();
        let parent = mount(&mut store, &frag);
        let tags: Vec<WorkTag> = store.children(parent).map(|c| store.tag[c as usize]).collect();
        assert_eq!(tags, [WorkTag::HostComponent, WorkTag::HostComponent]);
    }

    #[test]
    fn nested_lists_become_fragments() {
        let mut store = FiberStore::new();
        let nested = Node::list([li("a"), list(&["b", "c"])]);
        let parent = mount(&mut store, &nested);
        let tags: Vec<WorkTag> = store.children(parent).map(|c| store.tag[c as usize]).collect();
        assert_eq!(tags, [WorkTag::HostComponent, WorkTag::Fragment]);
    }

    #[test]
    fn mounting_tracks_no_effects() {
        let mut store = FiberStore::new();
        let parent = mount(&mut store, &list(&["a", "b"]));
        for c in store.children(parent) {
            assert!(store.flags[c as usize].is_empty());
        }
    }
}
