// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host tree.
//!
//! [`MemoryHost`] keeps instances in struct-of-arrays storage with intrusive
//! sibling links, logs every [`Host`] call as a [`HostOp`], and tracks which
//! instances changed on three dirty channels:
//!
//! - [`PROPS`] is marked when an attribute is set or removed.
//! - [`TEXT`] is marked when text content or a text instance changes.
//! - [`TOPOLOGY`] is marked on the parent whenever its child list changes.
//!
//! [`MemoryHost::take_changes`] drains all three channels into a
//! [`HostChanges`] snapshot, the way a platform presenter would consume
//! incremental updates.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

use understory_dirty::{Channel, CycleHandling, DirtyTracker};

use super::{Host, InstanceId};
use crate::element::{Callback, Props, Value};

const INVALID: u32 = u32::MAX;

/// An attribute was set or removed.
pub const PROPS: Channel = Channel::new(0);

/// Text content changed.
pub const TEXT: Channel = Channel::new(1);

/// The instance's child list changed.
pub const TOPOLOGY: Channel = Channel::new(2);

/// One recorded host call.
#[derive(Clone, Debug)]
pub enum HostOp {
    /// `create_instance`.
    Create {
        /// New instance.
        id: InstanceId,
        /// Element kind.
        kind: Rc<str>,
    },
    /// `create_text_instance`.
    CreateText {
        /// New instance.
        id: InstanceId,
        /// Initial text.
        text: Rc<str>,
    },
    /// `append_child`.
    Append {
        /// Parent instance.
        parent: InstanceId,
        /// Appended child.
        child: InstanceId,
    },
    /// `insert_before`.
    InsertBefore {
        /// Parent instance.
        parent: InstanceId,
        /// Inserted child.
        child: InstanceId,
        /// Reference sibling.
        before: InstanceId,
    },
    /// `remove_child`.
    Remove {
        /// Parent instance.
        parent: InstanceId,
        /// Removed child.
        child: InstanceId,
    },
    /// `set_property`.
    SetProperty {
        /// Target instance.
        id: InstanceId,
        /// Attribute name.
        key: Rc<str>,
        /// New value, `None` when removed.
        value: Option<Value>,
    },
    /// `set_text_content`.
    SetText {
        /// Target instance.
        id: InstanceId,
        /// New text.
        text: Rc<str>,
    },
    /// `commit_text_update`.
    UpdateText {
        /// Target text instance.
        id: InstanceId,
        /// New text.
        text: Rc<str>,
    },
    /// `detach_deleted_instance`.
    Detach {
        /// Released instance.
        id: InstanceId,
    },
}

impl HostOp {
    /// Returns `true` for operations that change tree structure.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::Append { .. } | Self::InsertBefore { .. } | Self::Remove { .. }
        )
    }
}

/// Instances that changed since the last [`MemoryHost::take_changes`].
#[derive(Clone, Debug, Default)]
pub struct HostChanges {
    /// Instances with attribute changes.
    pub props: Vec<InstanceId>,
    /// Instances with text changes.
    pub text: Vec<InstanceId>,
    /// Instances whose child list changed.
    pub topology: Vec<InstanceId>,
}

impl HostChanges {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty() && self.text.is_empty() && self.topology.is_empty()
    }
}

/// A complete [`Host`] backed by plain memory.
#[derive(Debug)]
pub struct MemoryHost {
    // -- Topology --
    parent: Vec<u32>,
    first_child: Vec<u32>,
    next_sibling: Vec<u32>,
    prev_sibling: Vec<u32>,

    // -- Content --
    /// `None` marks a text instance.
    kind: Vec<Option<Rc<str>>>,
    text: Vec<Option<Rc<str>>>,
    attrs: Vec<BTreeMap<Rc<str>, Value>>,

    // -- Allocation --
    live: Vec<bool>,
    free_list: Vec<u32>,

    dirty: DirtyTracker<u32>,
    ops: Vec<HostOp>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            kind: Vec::new(),
            text: Vec::new(),
            attrs: Vec::new(),
            live: Vec::new(),
            free_list: Vec::new(),
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            ops: Vec::new(),
        }
    }

    /// Creates a container to mount a root into.
    pub fn create_container(&mut self) -> InstanceId {
        InstanceId(self.alloc(Some(Rc::from("#root")), None))
    }

    // -- Inspection --

    /// Returns `true` if `id` refers to a live instance.
    #[must_use]
    pub fn is_live(&self, id: InstanceId) -> bool {
        self.live.get(id.0 as usize).copied().unwrap_or(false)
    }

    /// Number of live instances, containers included.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.iter().filter(|l| **l).count()
    }

    /// The element kind, or `None` for text instances.
    #[must_use]
    pub fn kind(&self, id: InstanceId) -> Option<&str> {
        self.validate(id);
        self.kind[id.0 as usize].as_deref()
    }

    /// Text of a text instance, or direct text content of an element.
    #[must_use]
    pub fn text(&self, id: InstanceId) -> Option<&str> {
        self.validate(id);
        self.text[id.0 as usize].as_deref()
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn prop(&self, id: InstanceId, key: &str) -> Option<&Value> {
        self.validate(id);
        self.attrs[id.0 as usize].get(key)
    }

    /// Looks up a handler attribute.
    #[must_use]
    pub fn handler(&self, id: InstanceId, key: &str) -> Option<Callback> {
        self.prop(id, key).and_then(Value::as_callback).cloned()
    }

    /// The parent of an attached instance.
    #[must_use]
    pub fn parent(&self, id: InstanceId) -> Option<InstanceId> {
        self.validate(id);
        let p = self.parent[id.0 as usize];
        (p != INVALID).then_some(InstanceId(p))
    }

    /// Iterates the children of an instance in order.
    pub fn children(&self, id: InstanceId) -> impl Iterator<Item = InstanceId> + '_ {
        self.validate(id);
        let mut current = self.first_child[id.0 as usize];
        core::iter::from_fn(move || {
            if current == INVALID {
                return None;
            }
            let idx = current;
            current = self.next_sibling[idx as usize];
            Some(InstanceId(idx))
        })
    }

    /// Finds the first descendant of `root` (pre-order) whose attribute
    /// `key` equals `value`.
    #[must_use]
    pub fn find_by_prop(&self, root: InstanceId, key: &str, value: &Value) -> Option<InstanceId> {
        let mut stack: Vec<InstanceId> = self.children(root).collect();
        stack.reverse();
        while let Some(id) = stack.pop() {
            if self.attrs[id.0 as usize].get(key).is_some_and(|v| v.is_same(value)) {
                return Some(id);
            }
            let first = stack.len();
            stack.extend(self.children(id));
            stack[first..].reverse();
        }
        None
    }

    /// Renders the children of `id` as markup.
    ///
    /// Elements print as `<kind attr="value">…</kind>` with attributes in key
    /// order; handler attributes are omitted.
    #[must_use]
    pub fn markup(&self, id: InstanceId) -> String {
        let mut out = String::new();
        for child in self.children(id) {
            self.write_markup(child, &mut out);
        }
        out
    }

    /// Renders `id` itself, including its own tag.
    #[must_use]
    pub fn outer_markup(&self, id: InstanceId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    /// All recorded host calls since the last [`take_ops`](Self::take_ops).
    #[must_use]
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Takes the recorded host calls.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        core::mem::take(&mut self.ops)
    }

    /// Drains the dirty channels.
    pub fn take_changes(&mut self) -> HostChanges {
        let collect = |dirty: &mut DirtyTracker<u32>, ch: Channel| -> Vec<InstanceId> {
            dirty
                .drain(ch)
                .deterministic()
                .run()
                .map(InstanceId)
                .collect()
        };
        HostChanges {
            props: collect(&mut self.dirty, PROPS),
            text: collect(&mut self.dirty, TEXT),
            topology: collect(&mut self.dirty, TOPOLOGY),
        }
    }

    // -- Internals --

    fn validate(&self, id: InstanceId) {
        assert!(self.is_live(id), "stale InstanceId");
    }

    fn alloc(&mut self, kind: Option<Rc<str>>, text: Option<Rc<str>>) -> u32 {
        if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.kind[i] = kind;
            self.text[i] = text;
            self.attrs[i].clear();
            self.live[i] = true;
            idx
        } else {
            let idx = u32::try_from(self.live.len()).unwrap_or(INVALID);
            assert!(idx != INVALID, "instance arena is full");
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.kind.push(kind);
            self.text.push(text);
            self.attrs.push(BTreeMap::new());
            self.live.push(true);
            idx
        }
    }

    fn unlink(&mut self, c: u32) {
        let p = self.parent[c as usize];
        if p == INVALID {
            return;
        }
        let prev = self.prev_sibling[c as usize];
        let next = self.next_sibling[c as usize];
        if prev == INVALID {
            self.first_child[p as usize] = next;
        } else {
            self.next_sibling[prev as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }
        self.parent[c as usize] = INVALID;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;
        self.dirty.mark(p, TOPOLOGY);
    }

    fn write_markup(&self, id: InstanceId, out: &mut String) {
        let i = id.0 as usize;
        let Some(kind) = &self.kind[i] else {
            out.push_str(self.text[i].as_deref().unwrap_or(""));
            return;
        };
        out.push('<');
        out.push_str(kind);
        for (k, v) in &self.attrs[i] {
            if matches!(v, Value::Callback(_)) {
                continue;
            }
            _ = write!(out, " {k}=\"{v}\"");
        }
        out.push('>');
        if let Some(text) = &self.text[i] {
            out.push_str(text);
        }
        for child in self.children(id) {
            self.write_markup(child, out);
        }
        out.push_str("</");
        out.push_str(kind);
        out.push('>');
    }
}

impl Host for MemoryHost {
    fn create_instance(&mut self, kind: &str, props: &Props) -> InstanceId {
        let kind: Rc<str> = Rc::from(kind);
        let idx = self.alloc(Some(kind.clone()), props.text_content().cloned());
        let id = InstanceId(idx);
        self.ops.push(HostOp::Create { id, kind });
        for (k, v) in props.attrs() {
            self.attrs[idx as usize].insert(k.clone(), v.clone());
        }
        id
    }

    fn create_text_instance(&mut self, text: &str) -> InstanceId {
        let text: Rc<str> = Rc::from(text);
        let id = InstanceId(self.alloc(None, Some(text.clone())));
        self.ops.push(HostOp::CreateText { id, text });
        id
    }

    fn append_child(&mut self, parent: InstanceId, child: InstanceId) {
        self.validate(parent);
        self.validate(child);
        let (p, c) = (parent.0, child.0);
        self.unlink(c);
        self.parent[c as usize] = p;
        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
        self.dirty.mark(p, TOPOLOGY);
        self.ops.push(HostOp::Append { parent, child });
    }

    fn insert_before(&mut self, parent: InstanceId, child: InstanceId, before: InstanceId) {
        self.validate(parent);
        self.validate(child);
        self.validate(before);
        let (p, c, s) = (parent.0, child.0, before.0);
        assert!(
            self.parent[s as usize] == p,
            "reference node is not a child of the parent"
        );
        self.unlink(c);
        let prev = self.prev_sibling[s as usize];
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = prev;
        self.prev_sibling[s as usize] = c;
        if prev == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[prev as usize] = c;
        }
        self.dirty.mark(p, TOPOLOGY);
        self.ops.push(HostOp::InsertBefore {
            parent,
            child,
            before,
        });
    }

    fn remove_child(&mut self, parent: InstanceId, child: InstanceId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.0 as usize] == parent.0,
            "node is not a child of the parent"
        );
        self.unlink(child.0);
        self.ops.push(HostOp::Remove { parent, child });
    }

    fn set_property(&mut self, instance: InstanceId, key: &str, value: Option<&Value>) {
        self.validate(instance);
        let key: Rc<str> = Rc::from(key);
        let attrs = &mut self.attrs[instance.0 as usize];
        match value {
            Some(v) => {
                attrs.insert(key.clone(), v.clone());
            }
            None => {
                attrs.remove(&key);
            }
        }
        self.dirty.mark(instance.0, PROPS);
        self.ops.push(HostOp::SetProperty {
            id: instance,
            key,
            value: value.cloned(),
        });
    }

    fn set_text_content(&mut self, instance: InstanceId, text: &str) {
        self.validate(instance);
        let i = instance.0 as usize;
        // Like the DOM, text content replaces any children.
        while self.first_child[i] != INVALID {
            let c = self.first_child[i];
            self.unlink(c);
        }
        self.text[i] = (!text.is_empty()).then(|| Rc::from(text));
        self.dirty.mark(instance.0, TEXT);
        self.ops.push(HostOp::SetText {
            id: instance,
            text: Rc::from(text),
        });
    }

    fn commit_text_update(&mut self, instance: InstanceId, text: &str) {
        self.validate(instance);
        let text: Rc<str> = Rc::from(text);
        self.text[instance.0 as usize] = Some(text.clone());
        self.dirty.mark(instance.0, TEXT);
        self.ops.push(HostOp::UpdateText { id: instance, text });
    }

    fn detach_deleted_instance(&mut self, instance: InstanceId) {
        if !self.is_live(instance) {
            return;
        }
        let idx = instance.0;
        self.unlink(idx);
        // Children of a deleted instance are detached with it.
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            let next = self.next_sibling[child as usize];
            self.parent[child as usize] = INVALID;
            self.prev_sibling[child as usize] = INVALID;
            self.next_sibling[child as usize] = INVALID;
            child = next;
        }
        self.first_child[idx as usize] = INVALID;
        self.live[idx as usize] = false;
        self.dirty.remove_key(idx);
        self.free_list.push(idx);
        self.ops.push(HostOp::Detach { id: instance });
    }
}
