// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Exiting a fiber: host instances, prop diffs and bubbling.

use super::RenderPass;
use crate::element::{ElementType, Props};
use crate::fiber::{HostUpdate, INVALID, StateNode, WorkTag};
use crate::flags::Flags;
use crate::host::Host;
use crate::lane::Lanes;

impl<H: Host> RenderPass<'_, H> {
    /// Completes `wip` once all of its children have completed.
    pub(super) fn complete_work(&mut self, wip: u32) {
        let current = self.fibers.alternate[wip as usize];
        match self.fibers.tag[wip as usize] {
            WorkTag::HostComponent => self.complete_host_component(current, wip),
            WorkTag::HostText => self.complete_host_text(current, wip),
            WorkTag::ContextProvider => self.contexts.pop(),
            WorkTag::HostRoot
            | WorkTag::FunctionComponent
            | WorkTag::ClassComponent
            | WorkTag::ContextConsumer
            | WorkTag::MemoComponent
            | WorkTag::SimpleMemoComponent
            | WorkTag::Fragment => {}
        }
        self.bubble_properties(current, wip);
    }

    fn complete_host_component(&mut self, current: u32, wip: u32) {
        let w = wip as usize;
        let props = self.fibers.pending_props[w].clone();

        if current != INVALID && self.fibers.state_node[w].instance().is_some() {
            let old = self.fibers.memoized_props[current as usize]
                .clone()
                .unwrap_or_default();
            if !old.ptr_eq(&props) {
                let payload = diff_props(&old, &props);
                if !payload.is_empty() {
                    self.fibers.update_payload[w] = Some(payload);
                    self.fibers.flags[w] |= Flags::UPDATE;
                }
            }
            return;
        }

        let Some(ElementType::Host(kind)) = self.fibers.element_type[w].clone() else {
            return;
        };
        // Attributes and direct text are applied by the host on creation.
        let instance = self.host.create_instance(&kind, &props);
        for child in self.fibers.top_host_fibers(wip) {
            if let Some(child_instance) = self.fibers.state_node[child as usize].instance() {
                self.host.append_child(instance, child_instance);
            }
        }
        self.fibers.state_node[w] = StateNode::Host(instance);
    }

    fn complete_host_text(&mut self, current: u32, wip: u32) {
        let w = wip as usize;
        let text = self.fibers.pending_props[w]
            .text_content()
            .cloned()
            .unwrap_or_default();

        if current != INVALID && self.fibers.state_node[w].instance().is_some() {
            let changed = self.fibers.memoized_props[current as usize]
                .as_ref()
                .and_then(Props::text_content)
                != Some(&text);
            if changed {
                self.fibers.flags[w] |= Flags::UPDATE;
            }
            return;
        }

        let instance = self.host.create_text_instance(&text);
        self.fibers.state_node[w] = StateNode::Host(instance);
    }

    /// Folds the children's lanes and flags into `wip`.
    ///
    /// When the children are still the committed ones, their flags belong to
    /// an earlier commit and only lanes are folded.
    fn bubble_properties(&mut self, current: u32, wip: u32) {
        let w = wip as usize;
        let did_bailout =
            current != INVALID && self.fibers.child[current as usize] == self.fibers.child[w];
        let mut child_lanes = Lanes::NONE;
        let mut subtree_flags = Flags::empty();
        let mut child = self.fibers.child[w];
        while child != INVALID {
            let c = child as usize;
            child_lanes |= self.fibers.lanes[c] | self.fibers.child_lanes[c];
            if !did_bailout {
                subtree_flags |= self.fibers.subtree_flags[c] | self.fibers.flags[c];
            }
            self.fibers.parent[c] = wip;
            child = self.fibers.sibling[c];
        }
        self.fibers.child_lanes[w] = child_lanes;
        self.fibers.subtree_flags[w] = subtree_flags;
    }
}

/// Attribute and direct-text changes from `old` to `new`.
pub(crate) fn diff_props(old: &Props, new: &Props) -> HostUpdate {
    let mut update = HostUpdate::default();
    for (key, _) in old.attrs() {
        if new.get(key).is_none() {
            update.attrs.push((key.clone(), None));
        }
    }
    for (key, value) in new.attrs() {
        if !old.get(key).is_some_and(|prev| prev.is_same(value)) {
            update.attrs.push((key.clone(), Some(value.clone())));
        }
    }
    if let Some(text) = new.text_content()
        && old.text_content() != Some(text)
    {
        update.text = Some(text.clone());
    }
    update
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::el;

    fn props(builder: crate::element::ElementBuilder) -> Props {
        builder.build().props().clone()
    }

    #[test]
    fn unchanged_props_produce_an_empty_payload() {
        let a = props(el("div").prop("id", "x").child("hi"));
        let b = props(el("div").prop("id", "x").child("hi"));
        assert!(diff_props(&a, &b).is_empty());
    }

    #[test]
    fn removed_added_and_changed_attributes() {
        let a = props(el("div").prop("id", "x").prop("gone", 1));
        let b = props(el("div").prop("id", "y").prop("new", true));
        let update = diff_props(&a, &b);
        let keys: alloc::vec::Vec<(&str, bool)> = update
            .attrs
            .iter()
            .map(|(k, v)| (&**k, v.is_some()))
            .collect();
        assert_eq!(keys, [("gone", false), ("id", true), ("new", true)]);
        assert!(update.text.is_none());
    }

    #[test]
    fn changed_direct_text_is_carried() {
        let a = props(el("p").child("one"));
        let b = props(el("p").child("two"));
        assert_eq!(diff_props(&a, &b).text.as_deref(), Some("two"));
    }

    #[test]
    fn dropping_direct_text_is_left_to_content_reset() {
        let a = props(el("p").child("one"));
        let b = props(el("p").child(el("b")));
        assert!(diff_props(&a, &b).is_empty());
    }
}
