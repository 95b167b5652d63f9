// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Entering a fiber: render it, or bail out, and reconcile its children.

use alloc::rc::Rc;
use alloc::vec;
use core::cell::RefCell;

use super::RenderPass;
use crate::context::{ContextDependency, propagate_context_change};
use crate::element::{ClassType, Component, Context, ElementType, Memo, Node, Props, Value};
use crate::error::Error;
use crate::fiber::{FiberState, INVALID, StateNode, WorkTag};
use crate::flags::Flags;
use crate::hooks::RenderCx;
use crate::host::Host;
use crate::lane::Lanes;
use crate::reconcile::ChildReconciler;
use crate::update_queue::AnyRc;

impl<H: Host> RenderPass<'_, H> {
    /// Begins work on `wip` and returns its first child to work on next, or
    /// `INVALID` if the fiber should be completed right away.
    pub(super) fn begin_work(&mut self, wip: u32) -> Result<u32, Error> {
        let w = wip as usize;
        let current = self.fibers.alternate[w];
        let update_lanes = self.fibers.lanes[w];
        let mut did_receive_update = false;

        if current != INVALID {
            let unchanged = self.fibers.memoized_props[current as usize]
                .as_ref()
                .is_some_and(|old| old.ptr_eq(&self.fibers.pending_props[w]));
            if !unchanged {
                did_receive_update = true;
            } else if !update_lanes.includes_some(self.render_lanes) {
                return Ok(self.attempt_early_bailout(current, wip));
            }
        }

        self.fibers.lanes[w] = Lanes::NONE;

        let props = self.fibers.pending_props[w].clone();
        match (self.fibers.tag[w], self.fibers.element_type[w].clone()) {
            (WorkTag::HostRoot, _) => self.update_host_root(current, wip),
            (WorkTag::HostComponent, _) => Ok(self.update_host_component(current, wip, &props)),
            (WorkTag::HostText, _) => Ok(INVALID),
            (WorkTag::Fragment, _) => Ok(self.reconcile_children(current, wip, props.children())),
            (WorkTag::FunctionComponent, Some(ElementType::Function(component))) => {
                self.update_function_component(current, wip, &component, props, did_receive_update)
            }
            (WorkTag::ClassComponent, Some(ElementType::Class(ty))) => {
                self.update_class_component(current, wip, &ty, &props, did_receive_update)
            }
            (WorkTag::ContextProvider, Some(ElementType::Provider(context))) => {
                Ok(self.update_context_provider(current, wip, &context, &props))
            }
            (WorkTag::ContextConsumer, Some(ElementType::Consumer(context))) => {
                self.update_context_consumer(current, wip, context, &props)
            }
            (WorkTag::MemoComponent, Some(ElementType::Memo(memo))) => {
                self.update_memo_component(current, wip, &memo, props, update_lanes, did_receive_update)
            }
            (WorkTag::SimpleMemoComponent, Some(ElementType::Memo(memo))) => self
                .update_simple_memo_component(current, wip, &memo, props, update_lanes, did_receive_update),
            _ => Err(Error::TagMismatch(self.fibers.id(wip))),
        }
    }

    // -- Bailout --

    /// Skips rendering a fiber whose props are unchanged and which has no
    /// work in the render lanes.
    fn attempt_early_bailout(&mut self, current: u32, wip: u32) -> u32 {
        let w = wip as usize;
        if let Some(ElementType::Provider(context)) = &self.fibers.element_type[w] {
            // Completion pops unconditionally.
            let value = provided_value(&self.fibers.pending_props[w]);
            self.contexts.push(context.clone(), value);
        }
        self.bailout_on_already_finished_work(current, wip)
    }

    /// Reuses the committed children of `wip`. Returns `INVALID` when no
    /// descendant has work in the render lanes, in which case the whole
    /// subtree is skipped.
    fn bailout_on_already_finished_work(&mut self, current: u32, wip: u32) -> u32 {
        let w = wip as usize;
        if current != INVALID {
            self.fibers.dependencies[w] = self.fibers.dependencies[current as usize].clone();
        }
        if !self.fibers.child_lanes[w].includes_some(self.render_lanes) {
            return INVALID;
        }
        self.clone_child_fibers(wip);
        self.fibers.child[w]
    }

    /// Replaces the shared committed children of `wip` with their
    /// work-in-progress counterparts.
    fn clone_child_fibers(&mut self, wip: u32) {
        let w = wip as usize;
        let mut current_child = self.fibers.child[w];
        if current_child == INVALID {
            return;
        }
        let props = self.fibers.pending_props[current_child as usize].clone();
        let mut new_child = self.fibers.create_work_in_progress(current_child, props);
        self.fibers.child[w] = new_child;
        self.fibers.parent[new_child as usize] = wip;
        loop {
            let next = self.fibers.sibling[current_child as usize];
            if next == INVALID {
                break;
            }
            current_child = next;
            let props = self.fibers.pending_props[current_child as usize].clone();
            let sibling = self.fibers.create_work_in_progress(current_child, props);
            self.fibers.sibling[new_child as usize] = sibling;
            self.fibers.parent[sibling as usize] = wip;
            new_child = sibling;
        }
        self.fibers.sibling[new_child as usize] = INVALID;
    }

    fn reconcile_children(&mut self, current: u32, wip: u32, children: &Node) -> u32 {
        let track = current != INVALID;
        let current_first = if track {
            self.fibers.child[current as usize]
        } else {
            INVALID
        };
        let first = ChildReconciler::new(self.fibers, track, self.render_lanes).reconcile(
            wip,
            current_first,
            children,
        );
        self.fibers.child[wip as usize] = first;
        first
    }

    // -- Per-tag work --

    fn update_host_root(&mut self, current: u32, wip: u32) -> Result<u32, Error> {
        debug_assert!(current != INVALID, "host root without a committed fiber");
        let (c, w) = (current as usize, wip as usize);
        let FiberState::Root(mut queue) = core::mem::take(&mut self.fibers.memoized_state[c]) else {
            return Ok(INVALID);
        };
        queue.absorb_pending();
        let previous = queue.memoized.clone();
        // Each root update carries the whole new element tree.
        let processed = queue.process(self.render_lanes, |_, element| Ok::<AnyRc, Error>(element.clone()));
        self.fibers.memoized_state[c] = FiberState::Root(queue);
        let processed = processed?;

        self.fibers.lanes[w] |= processed.skipped_lanes;
        let next = processed.next.memoized.clone();
        self.fibers.memoized_state[w] = FiberState::Root(processed.next);
        if Rc::ptr_eq(&previous, &next) {
            return Ok(self.bailout_on_already_finished_work(current, wip));
        }
        let children = next.downcast_ref::<Node>().cloned().unwrap_or_default();
        Ok(self.reconcile_children(current, wip, &children))
    }

    fn update_host_component(&mut self, current: u32, wip: u32, props: &Props) -> u32 {
        if props.text_content().is_some() {
            // Direct text is set on the instance, not built as a child.
            return self.reconcile_children(current, wip, &Node::Empty);
        }
        if current != INVALID
            && self.fibers.memoized_props[current as usize]
                .as_ref()
                .is_some_and(|old| old.text_content().is_some())
        {
            self.fibers.flags[wip as usize] |= Flags::CONTENT_RESET;
        }
        self.reconcile_children(current, wip, props.children())
    }

    fn update_function_component(
        &mut self,
        current: u32,
        wip: u32,
        component: &Component,
        props: Props,
        did_receive_update: bool,
    ) -> Result<u32, Error> {
        let w = wip as usize;
        let mut did_receive_update = did_receive_update;
        let prev = if current == INVALID {
            None
        } else {
            let c = current as usize;
            if self.contexts.has_changed(&self.fibers.dependencies[c]) {
                did_receive_update = true;
            }
            match core::mem::take(&mut self.fibers.memoized_state[c]) {
                FiberState::Hooks(hooks) => Some(hooks),
                other => {
                    self.fibers.memoized_state[c] = other;
                    None
                }
            }
        };

        let id = self.fibers.id(wip);
        let mut cx = RenderCx::new(
            id,
            self.render_lanes,
            prev,
            did_receive_update,
            self.contexts,
            self.updates,
        );
        let rendered = component.render(&mut cx, &props);
        let (prev, outcome) = cx.finish();
        if current != INVALID
            && let Some(prev) = prev
        {
            self.fibers.memoized_state[current as usize] = FiberState::Hooks(prev);
        }
        let outcome = outcome?;
        let children = rendered?;

        self.fibers.memoized_state[w] = FiberState::Hooks(outcome.hooks);
        self.fibers.dependencies[w] = outcome.dependencies;
        self.fibers.lanes[w] |= outcome.skipped_lanes;

        if current != INVALID && !outcome.did_receive_update {
            // Keep the processed state but none of this render's effects.
            let c = current as usize;
            self.fibers.effects[w] = self.fibers.effects[c].clone();
            self.fibers.flags[w].remove(Flags::PASSIVE | Flags::UPDATE);
            self.fibers.lanes[c] = self.fibers.lanes[c].remove(self.render_lanes);
            return Ok(self.bailout_on_already_finished_work(current, wip));
        }

        self.fibers.effects[w] = Some(outcome.effects.into());
        self.fibers.flags[w] |= outcome.flags;
        Ok(self.reconcile_children(current, wip, &children))
    }

    fn update_class_component(
        &mut self,
        current: u32,
        wip: u32,
        ty: &ClassType,
        props: &Props,
        did_receive_update: bool,
    ) -> Result<u32, Error> {
        let w = wip as usize;
        let instance = match &self.fibers.state_node[w] {
            StateNode::Class(instance) => instance.clone(),
            _ => {
                let instance = Rc::new(RefCell::new(ty.construct(props)));
                self.fibers.state_node[w] = StateNode::Class(instance.clone());
                instance
            }
        };

        if current != INVALID
            && !did_receive_update
            && !self.contexts.has_changed(&self.fibers.dependencies[current as usize])
        {
            return Ok(self.bailout_on_already_finished_work(current, wip));
        }

        let context = ty.context().map(|context| ContextDependency {
            context: context.clone(),
            value: self.contexts.read(context),
        });
        let rendered = instance
            .borrow_mut()
            .render(props, context.as_ref().map(|dep| &dep.value));
        self.fibers.dependencies[w] = context.into_iter().collect();
        let children = rendered?;
        Ok(self.reconcile_children(current, wip, &children))
    }

    fn update_context_provider(&mut self, current: u32, wip: u32, context: &Context, props: &Props) -> u32 {
        let value = provided_value(props);
        self.contexts.push(context.clone(), value.clone());
        if current != INVALID
            && let Some(old) = self.fibers.memoized_props[current as usize].clone()
        {
            if provided_value(&old).is_same(&value) {
                if old.children().is_same(props.children()) {
                    return self.bailout_on_already_finished_work(current, wip);
                }
            } else {
                propagate_context_change(self.fibers, wip, context, self.render_lanes);
            }
        }
        self.reconcile_children(current, wip, props.children())
    }

    fn update_context_consumer(
        &mut self,
        current: u32,
        wip: u32,
        context: Context,
        props: &Props,
    ) -> Result<u32, Error> {
        let value = self.contexts.read(&context);
        let children = match props.render_prop() {
            Some(render) => render.call(&value)?,
            None => Node::Empty,
        };
        self.fibers.dependencies[wip as usize] = vec![ContextDependency { context, value }];
        Ok(self.reconcile_children(current, wip, &children))
    }

    fn update_memo_component(
        &mut self,
        current: u32,
        wip: u32,
        memo: &Memo,
        props: Props,
        update_lanes: Lanes,
        did_receive_update: bool,
    ) -> Result<u32, Error> {
        let w = wip as usize;
        if !memo.has_compare() {
            self.fibers.tag[w] = WorkTag::SimpleMemoComponent;
            return self.update_simple_memo_component(
                current,
                wip,
                memo,
                props,
                update_lanes,
                did_receive_update,
            );
        }

        let current_child = if current == INVALID {
            INVALID
        } else {
            self.fibers.child[current as usize]
        };
        if current_child != INVALID && !update_lanes.includes_some(self.render_lanes) {
            let equal = self.fibers.memoized_props[current_child as usize]
                .as_ref()
                .is_some_and(|prev| memo.props_equal(prev, &props));
            if equal {
                return Ok(self.bailout_on_already_finished_work(current, wip));
            }
        }

        let child = if current_child == INVALID {
            let inner = ElementType::Function(memo.inner().clone());
            let child = self.fibers.create_from_type(inner, props, self.render_lanes);
            if current != INVALID {
                self.fibers.flags[child as usize] |= Flags::PLACEMENT;
            }
            child
        } else {
            self.fibers.create_work_in_progress(current_child, props)
        };
        let ch = child as usize;
        self.fibers.index[ch] = 0;
        self.fibers.sibling[ch] = INVALID;
        self.fibers.parent[ch] = wip;
        self.fibers.child[w] = child;
        Ok(child)
    }

    fn update_simple_memo_component(
        &mut self,
        current: u32,
        wip: u32,
        memo: &Memo,
        props: Props,
        update_lanes: Lanes,
        did_receive_update: bool,
    ) -> Result<u32, Error> {
        let mut props = props;
        let mut did_receive_update = did_receive_update;
        if current != INVALID
            && let Some(prev) = self.fibers.memoized_props[current as usize].clone()
            && memo.props_equal(&prev, &props)
        {
            // Equal props count as the same props from here on.
            did_receive_update = false;
            self.fibers.pending_props[wip as usize] = prev.clone();
            props = prev;
            if !update_lanes.includes_some(self.render_lanes) {
                self.fibers.lanes[wip as usize] = update_lanes;
                return Ok(self.bailout_on_already_finished_work(current, wip));
            }
        }
        let inner = memo.inner().clone();
        self.update_function_component(current, wip, &inner, props, did_receive_update)
    }
}

fn provided_value(props: &Props) -> Value {
    props.get("value").cloned().unwrap_or(Value::Null)
}
