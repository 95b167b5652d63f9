// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Context values during a render pass.
//!
//! Providers push their value when their fiber is entered and pop it when
//! it completes, so the stack always reflects the providers above the
//! current unit of work. Readers record what they saw as a
//! [`ContextDependency`]; a later render compares the recorded values with
//! the stack to decide whether the reader must re-render.

use alloc::vec::Vec;

use crate::element::{Context, ElementType, Value};
use crate::fiber::{FiberStore, INVALID};
use crate::lane::Lanes;

/// A context read recorded on a fiber.
#[derive(Clone, Debug)]
pub(crate) struct ContextDependency {
    pub(crate) context: Context,
    pub(crate) value: Value,
}

/// Provider values in effect for the current unit of work.
#[derive(Debug, Default)]
pub(crate) struct ContextStack {
    entries: Vec<(Context, Value)>,
}

impl ContextStack {
    pub(crate) fn push(&mut self, context: Context, value: Value) {
        self.entries.push((context, value));
    }

    pub(crate) fn pop(&mut self) {
        let popped = self.entries.pop();
        debug_assert!(popped.is_some(), "context stack underflow");
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn depth(&self) -> usize {
        self.entries.len()
    }

    /// The innermost provided value, or the context default.
    pub(crate) fn read(&self, context: &Context) -> Value {
        self.entries
            .iter()
            .rev()
            .find(|(c, _)| c.ptr_eq(context))
            .map_or_else(|| context.default_value().clone(), |(_, v)| v.clone())
    }

    /// Returns `true` if any recorded read would now see a different value.
    pub(crate) fn has_changed(&self, deps: &[ContextDependency]) -> bool {
        deps.iter()
            .any(|dep| !self.read(&dep.context).is_same(&dep.value))
    }
}

/// Schedules every reader of `context` below `provider` at `render_lanes`.
///
/// The walk follows the children the provider had before reconciliation.
/// It does not descend into nested providers of the same context. Each
/// reader gets the render lanes, and the path from the reader up to the
/// provider gets them as child lanes, on both generations, so the readers
/// are reached even through ancestors that bail out.
pub(crate) fn propagate_context_change(
    fibers: &mut FiberStore,
    provider: u32,
    context: &Context,
    render_lanes: Lanes,
) {
    let provider_alt = fibers.alternate[provider as usize];
    let mut stack: Vec<u32> = fibers.child_list(provider);
    while let Some(idx) = stack.pop() {
        let i = idx as usize;
        let reads = fibers.dependencies[i]
            .iter()
            .any(|dep| dep.context.ptr_eq(context));
        if reads {
            fibers.lanes[i] |= render_lanes;
            let alt = fibers.alternate[i];
            if alt != INVALID {
                fibers.lanes[alt as usize] |= render_lanes;
            }
            let parent = fibers.parent[i];
            schedule_work_on_parent_path(fibers, parent, provider, provider_alt, render_lanes);
        }
        let nested = matches!(
            &fibers.element_type[i],
            Some(ElementType::Provider(c)) if c.ptr_eq(context)
        );
        if !nested {
            stack.extend(fibers.children(idx));
        }
    }
}

fn schedule_work_on_parent_path(
    fibers: &mut FiberStore,
    mut node: u32,
    provider: u32,
    provider_alt: u32,
    lanes: Lanes,
) {
    while node != INVALID && node != provider && node != provider_alt {
        let i = node as usize;
        fibers.child_lanes[i] |= lanes;
        let alt = fibers.alternate[i];
        if alt != INVALID {
            fibers.child_lanes[alt as usize] |= lanes;
        }
        node = fibers.parent[i];
    }
    if node != INVALID {
        fibers.child_lanes[node as usize] |= lanes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn innermost_provider_wins() {
        let theme = Context::new("theme", "light");
        let mut stack = ContextStack::default();
        assert_eq!(stack.read(&theme).as_str(), Some("light"));

        stack.push(theme.clone(), Value::from("dark"));
        stack.push(theme.clone(), Value::from("blue"));
        assert_eq!(stack.read(&theme).as_str(), Some("blue"));
        stack.pop();
        assert_eq!(stack.read(&theme).as_str(), Some("dark"));
        assert_eq!(stack.depth(), 1);
    }

    #[test]
    fn unrelated_contexts_do_not_shadow() {
        let a = Context::new("a", 1);
        let b = Context::new("a", 2);
        let mut stack = ContextStack::default();
        stack.push(a.clone(), Value::from(10));
        assert_eq!(stack.read(&b).as_int(), Some(2), "same name, different context");
        assert_eq!(stack.read(&a).as_int(), Some(10));
    }

    #[test]
    fn recorded_reads_detect_changes() {
        let ctx = Context::new("n", 0);
        let mut stack = ContextStack::default();
        stack.push(ctx.clone(), Value::from(1));
        let deps = [ContextDependency {
            context: ctx.clone(),
            value: Value::from(1),
        }];
        assert!(!stack.has_changed(&deps));
        stack.pop();
        stack.push(ctx, Value::from(2));
        assert!(stack.has_changed(&deps));
    }
}
