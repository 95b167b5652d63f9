// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The fiber tree.
//!
//! A fiber is the unit of reconciliation work. Fibers live in a
//! struct-of-arrays arena ([`FiberStore`]) and link to each other by slot
//! index: `parent`, `child` and `sibling` form the tree, and `alternate`
//! pairs each committed fiber with its work-in-progress counterpart. Two
//! generations therefore coexist: the *current* tree mirrors what the host
//! shows, and the work-in-progress tree is built from it, sharing untouched
//! subtrees by index.
//!
//! Outside the crate fibers are addressed with generational [`FiberId`]
//! handles. Update dispatchers hold one; once the fiber is reclaimed the
//! handle goes stale and dispatching through it does nothing.

mod id;
mod store;
mod traverse;

pub use id::FiberId;
pub(crate) use id::INVALID;
pub(crate) use store::{EffectList, FiberStore};
pub(crate) use traverse::Children;

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use crate::element::{ClassComponent, Value};
use crate::hooks::Hook;
use crate::host::InstanceId;
use crate::root::RootId;
use crate::update_queue::QueueState;

/// The kind of a fiber.
///
/// The set is closed: every fiber the reconciler creates is one of these,
/// so dispatch on the tag is exhaustive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkTag {
    /// The entry fiber of a root.
    HostRoot,
    /// A host element.
    HostComponent,
    /// A host text node.
    HostText,
    /// A function component.
    FunctionComponent,
    /// A class component.
    ClassComponent,
    /// Supplies a context value.
    ContextProvider,
    /// Reads a context value through a render callback.
    ContextConsumer,
    /// A memo wrapper with a custom comparator; its child is the wrapped
    /// component.
    MemoComponent,
    /// A memo wrapper without a comparator; renders the wrapped function
    /// directly.
    SimpleMemoComponent,
    /// A transparent group of children.
    Fragment,
}

impl WorkTag {
    /// Returns `true` for tags whose fiber owns a host instance.
    #[must_use]
    pub const fn is_host(self) -> bool {
        matches!(self, Self::HostComponent | Self::HostText)
    }

    /// Returns `true` for tags that can be the parent of host instances.
    #[must_use]
    pub const fn is_host_parent(self) -> bool {
        matches!(self, Self::HostComponent | Self::HostRoot)
    }

    /// Returns `true` for tags that run hooks.
    #[must_use]
    pub const fn has_hooks(self) -> bool {
        matches!(self, Self::FunctionComponent | Self::SimpleMemoComponent)
    }
}

/// What a fiber is attached to outside the tree.
#[derive(Clone, Default)]
pub(crate) enum StateNode {
    #[default]
    None,
    Host(InstanceId),
    Root(RootId),
    Class(Rc<RefCell<Box<dyn ClassComponent>>>),
}

impl StateNode {
    pub(crate) const fn instance(&self) -> Option<InstanceId> {
        match self {
            Self::Host(id) => Some(*id),
            _ => None,
        }
    }
}

impl fmt::Debug for StateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Host(id) => write!(f, "{id:?}"),
            Self::Root(id) => write!(f, "{id:?}"),
            Self::Class(_) => f.write_str("Class"),
        }
    }
}

/// Memoized state of a fiber.
#[derive(Clone, Debug, Default)]
pub(crate) enum FiberState {
    #[default]
    None,
    /// Hook list of a function component, in call order.
    Hooks(Vec<Hook>),
    /// Element queue of a root.
    Root(QueueState),
}

/// Attribute and text changes computed for a host element during
/// completion and applied in the commit phase.
#[derive(Clone, Debug, Default)]
pub(crate) struct HostUpdate {
    /// Attributes to set (`Some`) or remove (`None`).
    pub(crate) attrs: Vec<(Rc<str>, Option<Value>)>,
    /// New direct text content.
    pub(crate) text: Option<Rc<str>>,
}

impl HostUpdate {
    pub(crate) fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.text.is_none()
    }
}
