// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contracts between the reconciler and its environment.
//!
//! Two traits split the environment into the pieces the core consumes:
//!
//! - [`Host`] owns the persistent output tree. Completion creates detached
//!   instances through it; the commit phase inserts, moves, removes and
//!   updates them.
//! - [`HostLoop`] is the scheduling surface: a monotonic clock, a
//!   zero-delay "run soon" message, and a single re-armable timer. The host
//!   answers a posted message by calling
//!   [`Renderer::perform_work_until_deadline`] and a fired timer by calling
//!   [`Renderer::handle_timeout`].
//!
//! [`MemoryHost`] and [`ManualLoop`] are complete in-memory implementations
//! used by tests, the harness and the demos.
//!
//! [`Renderer::perform_work_until_deadline`]: crate::renderer::Renderer::perform_work_until_deadline
//! [`Renderer::handle_timeout`]: crate::renderer::Renderer::handle_timeout

mod manual;
mod memory;

pub use manual::ManualLoop;
pub use memory::{HostChanges, HostOp, MemoryHost};

use core::fmt;

use crate::element::{Props, Value};
use crate::time::{Duration, HostTime};

/// An opaque handle to a host instance or container.
///
/// Hosts assign these; the core only stores and passes them back.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceId(pub u32);

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

/// Mutations on a persistent output tree.
///
/// Instances are created detached. `create_instance` applies the initial
/// attributes and, when `props` has direct text content, the text; later
/// changes arrive through [`set_property`](Self::set_property) and
/// [`set_text_content`](Self::set_text_content).
pub trait Host {
    /// Creates a detached element instance of `kind`.
    fn create_instance(&mut self, kind: &str, props: &Props) -> InstanceId;

    /// Creates a detached text instance.
    fn create_text_instance(&mut self, text: &str) -> InstanceId;

    /// Appends `child` as the last child of `parent`, moving it if it is
    /// already attached somewhere.
    fn append_child(&mut self, parent: InstanceId, child: InstanceId);

    /// Inserts `child` into `parent` before `before`.
    fn insert_before(&mut self, parent: InstanceId, child: InstanceId, before: InstanceId);

    /// Detaches `child` from `parent`.
    fn remove_child(&mut self, parent: InstanceId, child: InstanceId);

    /// Sets (`Some`) or removes (`None`) one attribute.
    fn set_property(&mut self, instance: InstanceId, key: &str, value: Option<&Value>);

    /// Replaces the direct text content of an element instance. The empty
    /// string clears it.
    fn set_text_content(&mut self, instance: InstanceId, text: &str);

    /// Replaces the text of a text instance.
    fn commit_text_update(&mut self, instance: InstanceId, text: &str);

    /// Called once for every host instance in a deleted subtree, after it
    /// has been detached.
    fn detach_deleted_instance(&mut self, instance: InstanceId) {
        _ = instance;
    }
}

/// The scheduler's view of the host event loop.
///
/// Methods take `&self`: the loop is shared between the scheduler and the
/// update inbox, which posts a wake-up message when an update arrives from
/// outside the renderer.
pub trait HostLoop {
    /// Reads the monotonic clock.
    fn now(&self) -> HostTime;

    /// Posts a zero-delay message. The host answers it by calling
    /// [`Renderer::perform_work_until_deadline`](crate::renderer::Renderer::perform_work_until_deadline).
    fn request_callback(&self);

    /// Arms the timer to fire after `delay`, replacing any armed timer.
    fn request_timeout(&self, delay: Duration);

    /// Disarms the timer.
    fn cancel_timeout(&self);
}
