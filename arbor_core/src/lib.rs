// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental UI-tree reconciliation with prioritized, interruptible work.
//!
//! `arbor_core` turns element descriptions into minimal mutations of a host
//! tree. It is `no_std` compatible (with `alloc`) and keeps the fiber tree in
//! array-based struct-of-arrays storage addressed by index handles.
//!
//! # Architecture
//!
//! Updates flow from dispatch sites through the scheduler into a render and
//! a commit:
//!
//! ```text
//!   render() / SetState::set() / dispatch_event()
//!       │   lane from the dispatch site
//!       ▼
//!   update queues ──► mark lanes to root ──► root task (Scheduler)
//!                                                 │
//!                 ┌───────────────────────────────┘
//!                 ▼
//!   begin/complete work loop (yields between units)
//!                 │
//!                 ▼
//!   commit: mutation pass ──► layout effects ──► Host
//!                 │
//!                 ▼
//!   passive effects (separate task)
//! ```
//!
//! **[`lane`]** and **[`priority`]**: update priorities as bitsets, and the
//! mapping between event priorities, lanes and scheduler priorities.
//!
//! **[`scheduler`]**: a cooperative task scheduler over a [`heap`] of
//! ready and delayed tasks. It runs tasks until its frame interval is used
//! up and then hands control back to the host event loop.
//!
//! **[`fiber`]**: the struct-of-arrays fiber arena with two generations
//! per fiber (current and work-in-progress) and generational handles.
//!
//! **[`element`]**: element descriptions, components, contexts and memo
//! wrappers, with a builder API ([`el`](element::el)).
//!
//! **[`hooks`]**: per-component state ([`RenderCx`](hooks::RenderCx)):
//! state, reducers, memos, refs, effects and context reads.
//!
//! **[`renderer`]**: the [`Renderer`](renderer::Renderer) that owns roots,
//! drives renders and commits, and applies mutations through a
//! [`Host`](host::Host).
//!
//! **[`host`]**: the host tree and event-loop contracts, with an in-memory
//! host and a manually driven loop for tests.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! scheduling and commit instrumentation, with a zero-overhead
//! [`Tracer`](trace::Tracer) wrapper.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use arbor_core::element::{Component, el};
//! use arbor_core::host::{ManualLoop, MemoryHost};
//! use arbor_core::renderer::Renderer;
//!
//! let host_loop = ManualLoop::new();
//! let mut host = MemoryHost::new();
//! let container = host.create_container();
//! let mut renderer = Renderer::new(host, Rc::new(host_loop.clone()));
//!
//! let greeting = Component::new("Greeting", |cx, props| {
//!     let (name, _set) = cx.use_state(|| "world");
//!     let punct = props.get("punct").and_then(|v| v.as_str()).unwrap_or("!");
//!     Ok(el("p").child(format!("hello {name}{punct}")).into_node())
//! });
//! renderer.mount(container, greeting.element().prop("punct", "?"));
//! renderer.run_until_idle().unwrap();
//! assert_eq!(renderer.host().markup(container), "<p>hello world?</p>");
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-fiber
//!   mutation events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;
#[cfg(test)]
extern crate std;

pub mod element;
pub mod error;
pub mod fiber;
pub mod flags;
pub mod guard;
pub mod heap;
pub mod hooks;
pub mod host;
pub mod lane;
pub mod priority;
pub mod renderer;
pub mod root;
pub mod scheduler;
pub mod time;
pub mod trace;
pub mod updates;

mod commit;
mod context;
mod reconcile;
mod update_queue;
mod work;

pub use error::{ComponentError, Error};
pub use lane::{Lane, Lanes};
pub use renderer::{Renderer, RendererConfig};
pub use root::RootId;
