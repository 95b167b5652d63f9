// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Two families exist. [`ComponentError`] is produced by user code: render
//! functions, effect thunks, cleanups and event handlers. [`Error`] is what
//! the renderer surfaces to its driver: either an internal invariant
//! violation (the pass is aborted and nothing is committed) or the first
//! component error caught during a batch.

use alloc::borrow::Cow;
use alloc::string::String;

use thiserror::Error;

use crate::fiber::FiberId;
use crate::root::RootId;

/// An error raised by user code running under the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ComponentError {
    message: Cow<'static, str>,
}

impl ComponentError {
    /// Creates an error with the given message.
    #[must_use]
    pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&'static str> for ComponentError {
    fn from(message: &'static str) -> Self {
        Self::new(message)
    }
}

impl From<String> for ComponentError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Errors surfaced by the renderer.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// A placed or deleted fiber has no host-bearing ancestor.
    #[error("no host parent above {0:?}")]
    MissingHostParent(FiberId),
    /// A hook call at `position` is of a different kind than the call at the
    /// same position during the previous render.
    #[error("hook {position} changed from {expected} to {found} between renders")]
    HookMismatch {
        /// Zero-based call position within the component.
        position: usize,
        /// Kind recorded by the previous render.
        expected: &'static str,
        /// Kind requested by this render.
        found: &'static str,
    },
    /// A component called a different number of hooks than in its previous
    /// render.
    #[error("rendered {current} hooks, previous render used {previous}")]
    HookCountMismatch {
        /// Hook count of the previous render.
        previous: usize,
        /// Hook count of this render.
        current: usize,
    },
    /// A fiber's tag does not agree with the type of the element it holds.
    #[error("fiber {0:?} has a tag that does not match its element type")]
    TagMismatch(FiberId),
    /// The root handle does not name a mounted root.
    #[error("{0:?} is not mounted")]
    StaleRoot(RootId),
    /// A component, effect or handler failed.
    #[error(transparent)]
    Component(#[from] ComponentError),
}
