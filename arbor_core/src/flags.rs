// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Effect flags carried by fibers and effect records.

use bitflags::bitflags;

bitflags! {
    /// Side effects a fiber needs applied during commit.
    ///
    /// Per-pass flags are cleared when a fiber is cloned into a new
    /// work-in-progress generation. `subtree_flags` on a fiber is the union of
    /// the flags of everything below it.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Insert, or move, the fiber's host nodes.
        const PLACEMENT = 1 << 1;
        /// Apply a host update payload, or run layout effects.
        const UPDATE = 1 << 2;
        /// The fiber's `deletions` list holds children to tear down.
        const CHILD_DELETION = 1 << 4;
        /// Clear direct text content before inserting element children.
        const CONTENT_RESET = 1 << 5;
        /// Passive effects are pending.
        const PASSIVE = 1 << 11;
    }
}

impl Flags {
    /// Flags handled by the mutation pass.
    pub const MUTATION_MASK: Self = Self::PLACEMENT
        .union(Self::UPDATE)
        .union(Self::CHILD_DELETION)
        .union(Self::CONTENT_RESET);

    /// Flags handled by the passive pass.
    pub const PASSIVE_MASK: Self = Self::PASSIVE.union(Self::CHILD_DELETION);
}

bitflags! {
    /// Tags on an effect record.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct HookFlags: u8 {
        /// The effect fires during the coming commit.
        const HAS_EFFECT = 1 << 0;
        /// Reserved for insertion-class effects.
        const INSERTION = 1 << 1;
        /// Runs synchronously during the mutation pass.
        const LAYOUT = 1 << 2;
        /// Runs in the deferred passive pass.
        const PASSIVE = 1 << 3;
    }
}
