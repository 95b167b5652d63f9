// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Root containers.

use alloc::rc::Rc;
use core::fmt;

use crate::host::InstanceId;
use crate::lane::Lanes;
use crate::scheduler::TaskId;
use crate::update_queue::SharedQueue;

/// A handle to a mounted root.
///
/// Root ids are never reused, so a handle to an unmounted root stays
/// invalid.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RootId(u32);

impl RootId {
    pub(crate) const fn new(idx: u32) -> Self {
        Self(idx)
    }

    /// Returns the raw index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Rebuilds a handle from [`index`](Self::index), for decoding recorded
    /// traces. The renderer treats handles it never issued as stale.
    #[inline]
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }
}

impl fmt::Debug for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootId({})", self.0)
    }
}

/// Per-root bookkeeping.
#[derive(Debug)]
pub(crate) struct FiberRoot {
    /// Host container the tree mounts into.
    pub(crate) container: InstanceId,
    /// The committed host-root fiber.
    pub(crate) current: u32,
    /// Element updates for this root.
    pub(crate) queue: Rc<SharedQueue>,
    /// Lanes with outstanding work anywhere in the tree.
    pub(crate) pending_lanes: Lanes,
    /// Lanes updated while a render of this root was in progress.
    pub(crate) interleaved_lanes: Lanes,
    /// The scheduled render task and the lane it was scheduled for.
    pub(crate) callback_task: Option<TaskId>,
    pub(crate) callback_priority: Lanes,
    /// Set by `unmount`; the root is dropped after its next commit.
    pub(crate) unmounting: bool,
    /// Number of commits so far.
    pub(crate) commit_count: u64,
}

impl FiberRoot {
    pub(crate) fn new(container: InstanceId, current: u32) -> Self {
        Self {
            container,
            current,
            queue: Rc::new(SharedQueue::default()),
            pending_lanes: Lanes::NONE,
            interleaved_lanes: Lanes::NONE,
            callback_task: None,
            callback_priority: Lanes::NONE,
            unmounting: false,
            commit_count: 0,
        }
    }

    /// Records that `lane` has work pending.
    pub(crate) fn mark_updated(&mut self, lane: Lanes, rendering: bool) {
        self.pending_lanes |= lane;
        if rendering {
            self.interleaved_lanes |= lane;
        }
    }

    /// Records a commit that finished some lanes; `remaining` is what the
    /// committed tree still has pending.
    pub(crate) fn mark_finished(&mut self, remaining: Lanes) {
        self.pending_lanes = remaining | self.interleaved_lanes;
        self.interleaved_lanes = Lanes::NONE;
        self.commit_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_updates_survive_a_commit() {
        let mut root = FiberRoot::new(InstanceId(0), 0);
        root.mark_updated(Lanes::DEFAULT, false);
        root.mark_updated(Lanes::SYNC, true);
        root.mark_finished(Lanes::NONE);
        assert_eq!(root.pending_lanes, Lanes::SYNC);
        assert_eq!(root.commit_count, 1);
        root.mark_finished(Lanes::NONE);
        assert!(root.pending_lanes.is_empty());
    }
}
