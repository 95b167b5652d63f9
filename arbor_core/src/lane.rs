// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lane priority model.
//!
//! A [`Lanes`] value is a 31-bit set of independently schedulable priority
//! channels. A lower bit is more urgent. A single lane is just a set with
//! one bit, so [`Lane`] is an alias rather than a separate type.
//!
//! ```text
//!  bit  0      1     2..5               6           7..21          22..25   26..30
//!      SyncHyd Sync  InputCont/Default  TransHyd    Transition x15 Retry x4 Idle/Offscreen/Deferred
//! ```
//!
//! Everything here is pure bitset algebra except [`TransitionLaneAllocator`],
//! which holds the rotating cursor for transition lanes.

use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// A set of priority lanes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Lanes(u32);

/// A set holding exactly one lane (or none).
pub type Lane = Lanes;

impl Lanes {
    /// Number of usable lanes.
    pub const TOTAL: u32 = 31;

    /// The empty set.
    pub const NONE: Self = Self(0);

    /// Synchronous hydration.
    pub const SYNC_HYDRATION: Self = Self(0b0000000000000000000000000000001);
    /// Synchronous updates (discrete input).
    pub const SYNC: Self = Self(0b0000000000000000000000000000010);
    /// Continuous input hydration.
    pub const INPUT_CONTINUOUS_HYDRATION: Self = Self(0b0000000000000000000000000000100);
    /// Continuous input (pointer motion, drag).
    pub const INPUT_CONTINUOUS: Self = Self(0b0000000000000000000000000001000);
    /// Default hydration.
    pub const DEFAULT_HYDRATION: Self = Self(0b0000000000000000000000000010000);
    /// Updates with no triggering input.
    pub const DEFAULT: Self = Self(0b0000000000000000000000000100000);
    /// The interactive classes that schedule as one synchronous batch.
    pub const SYNC_UPDATE_LANES: Self =
        Self(Self::SYNC.0 | Self::INPUT_CONTINUOUS.0 | Self::DEFAULT.0);
    /// Transition hydration.
    pub const TRANSITION_HYDRATION: Self = Self(0b0000000000000000000000001000000);
    /// The fifteen transition lanes.
    pub const TRANSITIONS: Self = Self(0b0000000001111111111111110000000);
    /// The first transition lane; the allocator wraps back to it.
    pub const TRANSITION_1: Self = Self(0b0000000000000000000000010000000);
    /// The four retry lanes.
    pub const RETRIES: Self = Self(0b0000011110000000000000000000000);
    /// The first retry lane.
    pub const RETRY_1: Self = Self(0b0000000010000000000000000000000);
    /// Selective hydration.
    pub const SELECTIVE_HYDRATION: Self = Self(0b0000100000000000000000000000000);
    /// Every lane below idle.
    pub const NON_IDLE: Self = Self(0b0000111111111111111111111111111);
    /// Idle hydration.
    pub const IDLE_HYDRATION: Self = Self(0b0001000000000000000000000000000);
    /// Idle work.
    pub const IDLE: Self = Self(0b0010000000000000000000000000000);
    /// Offscreen work.
    pub const OFFSCREEN: Self = Self(0b0100000000000000000000000000000);
    /// Deferred work.
    pub const DEFERRED: Self = Self(0b1000000000000000000000000000000);
    /// Every usable lane.
    pub const ALL: Self = Self(0b1111111111111111111111111111111);

    /// Creates a lane set from raw bits, dropping bit 31.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL.0)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` for the empty set.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union.
    #[inline]
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Intersection.
    #[inline]
    #[must_use]
    pub const fn intersect(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    /// Returns `true` if the sets share any lane.
    #[inline]
    #[must_use]
    pub const fn includes_some(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if every lane of `subset` is in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, subset: Self) -> bool {
        self.0 & subset.0 == subset.0
    }

    /// Removes the lanes of `subset`.
    #[inline]
    #[must_use]
    pub const fn remove(self, subset: Self) -> Self {
        Self(self.0 & !subset.0)
    }

    /// Isolates the most urgent lane (`lanes & -lanes`).
    #[inline]
    #[must_use]
    pub const fn highest_priority_lane(self) -> Lane {
        Self(self.0 & self.0.wrapping_neg())
    }

    /// Returns the more urgent of two single lanes, treating the empty lane
    /// as least urgent.
    #[inline]
    #[must_use]
    pub const fn higher_priority(a: Lane, b: Lane) -> Lane {
        if a.0 != 0 && a.0 < b.0 { a } else { b }
    }

    /// Number of lanes in the set.
    #[inline]
    #[must_use]
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Bit index of a single lane.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0.trailing_zeros()
    }

    /// Returns `true` if `self` holds a transition lane.
    #[inline]
    #[must_use]
    pub const fn is_transition(self) -> bool {
        self.includes_some(Self::TRANSITIONS)
    }

    /// Returns `true` if the set holds any non-idle lane.
    #[inline]
    #[must_use]
    pub const fn includes_non_idle_work(self) -> bool {
        self.includes_some(Self::NON_IDLE)
    }

    /// Returns `true` if the set holds no urgent (sync, continuous or
    /// default) lane.
    #[inline]
    #[must_use]
    pub const fn includes_only_non_urgent(self) -> bool {
        !self.includes_some(Self::SYNC_UPDATE_LANES)
    }

    /// Returns `true` if every lane in the set is a transition lane.
    #[inline]
    #[must_use]
    pub const fn includes_only_transitions(self) -> bool {
        self.0 & Self::TRANSITIONS.0 == self.0
    }

    /// Returns `true` if the set must render without yielding.
    #[inline]
    #[must_use]
    pub const fn includes_blocking_lane(self) -> bool {
        self.includes_some(Self::SYNC_UPDATE_LANES.merge(Self::SYNC_HYDRATION))
    }

    /// Iterates the individual lanes, most urgent first.
    pub fn iter(self) -> impl Iterator<Item = Lane> {
        let mut rest = self.0;
        core::iter::from_fn(move || {
            if rest == 0 {
                return None;
            }
            let lane = rest & rest.wrapping_neg();
            rest &= !lane;
            Some(Self(lane))
        })
    }
}

impl BitOr for Lanes {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        self.merge(rhs)
    }
}

impl BitOrAssign for Lanes {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.merge(rhs);
    }
}

impl BitAnd for Lanes {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        self.intersect(rhs)
    }
}

impl BitAndAssign for Lanes {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        *self = self.intersect(rhs);
    }
}

impl fmt::Debug for Lanes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lanes({:#033b})", self.0)
    }
}

/// Picks the most urgent group of lanes out of `lanes`.
///
/// Any pending sync, continuous or default lane makes the answer the whole
/// sync-update subset. Transition and retry lanes batch as a group; every
/// other class is returned as its single lane.
#[must_use]
pub fn get_highest_priority_lanes(lanes: Lanes) -> Lanes {
    let pending_sync = lanes.intersect(Lanes::SYNC_UPDATE_LANES);
    if !pending_sync.is_empty() {
        return pending_sync;
    }
    let highest = lanes.highest_priority_lane();
    if highest.is_transition() {
        lanes.intersect(Lanes::TRANSITIONS)
    } else if highest.includes_some(Lanes::RETRIES) {
        lanes.intersect(Lanes::RETRIES)
    } else if highest.is_empty() {
        lanes
    } else {
        highest
    }
}

/// Chooses which lanes to render next given the root's pending lanes and the
/// lanes of a render already in progress.
///
/// In-progress work is kept unless the new candidate is strictly more urgent,
/// and default work never interrupts an in-progress transition.
#[must_use]
pub fn get_next_lanes(pending: Lanes, wip: Lanes) -> Lanes {
    if pending.is_empty() {
        return Lanes::NONE;
    }

    let non_idle = pending.intersect(Lanes::NON_IDLE);
    let next = if non_idle.is_empty() {
        get_highest_priority_lanes(pending)
    } else {
        get_highest_priority_lanes(non_idle)
    };
    if next.is_empty() {
        return Lanes::NONE;
    }

    if !wip.is_empty() && wip != next {
        let next_lane = next.highest_priority_lane();
        let wip_lane = wip.highest_priority_lane();
        if next_lane.bits() >= wip_lane.bits()
            || (next_lane == Lanes::DEFAULT && wip_lane.is_transition())
        {
            return wip;
        }
    }
    next
}

/// Rotating allocator for transition lanes.
///
/// Each claim returns the next transition lane, wrapping back to the first
/// one after the fifteenth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionLaneAllocator {
    next: Lane,
}

impl Default for TransitionLaneAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionLaneAllocator {
    /// Creates an allocator positioned at the first transition lane.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: Lanes::TRANSITION_1,
        }
    }

    /// Claims the next transition lane.
    pub fn claim(&mut self) -> Lane {
        let lane = self.next;
        let shifted = Lanes::from_bits(self.next.bits() << 1);
        self.next = if shifted.is_transition() {
            shifted
        } else {
            Lanes::TRANSITION_1
        };
        lane
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    #[test]
    fn transition_group_has_fifteen_lanes() {
        assert_eq!(Lanes::TRANSITIONS.count(), 15);
        assert_eq!(Lanes::TRANSITION_1.bits(), 1 << 7);
        assert_eq!(Lanes::RETRIES.count(), 4);
        assert_eq!(Lanes::RETRY_1.bits(), 1 << 22);
        assert_eq!(Lanes::DEFERRED.bits(), 1 << 30);
    }

    #[test]
    fn highest_priority_lanes_collapse_sync_classes() {
        let pending = Lanes::DEFAULT | Lanes::INPUT_CONTINUOUS | Lanes::TRANSITION_1;
        assert_eq!(
            get_highest_priority_lanes(pending),
            Lanes::DEFAULT | Lanes::INPUT_CONTINUOUS,
            "sync-update lanes win as one group"
        );
    }

    #[test]
    fn highest_priority_lanes_batch_transitions() {
        let t2 = Lanes::from_bits(1 << 8);
        let pending = Lanes::TRANSITION_1 | t2 | Lanes::IDLE;
        assert_eq!(get_highest_priority_lanes(pending), Lanes::TRANSITION_1 | t2);
        assert_eq!(get_highest_priority_lanes(Lanes::IDLE), Lanes::IDLE);
    }

    #[test]
    fn next_lanes_prefer_non_idle() {
        let pending = Lanes::IDLE | Lanes::TRANSITION_1;
        assert_eq!(get_next_lanes(pending, Lanes::NONE), Lanes::TRANSITION_1);
        assert_eq!(get_next_lanes(Lanes::IDLE, Lanes::NONE), Lanes::IDLE);
        assert_eq!(get_next_lanes(Lanes::NONE, Lanes::SYNC), Lanes::NONE);
    }

    #[test]
    fn less_urgent_request_does_not_preempt() {
        let wip = Lanes::DEFAULT;
        let pending = Lanes::TRANSITION_1 | Lanes::DEFAULT;
        assert_eq!(get_next_lanes(pending, wip), Lanes::DEFAULT);
        // A transition never interrupts default work already running.
        assert_eq!(get_next_lanes(Lanes::TRANSITION_1, wip), wip);
    }

    #[test]
    fn more_urgent_request_preempts() {
        let wip = Lanes::TRANSITION_1;
        assert_eq!(
            get_next_lanes(Lanes::SYNC | Lanes::TRANSITION_1, wip),
            Lanes::SYNC
        );
    }

    #[test]
    fn default_joins_in_progress_transition() {
        let wip = Lanes::TRANSITION_1;
        assert_eq!(
            get_next_lanes(Lanes::DEFAULT | Lanes::TRANSITION_1, wip),
            wip,
            "default work does not interrupt a transition"
        );
    }

    #[test]
    fn transition_allocator_rotates_and_wraps() {
        let mut alloc = TransitionLaneAllocator::new();
        let claimed: Vec<Lane> = (0..16).map(|_| alloc.claim()).collect();
        assert_eq!(claimed[0], Lanes::TRANSITION_1);
        assert_eq!(claimed[1].bits(), 1 << 8);
        assert_eq!(claimed[14].bits(), 1 << 21);
        assert_eq!(claimed[15], Lanes::TRANSITION_1, "wraps after fifteen");
        assert!(claimed.iter().all(|l| l.count() == 1 && l.is_transition()));
    }

    #[test]
    fn urgency_predicates() {
        assert!(Lanes::TRANSITION_1.includes_only_non_urgent());
        assert!(!Lanes::DEFAULT.includes_only_non_urgent());
        assert!(Lanes::TRANSITIONS.includes_only_transitions());
        assert!(!(Lanes::TRANSITION_1 | Lanes::IDLE).includes_only_transitions());
        assert!(Lanes::SYNC.includes_blocking_lane());
        assert!(!Lanes::IDLE.includes_non_idle_work());
    }

    #[test]
    fn iter_yields_most_urgent_first() {
        let lanes = Lanes::IDLE | Lanes::SYNC | Lanes::DEFAULT;
        let out: Vec<Lane> = lanes.iter().collect();
        assert_eq!(out, [Lanes::SYNC, Lanes::DEFAULT, Lanes::IDLE]);
    }

    fn arb_lanes() -> impl Strategy<Value = Lanes> {
        any::<u32>().prop_map(Lanes::from_bits)
    }

    proptest! {
        #[test]
        fn highest_lane_is_lowest_set_bit(lanes in arb_lanes()) {
            prop_assume!(!lanes.is_empty());
            let lane = lanes.highest_priority_lane();
            prop_assert_eq!(lane.count(), 1);
            prop_assert!(lanes.contains(lane));
            prop_assert_eq!(lane.index(), lanes.bits().trailing_zeros());
        }

        #[test]
        fn merge_is_associative_commutative_idempotent(a in arb_lanes(), b in arb_lanes(), c in arb_lanes()) {
            prop_assert_eq!(a.merge(b).merge(c), a.merge(b.merge(c)));
            prop_assert_eq!(a.merge(b), b.merge(a));
            prop_assert_eq!(a.merge(a), a);
        }

        #[test]
        fn remove_then_intersect_is_empty(a in arb_lanes(), b in arb_lanes()) {
            prop_assert!(a.remove(b).intersect(b).is_empty());
            prop_assert_eq!(a.remove(b).merge(a.intersect(b)), a);
        }

        #[test]
        fn next_lanes_is_subset_of_pending_or_wip(pending in arb_lanes(), wip in arb_lanes()) {
            let next = get_next_lanes(pending, wip);
            prop_assert!(next.is_empty() || pending.contains(next) || next == wip);
        }
    }
}
