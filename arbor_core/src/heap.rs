// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Array-backed binary min-heap keyed by `(sort_index, id)`.
//!
//! The heap has no removal primitive other than [`MinHeap::pop`]. Callers
//! that need cancellation mark the payload dead and skip it lazily when it
//! reaches the top, which is what the task scheduler does.

use alloc::vec::Vec;
use core::cmp::Ordering;

/// An element that can be ordered inside a [`MinHeap`].
///
/// Elements compare by [`sort_index`](HeapNode::sort_index) first, then by
/// [`id`](HeapNode::id). Ids are handed out in insertion order, so equal sort
/// indices come out first-in first-out.
pub trait HeapNode {
    /// Primary ordering key.
    fn sort_index(&self) -> u64;
    /// Tie-breaking identity, monotonically increasing with insertion.
    fn id(&self) -> u64;
}

#[inline]
fn compare<T: HeapNode>(a: &T, b: &T) -> Ordering {
    a.sort_index()
        .cmp(&b.sort_index())
        .then_with(|| a.id().cmp(&b.id()))
}

/// A binary min-heap.
#[derive(Clone, Debug)]
pub struct MinHeap<T> {
    nodes: Vec<T>,
}

impl<T> Default for MinHeap<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

impl<T: HeapNode> MinHeap<T> {
    /// Creates an empty heap.
    #[must_use]
    pub const fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Number of elements in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the heap holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the minimum element without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.nodes.first()
    }

    /// Returns a mutable reference to the minimum element.
    ///
    /// Callers must not change the element's sort key or id through this
    /// reference.
    pub fn peek_mut(&mut self) -> Option<&mut T> {
        self.nodes.first_mut()
    }

    /// Inserts an element.
    pub fn push(&mut self, node: T) {
        let index = self.nodes.len();
        self.nodes.push(node);
        self.sift_up(index);
    }

    /// Removes and returns the minimum element.
    pub fn pop(&mut self) -> Option<T> {
        if self.nodes.is_empty() {
            return None;
        }
        let last = self.nodes.len() - 1;
        self.nodes.swap(0, last);
        let first = self.nodes.pop();
        if !self.nodes.is_empty() {
            self.sift_down(0);
        }
        first
    }

    /// Iterates the elements in storage order (not sorted).
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.nodes.iter()
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) >> 1;
            if compare(&self.nodes[parent], &self.nodes[index]) == Ordering::Greater {
                self.nodes.swap(parent, index);
                index = parent;
            } else {
                return;
            }
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.nodes.len();
        let half = len >> 1;
        while index < half {
            let left = (index + 1) * 2 - 1;
            let right = left + 1;

            // Pick the smaller child; `left < len` always holds below `half`.
            let smaller = if right < len
                && compare(&self.nodes[right], &self.nodes[left]) == Ordering::Less
            {
                right
            } else {
                left
            };

            if compare(&self.nodes[smaller], &self.nodes[index]) == Ordering::Less {
                self.nodes.swap(smaller, index);
                index = smaller;
            } else {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use proptest::prelude::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    struct Entry {
        sort: u64,
        id: u64,
    }

    impl HeapNode for Entry {
        fn sort_index(&self) -> u64 {
            self.sort
        }
        fn id(&self) -> u64 {
            self.id
        }
    }

    fn drain(heap: &mut MinHeap<Entry>) -> Vec<Entry> {
        let mut out = Vec::new();
        while let Some(e) = heap.pop() {
            out.push(e);
        }
        out
    }

    #[test]
    fn empty_heap_peeks_none() {
        let mut heap = MinHeap::<Entry>::new();
        assert!(heap.peek().is_none());
        assert!(heap.pop().is_none());
        assert!(heap.is_empty());
    }

    #[test]
    fn pops_in_sort_order() {
        let mut heap = MinHeap::new();
        for (id, sort) in [5_u64, 1, 4, 2, 3].into_iter().enumerate() {
            heap.push(Entry {
                sort,
                id: id as u64,
            });
        }
        assert_eq!(heap.len(), 5);
        assert_eq!(heap.peek().map(|e| e.sort), Some(1));
        let sorts: Vec<u64> = drain(&mut heap).iter().map(|e| e.sort).collect();
        assert_eq!(sorts, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn equal_keys_pop_in_insertion_order() {
        let mut heap = MinHeap::new();
        for id in 0..6 {
            heap.push(Entry { sort: 7, id });
        }
        let ids: Vec<u64> = drain(&mut heap).iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 5], "ties break by id");
    }

    proptest! {
        #[test]
        fn peek_is_always_the_minimum(ops in prop::collection::vec(prop::option::of(0_u64..50), 1..200)) {
            let mut heap = MinHeap::new();
            let mut model: Vec<Entry> = Vec::new();
            for (id, op) in ops.into_iter().enumerate() {
                match op {
                    Some(sort) => {
                        let e = Entry { sort, id: id as u64 };
                        heap.push(e);
                        model.push(e);
                    }
                    None => {
                        model.sort_by(|a, b| compare(a, b));
                        let expected = if model.is_empty() { None } else { Some(model.remove(0)) };
                        prop_assert_eq!(heap.pop(), expected);
                    }
                }
                let min = model.iter().min_by(|a, b| compare(*a, *b)).copied();
                prop_assert_eq!(heap.peek().copied(), min);
            }
        }

        #[test]
        fn popping_yields_non_decreasing_keys(sorts in prop::collection::vec(0_u64..1000, 0..200)) {
            let mut heap = MinHeap::new();
            for (id, sort) in sorts.iter().enumerate() {
                heap.push(Entry { sort: *sort, id: id as u64 });
            }
            let out = drain(&mut heap);
            prop_assert_eq!(out.len(), sorts.len());
            for pair in out.windows(2) {
                prop_assert!(compare(&pair[0], &pair[1]) == Ordering::Less);
            }
        }
    }
}
