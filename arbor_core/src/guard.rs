// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Guarded invocation of user callbacks.
//!
//! A [`GuardedBatch`] runs every callback handed to it even after one fails,
//! keeps the first error, and hands it back from [`GuardedBatch::finish`].
//! Effects and event handlers run through a batch so a failing listener
//! cannot leave its siblings half torn down.

/// Collects the first error of a batch of fallible calls.
#[derive(Debug)]
pub struct GuardedBatch<E> {
    first: Option<E>,
    invoked: u32,
    failed: u32,
}

impl<E> Default for GuardedBatch<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> GuardedBatch<E> {
    /// Creates an empty batch.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            first: None,
            invoked: 0,
            failed: 0,
        }
    }

    /// Runs `f`, recording its error if it is the first one of the batch.
    pub fn invoke<F>(&mut self, f: F)
    where
        F: FnOnce() -> Result<(), E>,
    {
        self.invoked += 1;
        if let Err(err) = f() {
            self.record(err);
        }
    }

    /// Records an error produced outside [`invoke`](Self::invoke).
    pub fn record(&mut self, err: E) {
        self.failed += 1;
        if self.first.is_none() {
            self.first = Some(err);
        }
    }

    /// Returns `true` once any call has failed.
    #[must_use]
    pub const fn has_error(&self) -> bool {
        self.first.is_some()
    }

    /// Number of callbacks invoked.
    #[must_use]
    pub const fn invoked(&self) -> u32 {
        self.invoked
    }

    /// Number of callbacks that failed.
    #[must_use]
    pub const fn failed(&self) -> u32 {
        self.failed
    }

    /// Takes the recorded error, leaving the batch reusable.
    pub fn take(&mut self) -> Option<E> {
        self.invoked = 0;
        self.failed = 0;
        self.first.take()
    }

    /// Ends the batch, returning the first recorded error.
    pub fn finish(self) -> Result<(), E> {
        match self.first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Folds another batch into this one, keeping the earlier first error.
    pub fn absorb(&mut self, other: Self) {
        self.invoked += other.invoked;
        self.failed += other.failed;
        if self.first.is_none() {
            self.first = other.first;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[test]
    fn empty_batch_finishes_ok() {
        let batch: GuardedBatch<&str> = GuardedBatch::new();
        assert_eq!(batch.finish(), Ok(()));
    }

    #[test]
    fn keeps_only_the_first_error_and_runs_every_call() {
        let ran = RefCell::new(Vec::new());
        let mut batch = GuardedBatch::new();
        for i in 0..4 {
            batch.invoke(|| {
                ran.borrow_mut().push(i);
                if i % 2 == 1 { Err(i) } else { Ok(()) }
            });
        }
        assert_eq!(*ran.borrow(), vec![0, 1, 2, 3], "siblings still run");
        assert_eq!(batch.invoked(), 4);
        assert_eq!(batch.failed(), 2);
        assert_eq!(batch.finish(), Err(1), "first error wins");
    }

    #[test]
    fn absorb_keeps_earlier_error() {
        let mut a = GuardedBatch::new();
        a.record("first");
        let mut b = GuardedBatch::new();
        b.record("second");
        a.absorb(b);
        assert_eq!(a.failed(), 2);
        assert_eq!(a.take(), Some("first"));
        assert!(!a.has_error(), "take resets the batch");
    }
}
