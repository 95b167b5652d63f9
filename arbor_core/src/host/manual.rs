// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A host loop driven by hand, with a virtual clock.

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use super::HostLoop;
use crate::time::{Duration, HostTime};

#[derive(Default)]
struct LoopState {
    now: Cell<HostTime>,
    auto_advance: Cell<Duration>,
    posted: Cell<usize>,
    pending: Cell<usize>,
    timer_due: Cell<Option<HostTime>>,
    timer_delay: Cell<Option<Duration>>,
    cancelled: Cell<usize>,
}

/// A [`HostLoop`] whose clock only moves when told to.
///
/// Clones share one loop, so a test can hand a clone to the renderer and
/// keep another to drive time and pump messages. Posted messages are
/// counted rather than queued: the driver calls
/// [`take_message`](Self::take_message) and, when it returns `true`, runs
/// the renderer's message handler.
///
/// With [`with_auto_advance`](Self::with_auto_advance) every clock read
/// moves time forward by a fixed step, which makes work appear to cost time
/// and lets time slicing kick in.
#[derive(Clone, Default)]
pub struct ManualLoop {
    state: Rc<LoopState>,
}

impl ManualLoop {
    /// Creates a loop at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loop whose clock advances by `step` on every read.
    #[must_use]
    pub fn with_auto_advance(step: Duration) -> Self {
        let this = Self::new();
        this.state.auto_advance.set(step);
        this
    }

    /// Changes the auto-advance step. Zero disables it.
    pub fn set_auto_advance(&self, step: Duration) {
        self.state.auto_advance.set(step);
    }

    /// Current time without advancing the clock.
    #[must_use]
    pub fn peek_now(&self) -> HostTime {
        self.state.now.get()
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let now = self.state.now.get();
        self.state.now.set(now.saturating_add(by));
    }

    /// Total number of messages posted since creation.
    #[must_use]
    pub fn posted_messages(&self) -> usize {
        self.state.posted.get()
    }

    /// Number of posted messages not yet taken.
    #[must_use]
    pub fn pending_messages(&self) -> usize {
        self.state.pending.get()
    }

    /// Consumes one posted message, returning `false` if none is pending.
    pub fn take_message(&self) -> bool {
        let pending = self.state.pending.get();
        if pending == 0 {
            return false;
        }
        self.state.pending.set(pending - 1);
        true
    }

    /// The delay the timer was last armed with, while it is armed.
    #[must_use]
    pub fn armed_timeout(&self) -> Option<Duration> {
        self.state.timer_delay.get()
    }

    /// When the armed timer fires.
    #[must_use]
    pub fn timer_due(&self) -> Option<HostTime> {
        self.state.timer_due.get()
    }

    /// Disarms and reports the timer if it is due at the current time.
    pub fn take_due_timer(&self) -> bool {
        match self.state.timer_due.get() {
            Some(due) if due <= self.state.now.get() => {
                self.state.timer_due.set(None);
                self.state.timer_delay.set(None);
                true
            }
            _ => false,
        }
    }

    /// Number of times an armed timer was cancelled.
    #[must_use]
    pub fn cancelled_timeouts(&self) -> usize {
        self.state.cancelled.get()
    }
}

impl HostLoop for ManualLoop {
    fn now(&self) -> HostTime {
        let now = self.state.now.get();
        let step = self.state.auto_advance.get();
        if step > Duration::ZERO {
            self.state.now.set(now.saturating_add(step));
        }
        now
    }

    fn request_callback(&self) {
        self.state.posted.set(self.state.posted.get() + 1);
        self.state.pending.set(self.state.pending.get() + 1);
    }

    fn request_timeout(&self, delay: Duration) {
        let now = self.state.now.get();
        self.state.timer_due.set(Some(now.saturating_add(delay)));
        self.state.timer_delay.set(Some(delay));
    }

    fn cancel_timeout(&self) {
        if self.state.timer_due.take().is_some() {
            self.state.cancelled.set(self.state.cancelled.get() + 1);
        }
        self.state.timer_delay.set(None);
    }
}

impl fmt::Debug for ManualLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualLoop")
            .field("now", &self.state.now.get())
            .field("pending", &self.state.pending.get())
            .field("timer_due", &self.state.timer_due.get())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let a = ManualLoop::new();
        let b = a.clone();
        a.advance(Duration::from_millis(3));
        assert_eq!(b.now(), HostTime::from_millis(3));
    }

    #[test]
    fn messages_are_counted_and_taken() {
        let l = ManualLoop::new();
        l.request_callback();
        l.request_callback();
        assert_eq!(l.posted_messages(), 2);
        assert!(l.take_message());
        assert!(l.take_message());
        assert!(!l.take_message());
        assert_eq!(l.posted_messages(), 2, "total is not reduced by taking");
    }

    #[test]
    fn timer_fires_once_due() {
        let l = ManualLoop::new();
        l.request_timeout(Duration::from_millis(10));
        assert!(!l.take_due_timer());
        l.advance(Duration::from_millis(10));
        assert!(l.take_due_timer());
        assert!(!l.take_due_timer(), "timer is one-shot");
        assert_eq!(l.armed_timeout(), None);
    }

    #[test]
    fn cancel_counts_only_armed_timers() {
        let l = ManualLoop::new();
        l.cancel_timeout();
        assert_eq!(l.cancelled_timeouts(), 0);
        l.request_timeout(Duration::from_millis(1));
        l.cancel_timeout();
        assert_eq!(l.cancelled_timeouts(), 1);
    }

    #[test]
    fn auto_advance_moves_time_on_read() {
        let l = ManualLoop::with_auto_advance(Duration::from_millis(1));
        assert_eq!(l.now(), HostTime::ZERO);
        assert_eq!(l.now(), HostTime::from_millis(1));
        assert_eq!(l.peek_now(), HostTime::from_millis(2));
    }
}
