// Copyright 2026 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cooperative, time-sliced task scheduler.
//!
//! The [`Scheduler`] keeps two [`MinHeap`]s: a ready queue ordered by
//! expiration time and a delayed queue ordered by start time. The host loop
//! (see [`HostLoop`]) calls [`Scheduler::perform_work_until_deadline`] when
//! the message the scheduler posted arrives, and
//! [`Scheduler::handle_timeout`] when the single armed timer fires.
//!
//! Task payloads are plain data (`T`), not closures. A [`TaskRunner`]
//! interprets them. A runner that returns `Some(continuation)` keeps its task
//! at the head of the ready queue and ends the slice, which is how long
//! renders pause and resume.
//!
//! ```text
//!   Idle ──schedule──▶ MessagePosted ──perform_work_until_deadline──▶ Flushing
//!     ▲                                                                 │
//!     └──────── queue empty (arm timer for first delayed task) ◀────────┘
//! ```

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use core::fmt;

use crate::heap::{HeapNode, MinHeap};
use crate::host::HostLoop;
use crate::time::{Duration, HostTime};

/// Scheduler priority classes, most urgent first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityLevel {
    /// Already expired when scheduled; never yields.
    Immediate = 1,
    /// Discrete user interaction.
    UserBlocking = 2,
    /// Ordinary work.
    Normal = 3,
    /// Work that may wait.
    Low = 4,
    /// Effectively never expires.
    Idle = 5,
}

impl PriorityLevel {
    /// Returns a short label for diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Immediate => "immediate",
            Self::UserBlocking => "user-blocking",
            Self::Normal => "normal",
            Self::Low => "low",
            Self::Idle => "idle",
        }
    }

    /// Inverse of `self as u8`.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Immediate),
            2 => Some(Self::UserBlocking),
            3 => Some(Self::Normal),
            4 => Some(Self::Low),
            5 => Some(Self::Idle),
            _ => None,
        }
    }
}

/// Configuration for the [`Scheduler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Time slice after which [`Scheduler::should_yield_to_host`] turns true.
    pub frame_interval: Duration,
    /// Expiration window for [`PriorityLevel::UserBlocking`].
    pub user_blocking_timeout: Duration,
    /// Expiration window for [`PriorityLevel::Normal`].
    pub normal_timeout: Duration,
    /// Expiration window for [`PriorityLevel::Low`].
    pub low_timeout: Duration,
    /// Expiration window for [`PriorityLevel::Idle`].
    pub idle_timeout: Duration,
}

/// Largest signed 31-bit integer, the idle timeout in milliseconds.
const MAX_SIGNED_31_BIT_INT: u64 = 1_073_741_823;

impl SchedulerConfig {
    /// 5 ms slices with the standard priority timeouts.
    pub const DEFAULT: Self = Self {
        frame_interval: Duration::from_millis(5),
        user_blocking_timeout: Duration::from_millis(250),
        normal_timeout: Duration::from_millis(5_000),
        low_timeout: Duration::from_millis(10_000),
        idle_timeout: Duration::from_millis(MAX_SIGNED_31_BIT_INT),
    };

    /// Returns the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self::DEFAULT
    }

    /// Returns a copy with a different time slice.
    #[must_use]
    pub const fn with_frame_interval(mut self, frame_interval: Duration) -> Self {
        self.frame_interval = frame_interval;
        self
    }

    /// Expiration time of a task of `priority` starting at `start`.
    ///
    /// Immediate tasks expire one millisecond before they start, so they are
    /// overdue the moment they are queued.
    #[must_use]
    pub const fn expiration(&self, priority: PriorityLevel, start: HostTime) -> HostTime {
        match priority {
            PriorityLevel::Immediate => start.saturating_sub(Duration::from_millis(1)),
            PriorityLevel::UserBlocking => start.saturating_add(self.user_blocking_timeout),
            PriorityLevel::Normal => start.saturating_add(self.normal_timeout),
            PriorityLevel::Low => start.saturating_add(self.low_timeout),
            PriorityLevel::Idle => start.saturating_add(self.idle_timeout),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Identity of a scheduled task.
///
/// Ids increase monotonically, which also makes them the FIFO tie-breaker
/// between tasks with equal sort indices.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskId({})", self.0)
    }
}

/// A task handed to a [`TaskRunner`].
#[derive(Debug)]
pub struct RunningTask<T> {
    /// The task being run.
    pub id: TaskId,
    /// The task's priority class.
    pub priority: PriorityLevel,
    /// `true` if the task ran because it expired rather than because the
    /// slice had time left.
    pub did_timeout: bool,
    /// The task payload.
    pub callback: T,
}

/// Interprets task payloads.
pub trait TaskRunner<T> {
    /// Runs one task. Returning `Some` keeps the task queued with the new
    /// payload and ends the current slice.
    fn run_task(&mut self, scheduler: &mut Scheduler<T>, task: RunningTask<T>) -> Option<T>;
}

impl<T, F> TaskRunner<T> for F
where
    F: FnMut(&mut Scheduler<T>, RunningTask<T>) -> Option<T>,
{
    fn run_task(&mut self, scheduler: &mut Scheduler<T>, task: RunningTask<T>) -> Option<T> {
        self(scheduler, task)
    }
}

#[derive(Debug)]
struct Task<T> {
    callback: Option<T>,
    priority: PriorityLevel,
    start_time: HostTime,
    expiration_time: HostTime,
    cancelled: bool,
}

#[derive(Clone, Copy, Debug)]
struct QueueEntry {
    id: u64,
    sort_index: u64,
}

impl HeapNode for QueueEntry {
    fn sort_index(&self) -> u64 {
        self.sort_index
    }

    fn id(&self) -> u64 {
        self.id
    }
}

/// Cooperative task scheduler.
pub struct Scheduler<T> {
    config: SchedulerConfig,
    host: Rc<dyn HostLoop>,
    tasks: BTreeMap<u64, Task<T>>,
    task_queue: MinHeap<QueueEntry>,
    timer_queue: MinHeap<QueueEntry>,
    next_id: u64,
    current_task: Option<TaskId>,
    current_priority: PriorityLevel,
    slice_start: HostTime,
    is_performing_work: bool,
    is_host_callback_scheduled: bool,
    is_message_loop_running: bool,
    is_host_timeout_scheduled: bool,
}

impl<T> fmt::Debug for Scheduler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("config", &self.config)
            .field("tasks", &self.tasks.len())
            .field("ready", &self.task_queue.len())
            .field("delayed", &self.timer_queue.len())
            .field("current_task", &self.current_task)
            .field("current_priority", &self.current_priority)
            .field("is_message_loop_running", &self.is_message_loop_running)
            .field("is_host_timeout_scheduled", &self.is_host_timeout_scheduled)
            .finish_non_exhaustive()
    }
}

impl<T> Scheduler<T> {
    /// Creates a scheduler driven by `host`.
    #[must_use]
    pub fn new(config: SchedulerConfig, host: Rc<dyn HostLoop>) -> Self {
        Self {
            config,
            host,
            tasks: BTreeMap::new(),
            task_queue: MinHeap::new(),
            timer_queue: MinHeap::new(),
            next_id: 1,
            current_task: None,
            current_priority: PriorityLevel::Normal,
            slice_start: HostTime::ZERO,
            is_performing_work: false,
            is_host_callback_scheduled: false,
            is_message_loop_running: false,
            is_host_timeout_scheduled: false,
        }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Reads the host clock.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.host.now()
    }

    /// Priority of the task being run, or `Normal` between tasks.
    #[must_use]
    pub const fn current_priority_level(&self) -> PriorityLevel {
        self.current_priority
    }

    /// Id of the task being run.
    #[must_use]
    pub const fn current_task(&self) -> Option<TaskId> {
        self.current_task
    }

    /// Number of live (not cancelled, not finished) tasks.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.tasks.values().filter(|t| !t.cancelled).count()
    }

    /// Returns `true` if any live task is waiting, ready or delayed.
    #[must_use]
    pub fn has_pending_work(&self) -> bool {
        self.pending_tasks() > 0
    }

    /// Returns `true` while a posted host message is outstanding.
    #[must_use]
    pub const fn is_message_loop_running(&self) -> bool {
        self.is_message_loop_running
    }

    /// Queues `callback` at `priority`, optionally after `delay`.
    pub fn schedule_callback(
        &mut self,
        priority: PriorityLevel,
        callback: T,
        delay: Option<Duration>,
    ) -> TaskId {
        let current_time = self.now();
        let start_time = match delay {
            Some(delay) if delay > Duration::ZERO => current_time.saturating_add(delay),
            _ => current_time,
        };
        let expiration_time = self.config.expiration(priority, start_time);

        let id = self.next_id;
        self.next_id += 1;
        self.tasks.insert(
            id,
            Task {
                callback: Some(callback),
                priority,
                start_time,
                expiration_time,
                cancelled: false,
            },
        );

        if start_time > current_time {
            self.timer_queue.push(QueueEntry {
                id,
                sort_index: start_time.ticks(),
            });
            let is_first_timer = self.timer_queue.peek().map(|e| e.id) == Some(id);
            if self.task_queue.is_empty() && is_first_timer {
                if self.is_host_timeout_scheduled {
                    self.host.cancel_timeout();
                } else {
                    self.is_host_timeout_scheduled = true;
                }
                self.host
                    .request_timeout(start_time.saturating_duration_since(current_time));
            }
        } else {
            self.task_queue.push(QueueEntry {
                id,
                sort_index: expiration_time.ticks(),
            });
            if !self.is_host_callback_scheduled && !self.is_performing_work {
                self.is_host_callback_scheduled = true;
                self.request_host_callback();
            }
        }
        TaskId(id)
    }

    /// Cancels a task. The queue entry is dropped lazily when it surfaces.
    pub fn cancel_callback(&mut self, id: TaskId) {
        if let Some(task) = self.tasks.get_mut(&id.0) {
            task.callback = None;
            task.cancelled = true;
        }
    }

    /// Returns `true` once the current slice has used its time budget.
    #[must_use]
    pub fn should_yield_to_host(&self) -> bool {
        self.now().saturating_duration_since(self.slice_start) >= self.config.frame_interval
    }

    /// Entry point for the host message posted by the scheduler.
    ///
    /// Returns `true` if more work is pending; in that case another message
    /// has already been posted.
    pub fn perform_work_until_deadline<R>(&mut self, runner: &mut R) -> bool
    where
        R: TaskRunner<T> + ?Sized,
    {
        if !self.is_message_loop_running {
            return false;
        }
        let current_time = self.now();
        self.slice_start = current_time;
        let has_more_work = self.flush_work(runner, current_time);
        if has_more_work {
            self.host.request_callback();
        } else {
            self.is_message_loop_running = false;
        }
        has_more_work
    }

    /// Entry point for the host timer armed by the scheduler.
    pub fn handle_timeout(&mut self) {
        self.is_host_timeout_scheduled = false;
        let current_time = self.now();
        self.advance_timers(current_time);

        if self.is_host_callback_scheduled {
            return;
        }
        if self.peek_ready().is_some() {
            self.is_host_callback_scheduled = true;
            self.request_host_callback();
        } else if let Some(start) = self.first_timer_start() {
            self.is_host_timeout_scheduled = true;
            self.host
                .request_timeout(start.saturating_duration_since(current_time));
        }
    }

    fn request_host_callback(&mut self) {
        if !self.is_message_loop_running {
            self.is_message_loop_running = true;
            self.host.request_callback();
        }
    }

    fn flush_work<R>(&mut self, runner: &mut R, initial_time: HostTime) -> bool
    where
        R: TaskRunner<T> + ?Sized,
    {
        self.is_host_callback_scheduled = false;
        if self.is_host_timeout_scheduled {
            self.is_host_timeout_scheduled = false;
            self.host.cancel_timeout();
        }
        self.is_performing_work = true;
        let previous_priority = self.current_priority;
        let has_more = self.work_loop(runner, initial_time);
        self.current_task = None;
        self.current_priority = previous_priority;
        self.is_performing_work = false;
        has_more
    }

    fn work_loop<R>(&mut self, runner: &mut R, initial_time: HostTime) -> bool
    where
        R: TaskRunner<T> + ?Sized,
    {
        let mut current_time = initial_time;
        self.advance_timers(current_time);

        while let Some(id) = self.peek_ready() {
            let Some((priority, expiration_time)) =
                self.tasks.get(&id).map(|t| (t.priority, t.expiration_time))
            else {
                break;
            };
            if expiration_time > current_time && self.should_yield_to_host() {
                break;
            }
            let Some(callback) = self.tasks.get_mut(&id).and_then(|t| t.callback.take()) else {
                break;
            };
            let did_timeout = expiration_time <= current_time;

            self.current_task = Some(TaskId(id));
            self.current_priority = priority;
            let continuation = runner.run_task(
                self,
                RunningTask {
                    id: TaskId(id),
                    priority,
                    did_timeout,
                    callback,
                },
            );
            current_time = self.now();

            match (continuation, self.tasks.get_mut(&id)) {
                (Some(next), Some(task)) if !task.cancelled => {
                    task.callback = Some(next);
                    self.advance_timers(current_time);
                    return true;
                }
                _ => {
                    if self.task_queue.peek().map(|e| e.id) == Some(id) {
                        self.task_queue.pop();
                    }
                    self.tasks.remove(&id);
                    self.advance_timers(current_time);
                }
            }
        }
        self.current_task = None;

        if self.peek_ready().is_some() {
            true
        } else {
            if let Some(start) = self.first_timer_start() {
                self.is_host_timeout_scheduled = true;
                self.host
                    .request_timeout(start.saturating_duration_since(current_time));
            }
            false
        }
    }

    /// Moves delayed tasks whose start time has arrived into the ready queue.
    fn advance_timers(&mut self, current_time: HostTime) {
        while let Some(entry) = self.timer_queue.peek().copied() {
            let live = self.tasks.get(&entry.id).filter(|t| !t.cancelled);
            match live {
                None => {
                    self.timer_queue.pop();
                    self.tasks.remove(&entry.id);
                }
                Some(task) if task.start_time <= current_time => {
                    let expiration = task.expiration_time;
                    self.timer_queue.pop();
                    self.task_queue.push(QueueEntry {
                        id: entry.id,
                        sort_index: expiration.ticks(),
                    });
                }
                Some(_) => return,
            }
        }
    }

    /// Returns the head of the ready queue, discarding cancelled entries.
    fn peek_ready(&mut self) -> Option<u64> {
        while let Some(entry) = self.task_queue.peek().copied() {
            match self.tasks.get(&entry.id) {
                Some(task) if !task.cancelled && task.callback.is_some() => return Some(entry.id),
                _ => {
                    self.task_queue.pop();
                    self.tasks.remove(&entry.id);
                }
            }
        }
        None
    }

    fn first_timer_start(&self) -> Option<HostTime> {
        let entry = self.timer_queue.peek()?;
        self.tasks.get(&entry.id).map(|t| t.start_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ManualLoop;
    use alloc::vec;
    use alloc::vec::Vec;

    type S = Scheduler<&'static str>;
    type Task = RunningTask<&'static str>;

    fn scheduler(clock: &ManualLoop) -> S {
        Scheduler::new(SchedulerConfig::DEFAULT, Rc::new(clock.clone()))
    }

    fn record<'a>(log: &'a mut Vec<&'static str>) -> impl FnMut(&mut S, Task) -> Option<&'static str> + 'a {
        move |_, task| {
            log.push(task.callback);
            None
        }
    }

    #[test]
    fn expiration_adds_priority_timeout() {
        let config = SchedulerConfig::DEFAULT;
        let start = HostTime::from_millis(1_000);
        assert_eq!(
            config.expiration(PriorityLevel::UserBlocking, start),
            HostTime::from_millis(1_250)
        );
        assert_eq!(
            config.expiration(PriorityLevel::Normal, start),
            HostTime::from_millis(6_000)
        );
        assert_eq!(
            config.expiration(PriorityLevel::Low, start),
            HostTime::from_millis(11_000)
        );
        assert_eq!(
            config.expiration(PriorityLevel::Immediate, start),
            HostTime::from_millis(999),
            "immediate is already expired"
        );
        assert_eq!(
            config.expiration(PriorityLevel::Idle, start),
            HostTime::from_millis(1_000 + MAX_SIGNED_31_BIT_INT)
        );
    }

    #[test]
    fn scheduling_posts_a_single_message() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        s.schedule_callback(PriorityLevel::Normal, "a", None);
        s.schedule_callback(PriorityLevel::Normal, "b", None);
        assert_eq!(clock.posted_messages(), 1, "one host callback in flight");
        assert!(s.is_message_loop_running());
    }

    #[test]
    fn immediate_runs_before_earlier_normal() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        s.schedule_callback(PriorityLevel::Normal, "normal", None);
        clock.advance(Duration::from_millis(1));
        s.schedule_callback(PriorityLevel::Immediate, "immediate", None);

        let mut log = Vec::new();
        let more = s.perform_work_until_deadline(&mut record(&mut log));
        assert!(!more, "queue drained");
        assert_eq!(log, vec!["immediate", "normal"]);
        assert!(!s.is_message_loop_running());
    }

    #[test]
    fn equal_priority_runs_fifo() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        for name in ["a", "b", "c"] {
            s.schedule_callback(PriorityLevel::UserBlocking, name, None);
        }
        let mut log = Vec::new();
        s.perform_work_until_deadline(&mut record(&mut log));
        assert_eq!(log, vec!["a", "b", "c"]);
    }

    #[test]
    fn cancelled_task_is_skipped() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        let a = s.schedule_callback(PriorityLevel::Normal, "a", None);
        s.schedule_callback(PriorityLevel::Normal, "b", None);
        s.cancel_callback(a);
        assert_eq!(s.pending_tasks(), 1);

        let mut log = Vec::new();
        s.perform_work_until_deadline(&mut record(&mut log));
        assert_eq!(log, vec!["b"]);
        assert!(!s.has_pending_work());
    }

    #[test]
    fn yields_when_slice_is_exhausted() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        for name in ["a", "b", "c"] {
            s.schedule_callback(PriorityLevel::Normal, name, None);
        }
        let mut log = Vec::new();
        let tick = clock.clone();
        let more = s.perform_work_until_deadline(&mut |_: &mut S, task: Task| {
            log.push(task.callback);
            tick.advance(Duration::from_millis(3));
            None
        });
        assert!(more, "third task waits for the next slice");
        assert_eq!(log, vec!["a", "b"]);
        assert_eq!(clock.posted_messages(), 2, "continuation message posted");
    }

    #[test]
    fn expired_task_runs_even_when_slice_is_over() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        s.schedule_callback(PriorityLevel::UserBlocking, "late", None);
        s.schedule_callback(PriorityLevel::UserBlocking, "later", None);
        clock.advance(Duration::from_millis(300));

        let mut log = Vec::new();
        let tick = clock.clone();
        s.perform_work_until_deadline(&mut |_: &mut S, task: Task| {
            assert!(task.did_timeout, "task expired before it ran");
            log.push(task.callback);
            tick.advance(Duration::from_millis(10));
            None
        });
        assert_eq!(log, vec!["late", "later"]);
    }

    #[test]
    fn continuation_keeps_task_at_head() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        let id = s.schedule_callback(PriorityLevel::Normal, "step-1", None);
        s.schedule_callback(PriorityLevel::Normal, "other", None);

        let mut seen = Vec::new();
        let more = s.perform_work_until_deadline(&mut |_: &mut S, task: Task| {
            seen.push((task.id, task.callback));
            match task.callback {
                "step-1" => Some("step-2"),
                _ => None,
            }
        });
        assert!(more, "continuation ends the slice");
        assert_eq!(seen, vec![(id, "step-1")]);

        seen.clear();
        s.perform_work_until_deadline(&mut |_: &mut S, task: Task| {
            seen.push((task.id, task.callback));
            None
        });
        assert_eq!(seen[0], (id, "step-2"), "same task resumes first");
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn cancelling_the_running_task_drops_its_continuation() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        s.schedule_callback(PriorityLevel::Normal, "self-cancel", None);
        let more = s.perform_work_until_deadline(&mut |s: &mut S, task: Task| {
            s.cancel_callback(task.id);
            Some("again")
        });
        assert!(!more);
        assert!(!s.has_pending_work());
    }

    #[test]
    fn delayed_task_arms_timer_and_promotes_on_timeout() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        s.schedule_callback(PriorityLevel::Normal, "later", Some(Duration::from_millis(40)));
        assert_eq!(clock.posted_messages(), 0, "nothing ready yet");
        assert_eq!(clock.armed_timeout(), Some(Duration::from_millis(40)));

        clock.advance(Duration::from_millis(40));
        s.handle_timeout();
        assert_eq!(clock.posted_messages(), 1, "timer promotion posts work");

        let mut log = Vec::new();
        s.perform_work_until_deadline(&mut record(&mut log));
        assert_eq!(log, vec!["later"]);
    }

    #[test]
    fn earlier_delayed_task_rearms_timer() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        s.schedule_callback(PriorityLevel::Normal, "slow", Some(Duration::from_millis(100)));
        s.schedule_callback(PriorityLevel::Normal, "fast", Some(Duration::from_millis(10)));
        assert_eq!(clock.armed_timeout(), Some(Duration::from_millis(10)));
        assert_eq!(clock.cancelled_timeouts(), 1);
    }

    #[test]
    fn drained_queue_arms_timer_for_first_delayed_task() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        s.schedule_callback(PriorityLevel::Normal, "now", None);
        s.schedule_callback(PriorityLevel::Low, "soon", Some(Duration::from_millis(20)));
        let mut log = Vec::new();
        s.perform_work_until_deadline(&mut record(&mut log));
        assert_eq!(log, vec!["now"]);
        assert_eq!(clock.armed_timeout(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn runner_can_schedule_more_work() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        s.schedule_callback(PriorityLevel::Normal, "parent", None);
        let mut log = Vec::new();
        s.perform_work_until_deadline(&mut |s: &mut S, task: Task| {
            log.push(task.callback);
            if task.callback == "parent" {
                s.schedule_callback(PriorityLevel::Normal, "child", None);
            }
            None
        });
        assert_eq!(log, vec!["parent", "child"]);
    }

    #[test]
    fn perform_without_posted_message_is_noop() {
        let clock = ManualLoop::new();
        let mut s = scheduler(&clock);
        let mut log = Vec::new();
        assert!(!s.perform_work_until_deadline(&mut record(&mut log)));
        assert!(log.is_empty());
    }

    #[test]
    fn priority_round_trips_through_u8() {
        for p in [
            PriorityLevel::Immediate,
            PriorityLevel::UserBlocking,
            PriorityLevel::Normal,
            PriorityLevel::Low,
            PriorityLevel::Idle,
        ] {
            assert_eq!(PriorityLevel::from_u8(p as u8), Some(p));
        }
        assert_eq!(PriorityLevel::from_u8(0), None);
    }
}
