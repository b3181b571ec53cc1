#![forbid(unsafe_code)]

//! Deferred execution.
//!
//! [`Scheduler`] is the capability the overlay controller consumes.
//! [`TaskQueue`] is a host-pumped implementation: the host owns the loop and
//! calls [`TaskQueue::run_turn`] once per turn with the current time.
//!
//! # Invariants
//!
//! 1. A task deferred while a turn is running never runs in that same turn.
//! 2. Tasks run in deadline order; equal deadlines run in submission order.
//! 3. The queue clock never moves backwards. Passing an earlier instant to
//!    `run_turn` runs what is due at the current clock.
//!
//! # Failure Modes
//!
//! - A panicking task propagates out of `run_turn`; tasks already extracted
//!   for that turn but not yet run are dropped.

use core::cmp::Ordering;
use core::time::Duration;
use std::cell::RefCell;
use std::collections::BinaryHeap;

use web_time::Instant;

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// Deferred-execution capability.
pub trait Scheduler {
    /// Run `task` on the next turn of the host loop.
    fn defer(&self, task: Task);

    /// Run `task` once `delay` has elapsed.
    fn defer_for(&self, delay: Duration, task: Task);
}

struct Scheduled {
    due: Instant,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so the max-heap pops the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueState {
    now: Instant,
    next_seq: u64,
    pending: BinaryHeap<Scheduled>,
}

/// Host-pumped task queue.
pub struct TaskQueue {
    state: RefCell<QueueState>,
}

impl TaskQueue {
    /// Create an empty queue whose clock starts at `now`.
    #[must_use]
    pub fn new(now: Instant) -> Self {
        Self {
            state: RefCell::new(QueueState {
                now,
                next_seq: 0,
                pending: BinaryHeap::new(),
            }),
        }
    }

    /// Current queue clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.state.borrow().now
    }

    /// Number of tasks waiting.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deadline of the earliest waiting task.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.borrow().pending.peek().map(|s| s.due)
    }

    /// Advance the clock to `now` and run every task already due.
    ///
    /// Returns the number of tasks run.
    pub fn run_turn(&self, now: Instant) -> usize {
        let due = {
            let mut state = self.state.borrow_mut();
            if now > state.now {
                state.now = now;
            }
            let clock = state.now;
            let mut due = Vec::new();
            while state.pending.peek().is_some_and(|s| s.due <= clock) {
                if let Some(scheduled) = state.pending.pop() {
                    due.push(scheduled.task);
                }
            }
            due
        };

        let count = due.len();
        #[cfg(feature = "tracing")]
        if count > 0 {
            tracing::trace!(tasks = count, "task queue turn");
        }
        for task in due {
            task();
        }
        count
    }

    /// Run turns at the current clock until nothing is due, up to
    /// `max_turns`. Returns the total number of tasks run.
    pub fn run_until_idle(&self, max_turns: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_turns {
            let ran = self.run_turn(self.now());
            if ran == 0 {
                break;
            }
            total += ran;
        }
        total
    }

    fn push(&self, delay: Duration, task: Task) {
        let mut state = self.state.borrow_mut();
        let due = state.now + delay;
        let seq = state.next_seq;
        state.next_seq += 1;
        state.pending.push(Scheduled { due, seq, task });
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(Instant::now())
    }
}

impl Scheduler for TaskQueue {
    fn defer(&self, task: Task) {
        self.push(Duration::ZERO, task);
    }

    fn defer_for(&self, delay: Duration, task: Task) {
        self.push(delay, task);
    }
}
