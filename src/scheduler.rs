use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tracing::debug;

/// Work the application knows how to run when a scheduled deadline passes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    ClockTick,
    CountdownTick,
    ExpireNotice(u64),
}

/// Opaque handle returned by [`Scheduler::schedule`], used for cancellation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Deferred execution capability injected into the application context.
pub trait Scheduler {
    /// Arrange for `task` to run once `delay` has elapsed.
    fn schedule(&mut self, delay: Duration, task: Task) -> TaskHandle;
    /// Drop a pending task. Returns false if it already ran or was cancelled.
    fn cancel(&mut self, handle: TaskHandle) -> bool;
}

/// Virtual-time task queue.
///
/// Time only moves when the owner calls [`TaskQueue::pop_due`] or
/// [`TaskQueue::advance_to`], so the same queue serves the real event loop
/// (fed with measured elapsed time) and tests (fed with exact steps).
#[derive(Debug, Default)]
pub struct TaskQueue {
    now: Duration,
    next_id: u64,
    pending: BTreeMap<(Duration, u64), Task>,
    due_by_id: HashMap<u64, Duration>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Virtual time elapsed since the queue was created
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.due_by_id.contains_key(&handle.0)
    }

    /// Deadline of the earliest pending task
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Removes the earliest task due at or before `until` and moves the clock
    /// to its deadline. Tasks with equal deadlines come out in schedule order.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TaskHandle, Task)> {
        let (&(due, id), _) = self.pending.iter().next()?;
        if due > until {
            return None;
        }
        let task = self.pending.remove(&(due, id))?;
        self.due_by_id.remove(&id);
        if due > self.now {
            self.now = due;
        }
        Some((TaskHandle(id), task))
    }

    /// Moves the clock forward without running anything. Never goes backwards.
    pub fn advance_to(&mut self, until: Duration) {
        if until > self.now {
            self.now = until;
        }
    }
}

impl Scheduler for TaskQueue {
    fn schedule(&mut self, delay: Duration, task: Task) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        let due = self.now.saturating_add(delay);
        self.pending.insert((due, id), task);
        self.due_by_id.insert(id, due);
        debug!(?task, id, due_ms = due.as_millis() as u64, "task scheduled");
        TaskHandle(id)
    }

    fn cancel(&mut self, handle: TaskHandle) -> bool {
        match self.due_by_id.remove(&handle.0) {
            Some(due) => {
                self.pending.remove(&(due, handle.0));
                debug!(id = handle.0, "task cancelled");
                true
            }
            None => false,
        }
    }
}
