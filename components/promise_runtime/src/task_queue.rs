//! Task and timer queue management.
//!
//! This module provides the queues used by the event loop. Tasks run one at
//! a time in FIFO order; timers hold tasks until the virtual clock reaches
//! their due time.

use core_types::JsError;
use std::collections::{BTreeMap, VecDeque};

/// A task to be executed by the event loop.
///
/// Tasks represent work to be done in a later turn of the event loop.
/// Promise reactions, timer callbacks and user work all run as tasks.
pub struct Task {
    callback: Box<dyn FnOnce() -> Result<(), JsError>>,
}

impl Task {
    /// Creates a new Task from a closure.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute when the task runs
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<(), JsError> + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Executes the task.
    ///
    /// # Returns
    ///
    /// The result of the task execution.
    pub fn run(self) -> Result<(), JsError> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ ... }}")
    }
}

/// A queue for tasks.
///
/// Tasks are processed in FIFO order, one at a time.
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Task>,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a task to the end of the queue.
    pub fn enqueue(&mut self, task: Task) {
        self.queue.push_back(task);
    }

    /// Removes and returns the next task from the queue.
    pub fn dequeue(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Tasks waiting for a point on the virtual clock.
///
/// Timers are ordered by due time, then by insertion order, so two timers
/// due at the same millisecond fire in the order they were set.
#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: BTreeMap<(u64, u64), Task>,
    next_seq: u64,
}

impl TimerQueue {
    /// Creates a new empty TimerQueue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task that becomes runnable at `due_ms`.
    pub fn insert(&mut self, due_ms: u64, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.timers.insert((due_ms, seq), task);
    }

    /// Removes the earliest timer, returning its due time and task.
    pub fn pop_next(&mut self) -> Option<(u64, Task)> {
        self.timers
            .pop_first()
            .map(|((due_ms, _seq), task)| (due_ms, task))
    }

    /// Returns true if no timers are waiting.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Returns the number of waiting timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }
}
