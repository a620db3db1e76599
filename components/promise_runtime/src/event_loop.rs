//! Event loop implementation.
//!
//! The event loop is the host scheduling facility promises run on. It owns
//! a FIFO task queue and a timer queue driven by a virtual clock, so
//! execution order is fully deterministic.

use crate::error::EventLoopError;
use crate::task_queue::{Task, TaskQueue, TimerQueue};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::trace;

/// Event loop configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLoopConfig {
    /// Maximum number of turns a single `run_until_done` may take.
    /// `None` means unlimited.
    pub max_turns: Option<usize>,
    /// Initial reading of the virtual clock, in milliseconds.
    pub start_time_ms: u64,
}

/// Builder for configuring and creating an [`EventLoop`].
///
/// # Examples
///
/// ```
/// use promise_runtime::EventLoopBuilder;
///
/// let event_loop = EventLoopBuilder::new()
///     .max_turns(1_000)
///     .start_time_ms(500)
///     .build();
/// assert_eq!(event_loop.now_ms(), 500);
/// ```
#[derive(Debug, Default)]
pub struct EventLoopBuilder {
    config: EventLoopConfig,
}

impl EventLoopBuilder {
    /// Creates a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of turns a single `run_until_done` may take.
    pub fn max_turns(mut self, limit: usize) -> Self {
        self.config.max_turns = Some(limit);
        self
    }

    /// Sets the initial virtual clock reading.
    pub fn start_time_ms(mut self, now_ms: u64) -> Self {
        self.config.start_time_ms = now_ms;
        self
    }

    /// Builds the event loop.
    pub fn build(self) -> EventLoop {
        EventLoop::with_config(self.config)
    }
}

#[derive(Debug)]
struct LoopShared {
    tasks: RefCell<TaskQueue>,
    timers: RefCell<TimerQueue>,
    now_ms: Cell<u64>,
    next_promise_id: Cell<u64>,
}

/// A cloneable handle for scheduling work on an [`EventLoop`].
///
/// Every promise keeps the handle of the loop it was created on, and
/// derived promises inherit it.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    shared: Rc<LoopShared>,
}

impl LoopHandle {
    /// Queues a task to run after the current task completes.
    ///
    /// Tasks queued from the same context run in the order they were queued.
    pub fn schedule(&self, task: Task) {
        let mut tasks = self.shared.tasks.borrow_mut();
        tasks.enqueue(task);
        trace!(queued = tasks.len(), "task scheduled");
    }

    /// Queues a task to run once the virtual clock has advanced by `delay_ms`.
    pub fn set_timeout(&self, delay_ms: u64, task: Task) {
        let due_ms = self.now_ms().saturating_add(delay_ms);
        self.shared.timers.borrow_mut().insert(due_ms, task);
        trace!(due_ms, "timer set");
    }

    /// Current reading of the virtual clock.
    pub fn now_ms(&self) -> u64 {
        self.shared.now_ms.get()
    }

    /// Number of tasks waiting in the task queue.
    pub fn pending_tasks(&self) -> usize {
        self.shared.tasks.borrow().len()
    }

    /// Number of timers that have not fired yet.
    pub fn pending_timers(&self) -> usize {
        self.shared.timers.borrow().len()
    }

    /// Returns true if both handles drive the same loop.
    pub fn same_loop(&self, other: &LoopHandle) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn next_promise_id(&self) -> u64 {
        let id = self.shared.next_promise_id.get();
        self.shared.next_promise_id.set(id + 1);
        id
    }
}

/// The event loop.
///
/// Each turn of the loop runs exactly one task. When the task queue is
/// empty the virtual clock jumps to the earliest timer and that timer's
/// task runs instead.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Task};
///
/// let mut event_loop = EventLoop::new();
/// event_loop.handle().schedule(Task::new(|| Ok(())));
/// event_loop.run_until_done().unwrap();
/// assert!(event_loop.is_idle());
/// ```
#[derive(Debug)]
pub struct EventLoop {
    handle: LoopHandle,
    config: EventLoopConfig,
}

impl EventLoop {
    /// Creates a new EventLoop with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    /// Creates a new EventLoop with the given configuration.
    pub fn with_config(config: EventLoopConfig) -> Self {
        let shared = LoopShared {
            tasks: RefCell::new(TaskQueue::new()),
            timers: RefCell::new(TimerQueue::new()),
            now_ms: Cell::new(config.start_time_ms),
            next_promise_id: Cell::new(0),
        };
        Self {
            handle: LoopHandle {
                shared: Rc::new(shared),
            },
            config,
        }
    }

    /// Returns a builder for a configured loop.
    pub fn builder() -> EventLoopBuilder {
        EventLoopBuilder::new()
    }

    /// Returns a handle for scheduling work on this loop.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// The configuration this loop was built with.
    pub fn config(&self) -> &EventLoopConfig {
        &self.config
    }

    /// Current reading of the virtual clock.
    pub fn now_ms(&self) -> u64 {
        self.handle.now_ms()
    }

    /// Returns true if no tasks or timers remain.
    pub fn is_idle(&self) -> bool {
        self.handle.pending_tasks() == 0 && self.handle.pending_timers() == 0
    }

    /// Runs a single turn.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if a task ran, `Ok(false)` if there was nothing to do.
    pub fn turn(&mut self) -> Result<bool, EventLoopError> {
        let shared = &self.handle.shared;
        let next = shared.tasks.borrow_mut().dequeue();
        let task = match next {
            Some(task) => task,
            None => {
                let timer = shared.timers.borrow_mut().pop_next();
                let Some((due_ms, task)) = timer else {
                    return Ok(false);
                };
                if due_ms > shared.now_ms.get() {
                    shared.now_ms.set(due_ms);
                }
                trace!(now_ms = shared.now_ms.get(), "timer fired");
                task
            }
        };
        task.run()?;
        Ok(true)
    }

    /// Runs the event loop until all tasks and timers are processed.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the loop is idle, or an error if a task failed or the
    /// configured turn limit was reached with work still pending.
    pub fn run_until_done(&mut self) -> Result<(), EventLoopError> {
        let mut turns = 0usize;
        while self.turn()? {
            turns += 1;
            if let Some(limit) = self.config.max_turns {
                if turns >= limit && !self.is_idle() {
                    return Err(EventLoopError::TurnLimitExceeded { limit });
                }
            }
        }
        Ok(())
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}
