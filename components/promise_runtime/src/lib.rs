//! Promises on a deterministic, single-threaded event loop.
//!
//! This crate provides:
//! - A promise that settles exactly once and chains reactions with `then`
//! - The resolution procedure that unwraps promises returned by reactions
//! - The `all`, `race`, `resolve` and `reject` combinators
//! - An event loop with a FIFO task queue and virtual-clock timers
//!
//! # Overview
//!
//! - [`EventLoop`] - Runs queued tasks and timers
//! - [`LoopHandle`] - Schedules work on a loop; every promise holds one
//! - [`Promise`] - The deferred value
//! - [`Resolver`] - The capability to settle a promise
//! - [`Handler`] - A reaction passed to `then`, `catch` or `finally`
//!
//! Reactions always run as separate tasks, so `then` returns before any
//! of them runs and reactions on one promise run in registration order.
//!
//! # Examples
//!
//! ```
//! use promise_runtime::{EventLoop, Handler, Promise, PromiseValue, Task};
//! use core_types::JsError;
//!
//! let mut event_loop = EventLoop::new();
//! let handle = event_loop.handle();
//!
//! let promise = Promise::new(&handle, |resolver| {
//!     handle.set_timeout(1000, Task::new(move || {
//!         resolver.resolve("成功");
//!         Ok(())
//!     }));
//!     Ok(())
//! });
//! let recovered = promise
//!     .then(Some(Handler::new(|_| Err(JsError::error("E")))), None)
//!     .catch(Handler::new(|reason: JsError| Ok(reason.message.into())));
//!
//! event_loop.run_until_done().unwrap();
//! assert_eq!(event_loop.now_ms(), 1000);
//! assert_eq!(recovered.value(), Some(PromiseValue::from("E")));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod combinators;
pub mod error;
pub mod event_loop;
pub mod promise;
mod resolution;
pub mod task_queue;

// Re-export main types at crate root
pub use error::EventLoopError;
pub use event_loop::{EventLoop, EventLoopBuilder, EventLoopConfig, LoopHandle};
pub use promise::{Handler, Outcome, Promise, PromiseState, PromiseValue, Resolver};
pub use task_queue::{Task, TaskQueue, TimerQueue};
