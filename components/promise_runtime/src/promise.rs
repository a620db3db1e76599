//! Promise implementation.
//!
//! A [`Promise`] settles exactly once, either fulfilled with a
//! [`PromiseValue`] or rejected with a [`JsError`]. Reactions registered
//! with [`Promise::then`] never run inline: they are queued on the
//! promise's event loop, even when the promise has already settled.

use crate::event_loop::LoopHandle;
use crate::resolution::resolve_promise;
use crate::task_queue::Task;
use core_types::{JsError, Value};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};
use tracing::{debug, trace};

/// The state of a Promise.
///
/// Once settled (Fulfilled or Rejected), a Promise cannot change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    /// The initial state; the promise is neither fulfilled nor rejected.
    Pending,
    /// The promise has been resolved with a value.
    Fulfilled,
    /// The promise has been rejected with an error.
    Rejected,
}

/// What a promise can be fulfilled with.
///
/// The `Promise` variant is how the resolution procedure and the
/// combinators recognise another deferred value.
#[derive(Debug, Clone)]
pub enum PromiseValue {
    /// An ordinary value.
    Plain(Value),
    /// An ordered list of values, as produced by [`Promise::all`].
    List(Vec<PromiseValue>),
    /// Another promise.
    Promise(Promise),
}

impl PromiseValue {
    /// The `undefined` value.
    pub fn undefined() -> Self {
        PromiseValue::Plain(Value::Undefined)
    }

    /// Returns the ordinary value, if this is one.
    pub fn as_plain(&self) -> Option<&Value> {
        match self {
            PromiseValue::Plain(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the list, if this is one.
    pub fn as_list(&self) -> Option<&[PromiseValue]> {
        match self {
            PromiseValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the promise, if this is one.
    pub fn as_promise(&self) -> Option<&Promise> {
        match self {
            PromiseValue::Promise(promise) => Some(promise),
            _ => None,
        }
    }

    /// Returns true if this is a promise.
    pub fn is_promise(&self) -> bool {
        matches!(self, PromiseValue::Promise(_))
    }
}

impl Default for PromiseValue {
    fn default() -> Self {
        Self::undefined()
    }
}

/// Promises compare by identity; ordinary values and lists by content.
impl PartialEq for PromiseValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PromiseValue::Plain(a), PromiseValue::Plain(b)) => a == b,
            (PromiseValue::List(a), PromiseValue::List(b)) => a == b,
            (PromiseValue::Promise(a), PromiseValue::Promise(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Value> for PromiseValue {
    fn from(value: Value) -> Self {
        PromiseValue::Plain(value)
    }
}

impl From<Promise> for PromiseValue {
    fn from(promise: Promise) -> Self {
        PromiseValue::Promise(promise)
    }
}

impl From<Vec<PromiseValue>> for PromiseValue {
    fn from(items: Vec<PromiseValue>) -> Self {
        PromiseValue::List(items)
    }
}

impl From<bool> for PromiseValue {
    fn from(b: bool) -> Self {
        PromiseValue::Plain(Value::from(b))
    }
}

impl From<i32> for PromiseValue {
    fn from(n: i32) -> Self {
        PromiseValue::Plain(Value::from(n))
    }
}

impl From<f64> for PromiseValue {
    fn from(n: f64) -> Self {
        PromiseValue::Plain(Value::from(n))
    }
}

impl From<&str> for PromiseValue {
    fn from(s: &str) -> Self {
        PromiseValue::Plain(Value::from(s))
    }
}

impl From<String> for PromiseValue {
    fn from(s: String) -> Self {
        PromiseValue::Plain(Value::from(s))
    }
}

/// The result of running a handler: a value to resolve with, or an error
/// to reject with.
pub type Outcome = Result<PromiseValue, JsError>;

/// A reaction handler.
///
/// `Handler<PromiseValue>` reacts to fulfillment, `Handler<JsError>` to
/// rejection and `Handler<()>` is the callback of [`Promise::finally`].
/// Returning `Err` is how a handler raises an error.
pub struct Handler<T> {
    callback: Box<dyn FnOnce(T) -> Outcome>,
}

impl<T> Handler<T> {
    /// Creates a new Handler from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce(T) -> Outcome + 'static,
    {
        Self {
            callback: Box::new(f),
        }
    }

    /// Calls the handler.
    pub fn call(self, arg: T) -> Outcome {
        (self.callback)(arg)
    }
}

impl<T> std::fmt::Debug for Handler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Handler {{ ... }}")
    }
}

type Thunk = Box<dyn FnOnce()>;

enum Status {
    Pending,
    Fulfilled(PromiseValue),
    Rejected(JsError),
}

impl Status {
    fn outcome(&self) -> Option<Outcome> {
        match self {
            Status::Pending => None,
            Status::Fulfilled(value) => Some(Ok(value.clone())),
            Status::Rejected(reason) => Some(Err(reason.clone())),
        }
    }
}

struct PromiseInner {
    id: u64,
    status: Status,
    success_queue: VecDeque<Thunk>,
    failure_queue: VecDeque<Thunk>,
    handle: LoopHandle,
}

/// A promise.
///
/// Cloning a `Promise` clones the handle, not the state: all clones
/// observe the same settlement.
///
/// # Examples
///
/// ```
/// use promise_runtime::{EventLoop, Handler, Promise, PromiseState, PromiseValue};
///
/// let mut event_loop = EventLoop::new();
/// let handle = event_loop.handle();
///
/// let promise = Promise::new(&handle, |resolver| {
///     resolver.resolve(21);
///     Ok(())
/// });
/// let doubled = promise.then(
///     Some(Handler::new(|value: PromiseValue| {
///         let n = match value.as_plain() {
///             Some(core_types::Value::Smi(n)) => *n,
///             _ => 0,
///         };
///         Ok((n * 2).into())
///     })),
///     None,
/// );
///
/// assert_eq!(doubled.state(), PromiseState::Pending);
/// event_loop.run_until_done().unwrap();
/// assert_eq!(doubled.value(), Some(42.into()));
/// ```
#[derive(Clone)]
pub struct Promise {
    inner: Rc<RefCell<PromiseInner>>,
}

impl Promise {
    /// Creates a promise and runs `producer` synchronously with its
    /// [`Resolver`].
    ///
    /// If the producer returns `Err`, the promise is rejected with that
    /// error, unless the producer already settled it.
    pub fn new<F>(handle: &LoopHandle, producer: F) -> Promise
    where
        F: FnOnce(Resolver) -> Result<(), JsError>,
    {
        let (promise, resolver) = Promise::with_resolvers(handle);
        if let Err(err) = producer(resolver.clone()) {
            resolver.reject(err);
        }
        promise
    }

    /// Creates a pending promise together with the capability to settle it.
    pub fn with_resolvers(handle: &LoopHandle) -> (Promise, Resolver) {
        let promise = Promise::pending(handle);
        let resolver = Resolver {
            promise: promise.clone(),
        };
        (promise, resolver)
    }

    pub(crate) fn pending(handle: &LoopHandle) -> Promise {
        let inner = PromiseInner {
            id: handle.next_promise_id(),
            status: Status::Pending,
            success_queue: VecDeque::new(),
            failure_queue: VecDeque::new(),
            handle: handle.clone(),
        };
        Promise {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    /// Identifier unique within the promise's event loop.
    pub fn id(&self) -> u64 {
        self.inner.borrow().id
    }

    /// Current state.
    pub fn state(&self) -> PromiseState {
        match self.inner.borrow().status {
            Status::Pending => PromiseState::Pending,
            Status::Fulfilled(_) => PromiseState::Fulfilled,
            Status::Rejected(_) => PromiseState::Rejected,
        }
    }

    /// Returns true while the promise is unsettled.
    pub fn is_pending(&self) -> bool {
        self.state() == PromiseState::Pending
    }

    /// The fulfillment value, if fulfilled.
    pub fn value(&self) -> Option<PromiseValue> {
        match &self.inner.borrow().status {
            Status::Fulfilled(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// The rejection reason, if rejected.
    pub fn reason(&self) -> Option<JsError> {
        match &self.inner.borrow().status {
            Status::Rejected(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Returns true if both are the same promise.
    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn downgrade(&self) -> WeakPromise {
        WeakPromise {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// The handle of the event loop this promise schedules reactions on.
    pub fn handle(&self) -> LoopHandle {
        self.inner.borrow().handle.clone()
    }

    /// Registers reactions and returns the promise they settle.
    ///
    /// A missing `on_fulfilled` passes the value through; a missing
    /// `on_rejected` re-raises the reason. The applicable handler runs in
    /// its own task, never before `then` returns, and its outcome settles
    /// the returned promise through the resolution procedure.
    pub fn then(
        &self,
        on_fulfilled: Option<Handler<PromiseValue>>,
        on_rejected: Option<Handler<JsError>>,
    ) -> Promise {
        let on_fulfilled = on_fulfilled.unwrap_or_else(|| Handler::new(Ok));
        let on_rejected = on_rejected.unwrap_or_else(|| Handler::new(Err));
        let handle = self.handle();
        let derived = Promise::pending(&handle);

        let mut inner = self.inner.borrow_mut();
        let settled = inner.status.outcome();
        match settled {
            Some(Ok(value)) => schedule_reaction(&handle, on_fulfilled, value, derived.clone()),
            Some(Err(reason)) => schedule_reaction(&handle, on_rejected, reason, derived.clone()),
            None => {
                let source = Rc::downgrade(&self.inner);
                let (handle_ok, derived_ok) = (handle.clone(), derived.clone());
                inner.success_queue.push_back(Box::new(move || {
                    if let Some(Ok(value)) = settled_outcome(&source) {
                        schedule_reaction(&handle_ok, on_fulfilled, value, derived_ok);
                    }
                }));

                let source = Rc::downgrade(&self.inner);
                let derived_err = derived.clone();
                inner.failure_queue.push_back(Box::new(move || {
                    if let Some(Err(reason)) = settled_outcome(&source) {
                        schedule_reaction(&handle, on_rejected, reason, derived_err);
                    }
                }));
            }
        }
        trace!(source = inner.id, derived = derived.id(), "reaction registered");
        derived
    }

    /// Registers a rejection handler. Same as `then(None, Some(on_rejected))`.
    pub fn catch(&self, on_rejected: Handler<JsError>) -> Promise {
        self.then(None, Some(on_rejected))
    }

    /// Runs `on_settled` on either path without observing the outcome.
    ///
    /// The returned promise settles like this one, unless `on_settled`
    /// raises or returns a promise that rejects. If it returns a promise,
    /// settlement waits for it.
    pub fn finally(&self, on_settled: Handler<()>) -> Promise {
        let slot = Rc::new(RefCell::new(Some(on_settled)));
        let handle = self.handle();
        let (slot_ok, handle_ok) = (slot.clone(), handle.clone());

        self.then(
            Some(Handler::new(move |value: PromiseValue| {
                let result = run_settled(&slot_ok)?;
                let waited = Promise::resolve(&handle_ok, result);
                Ok(waited
                    .then(Some(Handler::new(move |_| Ok(value))), None)
                    .into())
            })),
            Some(Handler::new(move |reason: JsError| {
                let result = run_settled(&slot)?;
                let waited = Promise::resolve(&handle, result);
                Ok(waited
                    .then(Some(Handler::new(move |_| Err(reason))), None)
                    .into())
            })),
        )
    }

    /// Transitions out of `Pending` and drains the matching queue.
    ///
    /// Returns false, and does nothing, if already settled.
    pub(crate) fn settle(&self, outcome: Outcome) -> bool {
        let (run, discard) = {
            let mut inner = self.inner.borrow_mut();
            if !matches!(inner.status, Status::Pending) {
                trace!(promise = inner.id, "settle ignored, already settled");
                return false;
            }
            let success = std::mem::take(&mut inner.success_queue);
            let failure = std::mem::take(&mut inner.failure_queue);
            match outcome {
                Ok(value) => {
                    debug!(promise = inner.id, value = ?value, "promise fulfilled");
                    inner.status = Status::Fulfilled(value);
                    (success, failure)
                }
                Err(reason) => {
                    debug!(promise = inner.id, reason = %reason, "promise rejected");
                    inner.status = Status::Rejected(reason);
                    (failure, success)
                }
            }
        };
        drop(discard);
        drain(run);
        true
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(inner) => {
                let state = match inner.status {
                    Status::Pending => "pending",
                    Status::Fulfilled(_) => "fulfilled",
                    Status::Rejected(_) => "rejected",
                };
                write!(f, "Promise#{}({})", inner.id, state)
            }
            Err(_) => write!(f, "Promise(<borrowed>)"),
        }
    }
}

/// A non-owning reference to a promise.
#[derive(Clone)]
pub(crate) struct WeakPromise {
    inner: Weak<RefCell<PromiseInner>>,
}

impl WeakPromise {
    /// Returns true if this refers to `promise`.
    pub(crate) fn refers_to(&self, promise: &Promise) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Rc::as_ptr(&promise.inner))
    }
}

/// The settle capability of a promise.
///
/// The first call to [`resolve`](Self::resolve) or
/// [`reject`](Self::reject) wins; later calls are ignored.
///
/// `resolve` stores its argument as is. Passing another promise does not
/// adopt that promise's outcome: it becomes the fulfillment value. Only
/// the outcome of a reaction goes through the unwrapping resolution
/// procedure.
///
/// A promise resolved with itself holds a strong reference to itself and
/// is never reclaimed. Its reactions reject with the chaining-cycle error.
#[derive(Debug, Clone)]
pub struct Resolver {
    promise: Promise,
}

impl Resolver {
    /// Fulfills the promise with `value`.
    ///
    /// Returns true if this call settled the promise.
    pub fn resolve(&self, value: impl Into<PromiseValue>) -> bool {
        self.promise.settle(Ok(value.into()))
    }

    /// Rejects the promise with `reason`.
    ///
    /// Returns true if this call settled the promise.
    pub fn reject(&self, reason: JsError) -> bool {
        self.promise.settle(Err(reason))
    }

    /// The promise this resolver settles.
    pub fn promise(&self) -> &Promise {
        &self.promise
    }
}

fn settled_outcome(source: &Weak<RefCell<PromiseInner>>) -> Option<Outcome> {
    let inner = source.upgrade()?;
    let outcome = inner.borrow().status.outcome();
    outcome
}

fn drain(mut queue: VecDeque<Thunk>) {
    while let Some(thunk) = queue.pop_front() {
        thunk();
    }
}

fn run_settled(slot: &Rc<RefCell<Option<Handler<()>>>>) -> Outcome {
    let handler = slot.borrow_mut().take();
    match handler {
        Some(handler) => handler.call(()),
        None => Ok(PromiseValue::undefined()),
    }
}

fn schedule_reaction<T: 'static>(
    handle: &LoopHandle,
    handler: Handler<T>,
    input: T,
    derived: Promise,
) {
    handle.schedule(Task::new(move || {
        match handler.call(input) {
            Ok(x) => resolve_promise(&derived, x),
            Err(err) => {
                derived.settle(Err(err));
            }
        }
        Ok(())
    }));
}
