//! Static combinators.
//!
//! Built entirely from `then`. Every call owns its own aggregation state;
//! nothing is shared between calls.

use crate::event_loop::LoopHandle;
use crate::promise::{Handler, Promise, PromiseValue, Resolver};
use core_types::JsError;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

/// Results collected by one call to [`Promise::all`].
struct AllTracker {
    results: Vec<Option<PromiseValue>>,
    remaining: usize,
}

impl AllTracker {
    fn new(len: usize) -> Self {
        Self {
            results: vec![None; len],
            remaining: len,
        }
    }

    /// Stores the value for `index`; fulfills `resolver` once every slot is
    /// filled.
    fn record(
        tracker: &RefCell<AllTracker>,
        index: usize,
        value: PromiseValue,
        resolver: &Resolver,
    ) {
        let complete = {
            let mut tracker = tracker.borrow_mut();
            tracker.results[index] = Some(value);
            tracker.remaining -= 1;
            if tracker.remaining > 0 {
                return;
            }
            std::mem::take(&mut tracker.results)
        };
        let values: Vec<PromiseValue> = complete
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect();
        debug!(promise = resolver.promise().id(), count = values.len(), "all fulfilled");
        resolver.resolve(PromiseValue::List(values));
    }
}

impl Promise {
    /// Waits for every item to fulfill.
    ///
    /// Fulfills with a [`PromiseValue::List`] in the order of `items`, not
    /// completion order. Items that are not promises count as already
    /// fulfilled. Rejects with the first rejection reason. An empty input
    /// fulfills with an empty list.
    pub fn all<I>(handle: &LoopHandle, items: I) -> Promise
    where
        I: IntoIterator<Item = PromiseValue>,
    {
        let items: Vec<PromiseValue> = items.into_iter().collect();
        let (combined, resolver) = Promise::with_resolvers(handle);
        if items.is_empty() {
            resolver.resolve(PromiseValue::List(Vec::new()));
            return combined;
        }

        let tracker = Rc::new(RefCell::new(AllTracker::new(items.len())));
        for (index, item) in items.into_iter().enumerate() {
            match item {
                PromiseValue::Promise(promise) => {
                    let (tracker, on_fulfilled) = (tracker.clone(), resolver.clone());
                    let on_rejected = resolver.clone();
                    promise.then(
                        Some(Handler::new(move |value: PromiseValue| {
                            AllTracker::record(&tracker, index, value, &on_fulfilled);
                            Ok(PromiseValue::undefined())
                        })),
                        Some(Handler::new(move |reason: JsError| {
                            on_rejected.reject(reason);
                            Ok(PromiseValue::undefined())
                        })),
                    );
                }
                value => AllTracker::record(&tracker, index, value, &resolver),
            }
        }
        combined
    }

    /// Settles like the first item to settle, by either path.
    ///
    /// Later settlements are ignored. An item that is not a promise settles
    /// the race immediately. An empty input never settles.
    pub fn race<I>(handle: &LoopHandle, items: I) -> Promise
    where
        I: IntoIterator<Item = PromiseValue>,
    {
        let (raced, resolver) = Promise::with_resolvers(handle);
        for item in items {
            match item {
                PromiseValue::Promise(promise) => {
                    let (on_fulfilled, on_rejected) = (resolver.clone(), resolver.clone());
                    promise.then(
                        Some(Handler::new(move |value: PromiseValue| {
                            if !on_fulfilled.resolve(value) {
                                trace!("race already settled, fulfillment ignored");
                            }
                            Ok(PromiseValue::undefined())
                        })),
                        Some(Handler::new(move |reason: JsError| {
                            if !on_rejected.reject(reason) {
                                trace!("race already settled, rejection ignored");
                            }
                            Ok(PromiseValue::undefined())
                        })),
                    );
                }
                value => {
                    resolver.resolve(value);
                }
            }
        }
        raced
    }

    /// Returns `value` itself if it is a promise, otherwise a promise
    /// already fulfilled with it.
    pub fn resolve(handle: &LoopHandle, value: impl Into<PromiseValue>) -> Promise {
        match value.into() {
            PromiseValue::Promise(promise) => promise,
            value => {
                let (promise, resolver) = Promise::with_resolvers(handle);
                resolver.resolve(value);
                promise
            }
        }
    }

    /// Returns a promise already rejected with `reason`.
    pub fn reject(handle: &LoopHandle, reason: JsError) -> Promise {
        let (promise, resolver) = Promise::with_resolvers(handle);
        resolver.reject(reason);
        promise
    }
}
