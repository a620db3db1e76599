//! The promise resolution procedure.
//!
//! Decides how a reaction's result settles the promise returned by `then`:
//! a promise adopts the outcome of the promise it was given, anything else
//! fulfills it directly, and a promise given itself is rejected.

use crate::promise::{Handler, Promise, PromiseValue, WeakPromise};
use core_types::JsError;
use tracing::debug;

/// Settles `derived` from the result `x` of a reaction.
///
/// Unwrapping is transitive: when an adopted promise fulfills with yet
/// another promise, that value goes through this procedure again. Reaching
/// `derived` or an already adopted promise along the way is a chaining
/// cycle.
pub(crate) fn resolve_promise(derived: &Promise, x: PromiseValue) {
    resolve_along(derived, x, Vec::new());
}

fn resolve_along(derived: &Promise, x: PromiseValue, mut adopted: Vec<WeakPromise>) {
    match x {
        PromiseValue::Promise(inner)
            if inner.ptr_eq(derived) || adopted.iter().any(|seen| seen.refers_to(&inner)) =>
        {
            debug!(promise = derived.id(), through = inner.id(), "chaining cycle detected");
            derived.settle(Err(JsError::chaining_cycle()));
        }
        PromiseValue::Promise(inner) => {
            adopted.push(inner.downgrade());
            adopt(derived, &inner, adopted);
        }
        value => {
            derived.settle(Ok(value));
        }
    }
}

fn adopt(derived: &Promise, source: &Promise, adopted: Vec<WeakPromise>) {
    let on_fulfilled = derived.clone();
    let on_rejected = derived.clone();
    source.then(
        Some(Handler::new(move |value: PromiseValue| {
            resolve_along(&on_fulfilled, value, adopted);
            Ok(PromiseValue::undefined())
        })),
        Some(Handler::new(move |reason: JsError| {
            on_rejected.settle(Err(reason));
            Ok(PromiseValue::undefined())
        })),
    );
}
