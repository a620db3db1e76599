//! Unit tests for all, race, resolve and reject

use core_types::JsError;
use promise_runtime::{EventLoop, Handler, LoopHandle, Promise, PromiseState, PromiseValue, Task};
use std::cell::RefCell;
use std::rc::Rc;

/// A promise fulfilled with `value` after `delay_ms` on the virtual clock.
fn fulfill_after(handle: &LoopHandle, delay_ms: u64, value: PromiseValue) -> Promise {
    let (promise, resolver) = Promise::with_resolvers(handle);
    handle.set_timeout(
        delay_ms,
        Task::new(move || {
            resolver.resolve(value);
            Ok(())
        }),
    );
    promise
}

/// A promise rejected with `reason` after `delay_ms` on the virtual clock.
fn reject_after(handle: &LoopHandle, delay_ms: u64, reason: JsError) -> Promise {
    let (promise, resolver) = Promise::with_resolvers(handle);
    handle.set_timeout(
        delay_ms,
        Task::new(move || {
            resolver.reject(reason);
            Ok(())
        }),
    );
    promise
}

fn list(values: &[i32]) -> PromiseValue {
    PromiseValue::List(values.iter().map(|n| PromiseValue::from(*n)).collect())
}

mod all_tests {
    use super::*;

    #[test]
    fn fulfills_in_input_order() {
        let mut el = EventLoop::new();
        let handle = el.handle();
        let p1 = fulfill_after(&handle, 30, 1.into());
        let p2 = fulfill_after(&handle, 10, 2.into());

        let all = Promise::all(&handle, vec![p1.into(), p2.into(), PromiseValue::from(3)]);
        assert_eq!(all.state(), PromiseState::Pending);

        el.run_until_done().unwrap();
        let value = all.value().unwrap();
        let expected = [PromiseValue::from(1), 2.into(), 3.into()];
        assert_eq!(value.as_list(), Some(&expected[..]));
    }

    #[test]
    fn rejects_with_first_rejection() {
        let mut el = EventLoop::new();
        let handle = el.handle();
        let fulfilled = Rc::new(RefCell::new(false));
        let p1 = fulfill_after(&handle, 10, 1.into());
        let p2 = reject_after(&handle, 20, JsError::error("E"));
        let p3 = reject_after(&handle, 30, JsError::error("later"));

        let flag = fulfilled.clone();
        let all = Promise::all(&handle, vec![PromiseValue::from(p1), p2.into(), p3.into()]);
        all.then(
            Some(Handler::new(move |value: PromiseValue| {
                *flag.borrow_mut() = true;
                Ok(value)
            })),
            None,
        );

        el.run_until_done().unwrap();
        assert_eq!(all.reason(), Some(JsError::error("E")));
        assert!(!*fulfilled.borrow());
    }

    #[test]
    fn waits_for_already_settled_promises() {
        let mut el = EventLoop::new();
        let handle = el.handle();
        let p1 = Promise::resolve(&handle, 1);
        let all = Promise::all(&handle, vec![p1.into(), PromiseValue::from(2)]);

        // The fulfillment of p1 is observed through a reaction
        assert!(all.is_pending());
        el.run_until_done().unwrap();
        assert_eq!(all.value(), Some(list(&[1, 2])));
    }

    #[test]
    fn calls_do_not_share_state() {
        let mut el = EventLoop::new();
        let handle = el.handle();
        let shared = fulfill_after(&handle, 10, 1.into());

        let first = Promise::all(&handle, vec![PromiseValue::from(shared.clone())]);
        let second = Promise::all(&handle, vec![shared.into(), PromiseValue::from(2)]);

        el.run_until_done().unwrap();
        assert_eq!(first.value(), Some(list(&[1])));
        assert_eq!(second.value(), Some(list(&[1, 2])));
    }

    #[test]
    fn empty_input_fulfills_with_empty_list() {
        let el = EventLoop::new();
        let all = Promise::all(&el.handle(), Vec::<PromiseValue>::new());
        let value = all.value().unwrap();
        assert_eq!(value.as_list().map(<[PromiseValue]>::len), Some(0));
    }
}

mod race_tests {
    use super::*;

    #[test]
    fn first_fulfillment_wins() {
        let mut el = EventLoop::new();
        let handle = el.handle();
        let slow = fulfill_after(&handle, 100, "slow".into());
        let fast = fulfill_after(&handle, 10, "fast".into());

        let race = Promise::race(&handle, vec![PromiseValue::from(slow.clone()), fast.into()]);

        el.run_until_done().unwrap();
        assert_eq!(slow.state(), PromiseState::Fulfilled);
        assert_eq!(race.value(), Some(PromiseValue::from("fast")));
    }

    #[test]
    fn first_rejection_wins() {
        let mut el = EventLoop::new();
        let handle = el.handle();
        let slow = fulfill_after(&handle, 100, "slow".into());
        let fast = reject_after(&handle, 10, JsError::error("fast failure"));

        let race = Promise::race(&handle, vec![PromiseValue::from(slow), fast.into()]);

        el.run_until_done().unwrap();
        assert_eq!(race.state(), PromiseState::Rejected);
        assert_eq!(race.reason(), Some(JsError::error("fast failure")));
    }

    #[test]
    fn later_settlement_is_ignored() {
        let mut el = EventLoop::new();
        let handle = el.handle();
        let settled = Rc::new(RefCell::new(0));
        let fast = fulfill_after(&handle, 10, 1.into());
        let slow = reject_after(&handle, 20, JsError::error("slow"));

        let race = Promise::race(&handle, vec![PromiseValue::from(fast), slow.into()]);
        let count = settled.clone();
        race.then(
            Some(Handler::new(move |value: PromiseValue| {
                *count.borrow_mut() += 1;
                Ok(value)
            })),
            None,
        );

        el.run_until_done().unwrap();
        assert_eq!(*settled.borrow(), 1);
        assert_eq!(race.value(), Some(PromiseValue::from(1)));
    }

    #[test]
    fn plain_value_settles_immediately() {
        let el = EventLoop::new();
        let handle = el.handle();
        let already = Promise::resolve(&handle, "promise");

        let race = Promise::race(&handle, vec![already.into(), PromiseValue::from("plain")]);
        assert_eq!(race.value(), Some(PromiseValue::from("plain")));
    }
}

mod resolve_tests {
    use super::*;

    #[test]
    fn resolve_wraps_plain_value() {
        let el = EventLoop::new();
        let promise = Promise::resolve(&el.handle(), 3.5);
        assert_eq!(promise.value(), Some(PromiseValue::from(3.5)));
    }

    #[test]
    fn resolve_returns_promise_unchanged() {
        let el = EventLoop::new();
        let handle = el.handle();
        let (pending, _resolver) = Promise::with_resolvers(&handle);
        let resolved = Promise::resolve(&handle, pending.clone());
        assert!(resolved.ptr_eq(&pending));
        assert!(resolved.is_pending());
    }

    #[test]
    fn reject_creates_rejected_promise() {
        let el = EventLoop::new();
        let promise = Promise::reject(&el.handle(), JsError::type_error("nope"));
        assert_eq!(promise.state(), PromiseState::Rejected);
        assert_eq!(promise.reason(), Some(JsError::type_error("nope")));
    }
}
