//! Contract tests for promise_runtime
//!
//! These tests pin down the public API shape of the component.

use core_types::JsError;
use promise_runtime::{
    EventLoop, EventLoopError, Handler, LoopHandle, Outcome, Promise, PromiseState, PromiseValue,
    Resolver, Task, TaskQueue, TimerQueue,
};

mod event_loop_contract {
    use super::*;

    #[test]
    fn event_loop_new_returns_self() {
        let event_loop = EventLoop::new();
        let _: LoopHandle = event_loop.handle();
    }

    #[test]
    fn loop_handle_schedule_accepts_task() {
        let event_loop = EventLoop::new();
        event_loop.handle().schedule(Task::new(|| Ok(())));
    }

    #[test]
    fn loop_handle_set_timeout_accepts_delay_and_task() {
        let event_loop = EventLoop::new();
        event_loop.handle().set_timeout(5, Task::new(|| Ok(())));
    }

    #[test]
    fn run_until_done_returns_event_loop_error() {
        let mut event_loop = EventLoop::new();
        let _: Result<(), EventLoopError> = event_loop.run_until_done();
    }

    #[test]
    fn queues_are_public() {
        let _ = TaskQueue::new();
        let _ = TimerQueue::new();
    }
}

mod promise_contract {
    use super::*;

    #[test]
    fn promise_new_takes_producer() {
        let event_loop = EventLoop::new();
        let _: Promise = Promise::new(&event_loop.handle(), |_resolver: Resolver| Ok(()));
    }

    #[test]
    fn with_resolvers_returns_promise_and_resolver() {
        let event_loop = EventLoop::new();
        let (_promise, _resolver): (Promise, Resolver) =
            Promise::with_resolvers(&event_loop.handle());
    }

    #[test]
    fn resolver_settle_returns_bool() {
        let event_loop = EventLoop::new();
        let (_promise, resolver) = Promise::with_resolvers(&event_loop.handle());
        let _: bool = resolver.resolve(PromiseValue::undefined());
        let _: bool = resolver.reject(JsError::error("E"));
    }

    #[test]
    fn then_catch_finally_return_promise() {
        let event_loop = EventLoop::new();
        let promise = Promise::resolve(&event_loop.handle(), 1);
        let _: Promise = promise.then(None, None);
        let _: Promise = promise.catch(Handler::new(|_: JsError| Ok(PromiseValue::undefined())));
        let _: Promise = promise.finally(Handler::new(|_: ()| Ok(PromiseValue::undefined())));
    }

    #[test]
    fn handler_outcome_is_result() {
        let handler = Handler::new(|value: PromiseValue| Ok(value));
        let _: Outcome = handler.call(PromiseValue::from(1));
    }

    #[test]
    fn combinators_return_promise() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let _: Promise = Promise::all(&handle, vec![PromiseValue::from(1)]);
        let _: Promise = Promise::race(&handle, vec![PromiseValue::from(1)]);
        let _: Promise = Promise::resolve(&handle, 1);
        let _: Promise = Promise::reject(&handle, JsError::error("E"));
    }
}

mod promise_state_contract {
    use super::*;

    #[test]
    fn promise_state_has_pending_variant() {
        let state = PromiseState::Pending;
        assert!(matches!(state, PromiseState::Pending));
    }

    #[test]
    fn promise_state_has_fulfilled_variant() {
        let state = PromiseState::Fulfilled;
        assert!(matches!(state, PromiseState::Fulfilled));
    }

    #[test]
    fn promise_state_has_rejected_variant() {
        let state = PromiseState::Rejected;
        assert!(matches!(state, PromiseState::Rejected));
    }
}
