//! Contract tests for promise_runtime

mod contract_test;
