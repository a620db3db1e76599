//! Value and error types carried by deferred values.
//!
//! This crate provides the ordinary values a promise can be fulfilled with
//! and the error type a promise is rejected with.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of ordinary JavaScript values
//! - [`JsError`] - A rejection reason or raised error
//! - [`ErrorKind`] - Types of JavaScript errors
//!
//! # Examples
//!
//! ```
//! use core_types::{ErrorKind, JsError, Value};
//!
//! let num = Value::Smi(42);
//! assert!(num.is_truthy());
//! assert_eq!(num.type_of(), "number");
//!
//! let error = JsError::type_error("undefined is not a function");
//! assert_eq!(error.kind, ErrorKind::TypeError);
//! assert_eq!(error.to_string(), "TypeError: undefined is not a function");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod value;

pub use error::{ErrorKind, JsError, CHAINING_CYCLE_MESSAGE};
pub use value::Value;
