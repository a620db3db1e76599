//! JavaScript error types.
//!
//! Every failure in the promise runtime is represented as a [`JsError`]:
//! errors raised by producers and reactions, propagated rejection reasons,
//! and the chaining-cycle error reported by the resolution procedure.

use thiserror::Error;

/// Message used when a reaction settles a promise with that same promise.
pub const CHAINING_CYCLE_MESSAGE: &str = "Chaining cycle detected for promise #<Promise>";

/// The kind of JavaScript error.
///
/// These correspond to JavaScript's built-in error constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Plain `Error`, the usual kind for user rejections
    Error,
    /// Type error (e.g., a promise resolved with itself)
    TypeError,
    /// Value out of allowed range
    RangeError,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
        };
        f.write_str(name)
    }
}

/// A JavaScript error with a kind and message.
///
/// Used both as the value raised by a failing closure (`Err(JsError)`) and
/// as the reason a promise is rejected with.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError};
///
/// let error = JsError::new(ErrorKind::RangeError, "index out of bounds");
/// assert_eq!(error.message, "index out of bounds");
/// assert_eq!(error.to_string(), "RangeError: index out of bounds");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct JsError {
    /// The type of error
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
}

impl JsError {
    /// Creates an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Creates a plain `Error`.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Error, message)
    }

    /// Creates a `TypeError`.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    /// The error a promise is rejected with when it would adopt itself.
    pub fn chaining_cycle() -> Self {
        Self::type_error(CHAINING_CYCLE_MESSAGE)
    }

    /// Returns true if this is the chaining-cycle error.
    pub fn is_chaining_cycle(&self) -> bool {
        self.kind == ErrorKind::TypeError && self.message == CHAINING_CYCLE_MESSAGE
    }
}
