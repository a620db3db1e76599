//! Errors reported by the event loop.

use core_types::JsError;
use thiserror::Error;

/// Why a run of the event loop stopped early.
///
/// Promise reactions never produce these: their failures become
/// rejections. Only host tasks scheduled directly on the loop can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventLoopError {
    /// A task returned an error.
    #[error("task failed: {0}")]
    TaskFailed(#[from] JsError),
    /// More tasks ran in one call than the configured limit allows.
    #[error("turn limit of {limit} exceeded with work still pending")]
    TurnLimitExceeded {
        /// The configured `max_turns`
        limit: usize,
    },
}
