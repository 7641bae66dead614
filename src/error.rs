//! Error types used by the termination manager and its actions.
//!
//! This module defines two main error enums:
//!
//! - [`TerminateError`] - outcomes of [`TerminationManager`](crate::TerminationManager) operations.
//! - [`ActionError`] - failures of individual cleanup actions.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by termination.
///
/// Every path through [`register`](crate::Registrator::register) and
/// [`terminate`](crate::Terminator::terminate) resolves to one of these.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TerminateError {
    /// Termination has already begun; the call was rejected without side effects.
    #[error("already terminated")]
    AlreadyTerminated,

    /// A sequential run stopped at the first failing action.
    #[error("executing action #{index} ({name}): {cause}")]
    ActionFailed {
        /// Registration position of the failed action (0-based).
        index: usize,
        /// Name of the failed action.
        name: String,
        /// What went wrong.
        cause: ActionError,
    },

    /// A parallel run collected one or more failures.
    #[error("{} action(s) failed: {}", .failures.len(), join_failures(.failures))]
    AggregateFailure {
        /// Every failure, ordered by registration position.
        failures: Vec<ActionFailure>,
    },

    /// The termination budget ran out before all actions finished.
    #[error("deadline exceeded after {timeout:?}")]
    DeadlineExceeded {
        /// The budget that was exceeded (`Duration::ZERO` when the parent token fired first).
        timeout: Duration,
    },
}

impl TerminateError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use graceful::TerminateError;
    ///
    /// assert_eq!(TerminateError::AlreadyTerminated.as_label(), "already_terminated");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TerminateError::AlreadyTerminated => "already_terminated",
            TerminateError::ActionFailed { .. } => "action_failed",
            TerminateError::AggregateFailure { .. } => "aggregate_failure",
            TerminateError::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TerminateError::AlreadyTerminated => "termination already started".to_string(),
            TerminateError::ActionFailed { index, name, cause } => {
                format!("action #{index} ({name}) failed: {}", cause.as_message())
            }
            TerminateError::AggregateFailure { failures } => {
                format!("failures={}", join_failures(failures))
            }
            TerminateError::DeadlineExceeded { timeout } => {
                format!("deadline exceeded after {timeout:?}")
            }
        }
    }

    /// Returns the individual action failures carried by this error.
    ///
    /// Empty for [`TerminateError::AlreadyTerminated`] and [`TerminateError::DeadlineExceeded`].
    pub fn failures(&self) -> Vec<&ActionError> {
        match self {
            TerminateError::ActionFailed { cause, .. } => vec![cause],
            TerminateError::AggregateFailure { failures } => {
                failures.iter().map(|f| &f.cause).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// One failed action inside a [`TerminateError::AggregateFailure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    /// Registration position of the action (0-based).
    pub index: usize,
    /// Name of the action.
    pub name: String,
    /// What went wrong.
    pub cause: ActionError,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} ({}): {}", self.index, self.name, self.cause)
    }
}

fn join_failures(failures: &[ActionFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// # Errors produced by a single cleanup action.
///
/// Returned by actions themselves ([`ActionError::Failed`]) or synthesized by
/// the manager at the invocation boundary (`Panicked`, `Aborted`, `DeadlineExceeded`).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ActionError {
    /// The action reported a failure.
    #[error("execution failed: {error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },

    /// The action panicked; the panic was caught at the invocation boundary.
    #[error("panic: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The runtime stopped the action's task before it returned (e.g. on shutdown).
    #[error("task aborted before completion")]
    Aborted,

    /// The action did not return before its own deadline and was abandoned.
    #[error("timed out after {timeout:?}")]
    DeadlineExceeded {
        /// The per-action budget that was exceeded (`Duration::ZERO` when the parent token fired first).
        timeout: Duration,
    },
}

impl ActionError {
    /// Builds an [`ActionError::Failed`] from anything printable.
    ///
    /// # Example
    /// ```
    /// use graceful::ActionError;
    ///
    /// let err = ActionError::failed("socket already closed");
    /// assert_eq!(err.to_string(), "execution failed: socket already closed");
    /// ```
    pub fn failed(error: impl fmt::Display) -> Self {
        ActionError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ActionError::Failed { .. } => "action_failed",
            ActionError::Panicked { .. } => "action_panicked",
            ActionError::Aborted => "action_aborted",
            ActionError::DeadlineExceeded { .. } => "action_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ActionError::Failed { error } => format!("error: {error}"),
            ActionError::Panicked { info } => format!("panic: {info}"),
            ActionError::Aborted => "aborted: action task stopped by the runtime".to_string(),
            ActionError::DeadlineExceeded { timeout } => format!("timeout: {timeout:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_display_lists_every_failure() {
        let err = TerminateError::AggregateFailure {
            failures: vec![
                ActionFailure {
                    index: 0,
                    name: "db".into(),
                    cause: ActionError::failed("busy"),
                },
                ActionFailure {
                    index: 2,
                    name: "cache".into(),
                    cause: ActionError::Panicked {
                        info: "boom".into(),
                    },
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "2 action(s) failed: #0 (db): execution failed: busy; #2 (cache): panic: boom"
        );
        assert_eq!(err.failures().len(), 2);
        assert_eq!(err.as_label(), "aggregate_failure");
    }

    #[test]
    fn test_action_failed_wraps_position() {
        let err = TerminateError::ActionFailed {
            index: 1,
            name: "listener".into(),
            cause: ActionError::failed("refused"),
        };
        assert_eq!(
            err.to_string(),
            "executing action #1 (listener): execution failed: refused"
        );
        assert_eq!(err.failures(), vec![&ActionError::failed("refused")]);
    }

    #[test]
    fn test_guard_errors_carry_no_failures() {
        assert!(TerminateError::AlreadyTerminated.failures().is_empty());
        let err = TerminateError::DeadlineExceeded {
            timeout: Duration::from_millis(50),
        };
        assert!(err.failures().is_empty());
        assert_eq!(err.as_label(), "deadline_exceeded");
    }

    #[test]
    fn test_aborted_is_distinct_from_panic() {
        let err = ActionError::Aborted;
        assert_eq!(err.as_label(), "action_aborted");
        assert_ne!(err.as_label(), ActionError::Panicked { info: String::new() }.as_label());
        assert_eq!(err.to_string(), "task aborted before completion");
    }
}
