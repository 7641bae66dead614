//! # Execution strategies.
//!
//! [`ExecutionMode::execute`] is the single entry point the manager calls; the
//! mode only decides how [`run_action`] invocations are scheduled and how their
//! results are combined.
//!
//! ```text
//! Sequential:  #0 ──► #1 ──► #2 ...      first failure stops the run (ActionFailed)
//!                                        first expiry stops the run  (DeadlineExceeded)
//!
//! Parallel:    #0 ─┐
//!              #1 ─┼──► join all ──► every failure collected (AggregateFailure)
//!              #2 ─┘
//! ```

use std::time::Duration;

use futures::future::join_all;
use tracing::warn;

use super::runner::run_action;
use crate::{
    actions::ActionRef,
    config::ExecutionMode,
    deadline::Deadline,
    error::{ActionError, ActionFailure, TerminateError},
};

impl ExecutionMode {
    /// Runs `actions` under the `total` deadline, each bounded by `action_timeout`.
    pub(crate) async fn execute(
        self,
        actions: Vec<ActionRef>,
        total: &Deadline,
        action_timeout: Option<Duration>,
    ) -> Result<(), TerminateError> {
        match self {
            ExecutionMode::Sequential => sequential(actions, total, action_timeout).await,
            ExecutionMode::Parallel => parallel(actions, total, action_timeout).await,
        }
    }
}

async fn sequential(
    actions: Vec<ActionRef>,
    total: &Deadline,
    action_timeout: Option<Duration>,
) -> Result<(), TerminateError> {
    let count = actions.len();

    for (index, action) in actions.iter().enumerate() {
        let outcome = run_action(index, action, total, action_timeout).await;

        let Err(failure) = outcome else { continue };
        let skipped = count - index - 1;
        if skipped > 0 {
            warn!(skipped, "skipping remaining cleanup actions");
        }

        return Err(match failure.cause {
            ActionError::DeadlineExceeded { timeout } => TerminateError::DeadlineExceeded { timeout },
            cause => TerminateError::ActionFailed {
                index: failure.index,
                name: failure.name,
                cause,
            },
        });
    }
    Ok(())
}

async fn parallel(
    actions: Vec<ActionRef>,
    total: &Deadline,
    action_timeout: Option<Duration>,
) -> Result<(), TerminateError> {
    let outcomes = join_all(
        actions
            .iter()
            .enumerate()
            .map(|(index, action)| run_action(index, action, total, action_timeout)),
    )
    .await;

    let failures: Vec<ActionFailure> = outcomes.into_iter().filter_map(Result::err).collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(TerminateError::AggregateFailure { failures })
    }
}
