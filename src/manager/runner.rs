//! # Run a single cleanup action.
//!
//! Executes one [`Action`](crate::Action) under a `Deadline` derived from the termination
//! budget, on its own tokio task.
//!
//! ## Flow
//! ```text
//! name = catch_unwind(action.name())
//! child deadline = min(action_timeout, parent deadline)
//!     └─► tokio::spawn(invoke(action, token))
//!             └─► catch_unwind(action.run(token))
//!                     ├─ Ok(r)    ──► r
//!                     └─ panic    ──► Err(Panicked)
//!     race:
//!       ├─ task joined   ──► result (JoinError → Panicked / Aborted)
//!       └─ deadline hit  ──► Err(DeadlineExceeded), task detached
//! ```
//!
//! ## Rules
//! - This module is the **only** fault boundary; both strategies and the registry go through it.
//! - An expired action is never aborted: its `JoinHandle` is dropped and the task keeps running.
//! - Child expiry does **not** affect the parent deadline.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    actions::ActionRef,
    deadline::Deadline,
    error::{ActionError, ActionFailure},
};

/// Name reported for an action whose `name()` panicked.
const UNNAMED: &str = "<unnamed>";

/// Runs the action registered at `index` and waits for it at most until its deadline.
pub(crate) async fn run_action(
    index: usize,
    action: &ActionRef,
    parent: &Deadline,
    timeout: Option<Duration>,
) -> Result<(), ActionFailure> {
    let name = name_of(action);
    let deadline = parent.child(timeout);
    debug!(index, action = %name, "running cleanup action");

    let mut join = tokio::spawn(invoke(Arc::clone(action), deadline.token().clone()));

    let res = tokio::select! {
        biased;
        joined = &mut join => joined.unwrap_or_else(|e| Err(join_failure(e))),
        _ = deadline.expired() => Err(ActionError::DeadlineExceeded { timeout: deadline.exceeded() }),
    };
    deadline.release();

    match &res {
        Ok(()) => debug!(index, action = %name, "cleanup action finished"),
        Err(ActionError::DeadlineExceeded { timeout }) => {
            warn!(index, action = %name, ?timeout, "cleanup action abandoned past its deadline");
        }
        Err(e) => warn!(index, action = %name, label = e.as_label(), error = %e, "cleanup action failed"),
    }
    res.map_err(|cause| ActionFailure { index, name, cause })
}

/// Reads the action's name, tolerating a panicking `name()`.
pub(crate) fn name_of(action: &ActionRef) -> String {
    panic::catch_unwind(AssertUnwindSafe(|| action.name().to_string()))
        .unwrap_or_else(|_| UNNAMED.to_string())
}

/// Invokes the action and converts a panic into an ordinary failure.
async fn invoke(action: ActionRef, ctx: CancellationToken) -> Result<(), ActionError> {
    match AssertUnwindSafe(action.run(ctx)).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(ActionError::Panicked {
            info: panic_message(&*payload),
        }),
    }
}

fn join_failure(err: JoinError) -> ActionError {
    if err.is_panic() {
        ActionError::Panicked {
            info: panic_message(&*err.into_panic()),
        }
    } else {
        ActionError::Aborted
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
