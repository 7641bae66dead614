//! # Action abstraction.
//!
//! An [`Action`] is one unit of cleanup work run during termination: closing a
//! listener, flushing a log, closing a storage handle. It receives a
//! [`CancellationToken`] that is cancelled when its time budget runs out and
//! should return promptly once that happens.
//!
//! Cancellation is advisory: the manager stops *waiting* for an action past its
//! deadline, it never stops the action itself.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ActionError;

/// Shared handle to an action.
pub type ActionRef = Arc<dyn Action>;

/// # Asynchronous, cancelable cleanup unit.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use graceful::{Action, ActionError};
///
/// struct FlushLog;
///
/// #[async_trait]
/// impl Action for FlushLog {
///     fn name(&self) -> &str { "flush-log" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), ActionError> {
///         if ctx.is_cancelled() {
///             return Err(ActionError::failed("no time left to flush"));
///         }
///         // flush...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Action: Send + Sync + 'static {
    /// Returns a stable, human-readable name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Performs the cleanup.
    ///
    /// Called at most once per termination. Implementations should watch
    /// `ctx` and give up quickly once it is cancelled.
    async fn run(&self, ctx: CancellationToken) -> Result<(), ActionError>;
}
