//! # graceful
//!
//! **graceful** coordinates the end of a tokio service's life.
//!
//! It provides two independent building blocks:
//! - [`TerminationManager`] - a registry of cleanup [`Action`]s run exactly once,
//!   under an overall budget and per-action budgets, with panics isolated per action;
//! - [`Interrupter`] - a one-shot fan-out that turns an OS termination signal into
//!   exactly one notification per [`Subscription`], however late it subscribed.
//!
//! The two never share state. Application glue wires them together.
//!
//! ## Architecture
//! ```text
//!  SIGINT/SIGTERM                          startup code
//!        │                                      │ register(action)
//!        ▼                                      ▼
//! ┌──────────────────┐   glue awaits   ┌────────────────────────────────────┐
//! │   Interrupter    │ ──────────────► │        TerminationManager          │
//! │ - subscriptions  │  terminate(ctx) │ - actions (registration order)     │
//! │ - interrupted    │                 │ - terminated flag (single shot)    │
//! │ - root token     │                 │ - ManagerConfig (budgets, mode)    │
//! └──────────────────┘                 └──────────────┬─────────────────────┘
//!                                                     ▼
//!                                   ExecutionMode::{Sequential, Parallel}
//!                                                     ▼
//!                                 runner: one tokio task per action,
//!                                 catch_unwind + deadline race
//! ```
//!
//! ## Outcomes
//! | Outcome                                  | When                                             |
//! |------------------------------------------|--------------------------------------------------|
//! | `Ok(())`                                 | every action succeeded                          |
//! | [`TerminateError::AlreadyTerminated`]    | second `terminate`, or `register` after start   |
//! | [`TerminateError::ActionFailed`]         | sequential run hit its first failure            |
//! | [`TerminateError::AggregateFailure`]     | parallel run collected one or more failures     |
//! | [`TerminateError::DeadlineExceeded`]     | a budget ran out; unfinished work was abandoned |
//!
//! Cancellation is cooperative: an expired action keeps running in the
//! background, the manager merely stops waiting for it.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use graceful::{ActionError, Interrupter, ManagerConfig, TerminationManager};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let interrupter = Interrupter::new();
//!     let manager = TerminationManager::new(
//!         ManagerConfig::default().with_action_timeout(Duration::from_secs(1)),
//!     );
//!
//!     manager.register_fn("flush-log", |ctx: CancellationToken| async move {
//!         if ctx.is_cancelled() {
//!             return Err(ActionError::failed("out of time"));
//!         }
//!         Ok(())
//!     })?;
//!
//!     let shutdown = interrupter.subscribe();
//!     interrupter.deliver(); // normally done by a signal
//!     shutdown.await;
//!
//!     manager.terminate(&CancellationToken::new()).await?;
//!     Ok(())
//! }
//! ```
mod actions;
mod config;
mod deadline;
mod error;
mod interrupt;
mod manager;

// ---- Public re-exports ----

pub use actions::{Action, ActionFn, ActionRef};
pub use config::{ExecutionMode, InterrupterConfig, ManagerConfig, Signal};
pub use error::{ActionError, ActionFailure, TerminateError};
pub use interrupt::{Interrupter, Subscription};
pub use manager::{Registrator, TerminationManager, Terminator};
