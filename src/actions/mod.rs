//! # Cleanup actions.
//!
//! This module provides the action-related types:
//! - [`Action`] - trait for implementing async, cancelable cleanup work
//! - [`ActionFn`] - closure-backed action implementation
//! - [`ActionRef`] - shared handle to an action (`Arc<dyn Action>`)

mod action;
mod action_fn;

pub use action::{Action, ActionRef};
pub use action_fn::ActionFn;
