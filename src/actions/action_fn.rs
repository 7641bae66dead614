//! # Closure-backed action (`ActionFn`)
//!
//! [`ActionFn`] wraps a closure `F: Fn(CancellationToken) -> Fut` so cleanup
//! code can be registered without declaring a type.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use graceful::{Action, ActionError, ActionFn, ActionRef};
//!
//! let a: ActionRef = ActionFn::arc("close-listener", |_ctx: CancellationToken| async move {
//!     Ok::<_, ActionError>(())
//! });
//!
//! assert_eq!(a.name(), "close-listener");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::actions::action::Action;
use crate::error::ActionError;

/// Closure-backed action implementation.
#[derive(Debug)]
pub struct ActionFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ActionFn<F> {
    /// Creates a new closure-backed action.
    ///
    /// Prefer [`ActionFn::arc`] when you immediately need an [`ActionRef`](crate::ActionRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the action and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Action for ActionFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), ActionError> {
        (self.f)(ctx).await
    }
}
