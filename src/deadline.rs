//! # Bounded cancellation tokens.
//!
//! A [`Deadline`] pairs a [`CancellationToken`] with an optional instant at
//! which that token cancels itself. Deadlines form a tree through
//! [`Deadline::child`]:
//!
//! ```text
//! parent token (caller) ──► total deadline (total_timeout)
//!                               ├──► action #0 deadline (min(action_timeout, remaining))
//!                               ├──► action #1 deadline
//!                               └──► ...
//! ```
//!
//! ## Rules
//! - A child never expires later than its parent.
//! - Cancelling a parent cancels every child; the reverse never happens.
//! - Expiry only *signals*; nothing running under the token is stopped.

use std::time::Duration;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Cancellation token with an optional expiry instant.
#[derive(Clone, Debug)]
pub(crate) struct Deadline {
    token: CancellationToken,
    at: Option<Instant>,
    budget: Duration,
}

impl Deadline {
    /// Derives an unbounded deadline from a caller-owned token.
    pub(crate) fn from_token(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            at: None,
            budget: Duration::ZERO,
        }
    }

    /// Derives a child that expires after `timeout` or with `self`, whichever is first.
    ///
    /// `None` inherits the parent's expiry. Must be called inside a tokio runtime
    /// when the child ends up bounded (a timer task is spawned for it).
    pub(crate) fn child(&self, timeout: Option<Duration>) -> Self {
        let now = Instant::now();
        let own = timeout.and_then(|d| now.checked_add(d));
        let at = match (self.at, own) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, own) => parent.or(own),
        };

        let token = self.token.child_token();
        if let Some(at) = at {
            expire_at(token.clone(), at);
        }

        Self {
            token,
            at,
            budget: at.map_or(Duration::ZERO, |at| at.saturating_duration_since(now)),
        }
    }

    /// Token handed to actions.
    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The effective budget this deadline was created with (`0s` = unbounded).
    pub(crate) fn budget(&self) -> Duration {
        self.budget
    }

    /// Budget to report once [`expired`](Self::expired) completed.
    ///
    /// The full budget when the expiry instant has passed; `Duration::ZERO` when an
    /// ancestor token was cancelled before that.
    pub(crate) fn exceeded(&self) -> Duration {
        match self.at {
            Some(at) if Instant::now() >= at => self.budget(),
            _ => Duration::ZERO,
        }
    }

    /// Time left before expiry; `None` when unbounded.
    #[cfg(test)]
    pub(crate) fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Completes once the deadline passes or an ancestor token is cancelled.
    pub(crate) async fn expired(&self) {
        self.token.cancelled().await;
    }

    /// Cancels this deadline and all children early.
    pub(crate) fn release(&self) {
        self.token.cancel();
    }
}

/// Spawns the timer that cancels `token` at `at`; exits early if the token is cancelled first.
fn expire_at(token: CancellationToken, at: Instant) {
    tokio::spawn(async move {
        tokio::select! {
            _ = time::sleep_until(at) => token.cancel(),
            _ = token.cancelled() => {}
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_child_expires_after_timeout() {
        let root = CancellationToken::new();
        let d = Deadline::from_token(&root).child(Some(Duration::from_millis(100)));
        assert!(!d.token().is_cancelled());
        assert_eq!(d.budget(), Duration::from_millis(100));

        time::sleep(Duration::from_millis(99)).await;
        assert!(!d.token().is_cancelled());

        time::sleep(Duration::from_millis(2)).await;
        assert!(d.token().is_cancelled());
        assert!(!root.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_never_outlives_parent() {
        let root = CancellationToken::new();
        let total = Deadline::from_token(&root).child(Some(Duration::from_millis(50)));
        let action = total.child(Some(Duration::from_secs(5)));

        assert_eq!(action.budget(), Duration::from_millis(50));
        assert!(action.remaining().unwrap() <= total.remaining().unwrap());

        let start = Instant::now();
        action.expired().await;
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_propagates() {
        let root = CancellationToken::new();
        let d = Deadline::from_token(&root).child(None);
        assert_eq!(d.remaining(), None);

        root.cancel();
        assert!(d.token().is_cancelled());
        assert_eq!(d.exceeded(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exceeded_distinguishes_timeout_from_cancellation() {
        let root = CancellationToken::new();
        let timed = Deadline::from_token(&root).child(Some(Duration::from_millis(30)));
        timed.expired().await;
        assert_eq!(timed.exceeded(), Duration::from_millis(30));

        let early = Deadline::from_token(&root).child(Some(Duration::from_secs(20)));
        root.cancel();
        early.expired().await;
        assert_eq!(early.exceeded(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_leaves_parent_untouched() {
        let root = CancellationToken::new();
        let total = Deadline::from_token(&root).child(Some(Duration::from_secs(1)));
        let action = total.child(None);

        total.release();
        assert!(action.token().is_cancelled());
        assert!(!root.is_cancelled());
    }
}
