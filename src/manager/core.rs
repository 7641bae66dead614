//! # TerminationManager: single-shot execution of cleanup actions.
//!
//! The [`TerminationManager`] owns the registry of cleanup [`Action`](crate::Action)s
//! and runs them once, when [`terminate`](TerminationManager::terminate) is called.
//!
//! ## Lifecycle
//! ```text
//! register(a0), register(a1), ...        (append-only, registration order kept)
//!            │
//! terminate(parent_token)
//!   ├─► lock: terminated.swap(true)?  ── already set ──► Err(AlreadyTerminated)
//!   ├─► take actions, unlock
//!   ├─► total deadline = parent_token + total_timeout
//!   └─► race:
//!         ├─ mode.execute(actions)    ──► Ok / ActionFailed / AggregateFailure / DeadlineExceeded
//!         └─ total deadline expired   ──► Err(DeadlineExceeded), strategy abandoned
//!
//! register(..) after terminate ──► Err(AlreadyTerminated), action dropped
//! ```
//!
//! ## Rules
//! - Terminates **at most once**; concurrent calls race on the flag, exactly one wins.
//! - The registry lock is never held across an await or while user code runs.
//! - Abandoned actions are detached, never aborted.

use std::borrow::Cow;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::runner::name_of;
use crate::{
    actions::{ActionFn, ActionRef},
    config::ManagerConfig,
    deadline::Deadline,
    error::{ActionError, TerminateError},
};

/// Capability to add cleanup actions.
pub trait Registrator: Send + Sync {
    /// Appends `action` to the registry.
    ///
    /// Fails with [`TerminateError::AlreadyTerminated`] once termination has begun.
    fn register(&self, action: ActionRef) -> Result<(), TerminateError>;
}

/// Capability to run the registered cleanup actions.
#[async_trait]
pub trait Terminator: Send + Sync {
    /// Runs every registered action once, bounded by the configured budgets.
    async fn terminate(&self, ctx: &CancellationToken) -> Result<(), TerminateError>;
}

/// Registry of cleanup actions executed once under timeout budgets.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use graceful::{ActionError, ManagerConfig, TerminateError, TerminationManager};
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let manager = TerminationManager::new(
///         ManagerConfig::default().with_total_timeout(Duration::from_secs(2)),
///     );
///
///     manager
///         .register_fn("close-listener", |_ctx: CancellationToken| async {
///             Ok::<_, ActionError>(())
///         })
///         .unwrap();
///
///     let root = CancellationToken::new();
///     assert!(manager.terminate(&root).await.is_ok());
///     assert!(matches!(
///         manager.terminate(&root).await,
///         Err(TerminateError::AlreadyTerminated)
///     ));
/// }
/// ```
pub struct TerminationManager {
    cfg: ManagerConfig,
    actions: Mutex<Vec<ActionRef>>,
    terminated: AtomicBool,
}

impl TerminationManager {
    /// Creates an empty manager with the given configuration.
    pub fn new(cfg: ManagerConfig) -> Self {
        Self {
            cfg,
            actions: Mutex::new(Vec::new()),
            terminated: AtomicBool::new(false),
        }
    }

    /// Returns the configuration the manager was built with.
    pub fn config(&self) -> &ManagerConfig {
        &self.cfg
    }

    /// Appends `action` to the registry.
    ///
    /// Fails with [`TerminateError::AlreadyTerminated`] once termination has
    /// begun; the action is dropped and never run.
    pub fn register(&self, action: ActionRef) -> Result<(), TerminateError> {
        let mut actions = self.lock();
        if self.terminated.load(Ordering::Acquire) {
            warn!(action = %name_of(&action), "rejected registration after termination started");
            return Err(TerminateError::AlreadyTerminated);
        }
        actions.push(action);
        Ok(())
    }

    /// Registers a closure as a named action. Shorthand for `register(ActionFn::arc(name, f))`.
    pub fn register_fn<F, Fut>(
        &self,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Result<(), TerminateError>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), ActionError>> + Send + 'static,
    {
        self.register(ActionFn::arc(name, f))
    }

    /// Number of actions waiting to run (zero once termination has started).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if no actions are waiting to run.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Returns true once [`terminate`](Self::terminate) has been called.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    /// Runs every registered action once.
    ///
    /// The whole run is bounded by `total_timeout` and by `ctx`: whichever
    /// expires first ends the wait with [`TerminateError::DeadlineExceeded`].
    /// A second call, concurrent or later, returns
    /// [`TerminateError::AlreadyTerminated`] without running anything.
    pub async fn terminate(&self, ctx: &CancellationToken) -> Result<(), TerminateError> {
        let actions = {
            let mut guard = self.lock();
            if self.terminated.swap(true, Ordering::AcqRel) {
                warn!("terminate called more than once");
                return Err(TerminateError::AlreadyTerminated);
            }
            std::mem::take(&mut *guard)
        };

        let total = Deadline::from_token(ctx).child(self.cfg.total_limit());
        let started = Instant::now();
        info!(
            actions = actions.len(),
            mode = ?self.cfg.mode,
            timeout = ?self.cfg.total_limit(),
            "termination started"
        );

        let res = tokio::select! {
            biased;
            _ = total.expired() => Err(TerminateError::DeadlineExceeded { timeout: total.exceeded() }),
            res = self.cfg.mode.execute(actions, &total, self.cfg.action_limit()) => res,
        };
        total.release();

        let elapsed = started.elapsed();
        match &res {
            Ok(()) => info!(?elapsed, "termination finished"),
            Err(e) => warn!(?elapsed, label = e.as_label(), error = %e, "termination finished with errors"),
        }
        res
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ActionRef>> {
        self.actions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TerminationManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl Registrator for TerminationManager {
    fn register(&self, action: ActionRef) -> Result<(), TerminateError> {
        TerminationManager::register(self, action)
    }
}

#[async_trait]
impl Terminator for TerminationManager {
    async fn terminate(&self, ctx: &CancellationToken) -> Result<(), TerminateError> {
        TerminationManager::terminate(self, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;
    use tokio::time;

    fn counting(counter: &Arc<AtomicUsize>) -> ActionRef {
        let counter = Arc::clone(counter);
        ActionFn::arc("count", move |_ctx: CancellationToken| {
            let counter = Arc::clone(&counter);
            async move {
                time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    fn explode() -> Result<(), ActionError> {
        panic!("cleanup exploded")
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_terminate_runs_once() {
        let manager = Arc::new(TerminationManager::default());
        let runs = Arc::new(AtomicUsize::new(0));
        manager.register(counting(&runs)).unwrap();
        manager.register(counting(&runs)).unwrap();

        let root = CancellationToken::new();
        let (m1, m2) = (Arc::clone(&manager), Arc::clone(&manager));
        let (t1, t2) = (root.clone(), root.clone());
        let h1 = tokio::spawn(async move { m1.terminate(&t1).await });
        let h2 = tokio::spawn(async move { m2.terminate(&t2).await });

        let results = [h1.await.unwrap(), h2.await.unwrap()];
        let ok = results.iter().filter(|r| r.is_ok()).count();
        let rejected = results
            .iter()
            .filter(|r| matches!(r, Err(TerminateError::AlreadyTerminated)))
            .count();

        assert_eq!((ok, rejected), (1, 1));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_register_after_terminate_is_rejected() {
        let manager = TerminationManager::default();
        let runs = Arc::new(AtomicUsize::new(0));
        manager.terminate(&CancellationToken::new()).await.unwrap();

        let res = manager.register(counting(&runs));
        assert!(matches!(res, Err(TerminateError::AlreadyTerminated)));
        assert!(manager.is_terminated());
        assert!(manager.is_empty());

        assert!(matches!(
            manager.terminate(&CancellationToken::new()).await,
            Err(TerminateError::AlreadyTerminated)
        ));
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_register_while_terminating_is_rejected() {
        let manager = Arc::new(TerminationManager::default());
        let late_runs = Arc::new(AtomicUsize::new(0));
        let (entered_tx, entered_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let entered_tx = Mutex::new(Some(entered_tx));
        let release_rx = Arc::new(tokio::sync::Mutex::new(Some(release_rx)));

        manager
            .register_fn("gate", move |_ctx: CancellationToken| {
                let entered = entered_tx.lock().unwrap().take();
                let release = Arc::clone(&release_rx);
                async move {
                    if let Some(tx) = entered {
                        let _ = tx.send(());
                    }
                    if let Some(rx) = release.lock().await.take() {
                        let _ = rx.await;
                    }
                    Ok(())
                }
            })
            .unwrap();

        let m = Arc::clone(&manager);
        let run = tokio::spawn(async move { m.terminate(&CancellationToken::new()).await });

        entered_rx.await.unwrap();
        let res = manager.register(counting(&late_runs));
        assert!(matches!(res, Err(TerminateError::AlreadyTerminated)));

        release_tx.send(()).unwrap();
        assert!(run.await.unwrap().is_ok());
        assert_eq!(late_runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_timeout_bounds_stubborn_action() {
        let manager = TerminationManager::new(
            ManagerConfig::default().with_total_timeout(Duration::from_millis(50)),
        );
        manager
            .register_fn("stubborn", |_ctx: CancellationToken| async {
                time::sleep(Duration::from_millis(500)).await;
                Ok(())
            })
            .unwrap();

        let start = Instant::now();
        let res = manager.terminate(&CancellationToken::new()).await;

        assert!(matches!(res, Err(TerminateError::DeadlineExceeded { .. })));
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_timeout_bounds_parallel_run() {
        let manager = TerminationManager::new(
            ManagerConfig::default()
                .with_total_timeout(Duration::from_millis(50))
                .parallel(),
        );
        for _ in 0..3 {
            manager
                .register_fn("stubborn", |_ctx: CancellationToken| async {
                    time::sleep(Duration::from_millis(500)).await;
                    Ok(())
                })
                .unwrap();
        }

        let start = Instant::now();
        let res = manager.terminate(&CancellationToken::new()).await;

        assert!(matches!(
            res,
            Err(TerminateError::DeadlineExceeded { timeout }) if timeout == Duration::from_millis(50)
        ));
        assert_eq!(start.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_panic_has_same_shape_as_failure() {
        let manager = TerminationManager::default();
        manager
            .register_fn("panics", |_ctx: CancellationToken| async { explode() })
            .unwrap();

        let err = manager.terminate(&CancellationToken::new()).await.unwrap_err();
        match err {
            TerminateError::ActionFailed { index, name, cause } => {
                assert_eq!((index, name.as_str()), (0, "panics"));
                assert_eq!(
                    cause,
                    ActionError::Panicked {
                        info: "cleanup exploded".into()
                    }
                );
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_parallel_panic_leaves_siblings_unaffected() {
        let manager = TerminationManager::new(ManagerConfig::default().parallel());
        let runs = Arc::new(AtomicUsize::new(0));
        manager.register(counting(&runs)).unwrap();
        manager
            .register_fn("panics", |_ctx: CancellationToken| async { explode() })
            .unwrap();
        manager.register(counting(&runs)).unwrap();

        let err = manager.terminate(&CancellationToken::new()).await.unwrap_err();

        let TerminateError::AggregateFailure { failures } = err else {
            panic!("expected aggregate failure, got {err:?}");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 1);
        assert!(matches!(failures[0].cause, ActionError::Panicked { .. }));
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_parent_ends_the_wait() {
        let manager = TerminationManager::default();
        manager
            .register_fn("waits", |ctx: CancellationToken| async move {
                ctx.cancelled().await;
                Ok(())
            })
            .unwrap();

        let root = CancellationToken::new();
        root.cancel();
        let res = manager.terminate(&root).await;
        assert!(matches!(
            res,
            Err(TerminateError::DeadlineExceeded { timeout }) if timeout == Duration::ZERO
        ));
    }

    #[tokio::test]
    async fn test_usable_through_capability_traits() {
        let manager = Arc::new(TerminationManager::default());
        let registrator: Arc<dyn Registrator> = manager.clone();
        let terminator: Arc<dyn Terminator> = manager.clone();
        let runs = Arc::new(AtomicUsize::new(0));

        registrator.register(counting(&runs)).unwrap();
        assert_eq!(manager.len(), 1);

        terminator.terminate(&CancellationToken::new()).await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(registrator.register(counting(&runs)).is_err());
    }
}
