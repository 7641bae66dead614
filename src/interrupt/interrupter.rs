//! # Interrupter: one external request, many listeners.
//!
//! ## State machine
//! ```text
//! NotInterrupted ──(signal / deliver())──► Interrupted   (terminal)
//! ```
//!
//! ## Rules
//! - `subscribe()` and `deliver()` contend on one lock; whichever acquires it
//!   first decides whether a handle is fired at subscribe time or stored and
//!   fired by `deliver()`. No handle is ever dropped unfired.
//! - Duplicate deliveries (repeated signals, manual calls) are no-ops.
//! - Nothing here is shared with the [`TerminationManager`](crate::TerminationManager).

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::signals::SignalListener;
use super::subscription::Subscription;
use crate::config::InterrupterConfig;

/// Fans a one-shot termination request out to every subscriber.
///
/// # Example
/// ```rust
/// use graceful::Interrupter;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let interrupter = Interrupter::new();
///     let early = interrupter.subscribe();
///
///     assert!(interrupter.deliver());
///     early.await;
///
///     // subscribing afterwards fires immediately
///     interrupter.subscribe().await;
/// }
/// ```
#[derive(Debug)]
pub struct Interrupter {
    pending: Mutex<Vec<oneshot::Sender<()>>>,
    interrupted: AtomicBool,
    root: CancellationToken,
}

impl Interrupter {
    /// Creates an interrupter fired only by an explicit [`deliver`](Self::deliver).
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(Vec::new()),
            interrupted: AtomicBool::new(false),
            root: CancellationToken::new(),
        })
    }

    /// Creates an interrupter fired by the first of `cfg.allowed_signals`.
    ///
    /// Listeners are registered before returning; a background task waits for
    /// a signal and calls [`deliver`](Self::deliver). The task holds only a weak
    /// reference, so dropping every `Arc` releases the interrupter.
    ///
    /// Returns `Err` if signal registration fails.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn listen(cfg: InterrupterConfig) -> io::Result<Arc<Self>> {
        let listener = SignalListener::install(&cfg.allowed_signals)?;
        let interrupter = Self::new();
        let target = Arc::downgrade(&interrupter);

        tokio::spawn(async move {
            let signal = listener.recv().await;
            info!(signal = signal.as_label(), "termination signal received");
            if let Some(interrupter) = target.upgrade() {
                interrupter.deliver();
            }
        });

        debug!(signals = ?cfg.allowed_signals, "interrupter listening");
        Ok(interrupter)
    }

    /// Registers a new notification handle.
    ///
    /// The handle is fired immediately if the interrupter was already
    /// delivered, otherwise when [`deliver`](Self::deliver) runs. Never blocks
    /// beyond the short internal lock.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = oneshot::channel();

        let mut pending = self.lock();
        if self.interrupted.load(Ordering::Acquire) {
            let _ = tx.send(());
        } else {
            pending.retain(|tx| !tx.is_closed());
            pending.push(tx);
        }

        Subscription::new(rx)
    }

    /// Delivers the interruption to every subscriber.
    ///
    /// Returns `true` for the call that performed the transition and `false`
    /// for every later call.
    pub fn deliver(&self) -> bool {
        let mut pending = self.lock();
        if self.interrupted.swap(true, Ordering::AcqRel) {
            debug!("interrupt already delivered; ignoring");
            return false;
        }

        let subscribers = pending.len();
        for tx in pending.drain(..) {
            // receiver may be gone already
            let _ = tx.send(());
        }
        self.root.cancel();

        info!(subscribers, "interrupt delivered");
        true
    }

    /// Returns true once the interruption has been delivered.
    pub fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::Acquire)
    }

    /// Returns a token cancelled when the interruption is delivered.
    ///
    /// Already cancelled if it was. Cancelling the returned token affects only
    /// that token.
    pub fn token(&self) -> CancellationToken {
        self.root.child_token()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<oneshot::Sender<()>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
