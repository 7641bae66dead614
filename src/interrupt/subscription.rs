//! # One-shot interruption handle.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot::{self, error::TryRecvError};

/// Handle returned by [`Interrupter::subscribe`](crate::Interrupter::subscribe).
///
/// Resolves exactly once, when the interrupter is delivered (immediately if it
/// already was). A subscription whose interrupter is dropped without ever
/// firing stays pending forever, and may be polled any number of times.
#[derive(Debug)]
#[must_use = "a subscription does nothing unless awaited or polled"]
pub struct Subscription {
    rx: oneshot::Receiver<()>,
    fired: bool,
    // sender gone without firing; the receiver must not be polled again
    closed: bool,
}

impl Subscription {
    pub(crate) fn new(rx: oneshot::Receiver<()>) -> Self {
        Self {
            rx,
            fired: false,
            closed: false,
        }
    }

    /// Returns true once the notification has arrived, without waiting.
    pub fn is_fired(&mut self) -> bool {
        if !self.fired && !self.closed {
            match self.rx.try_recv() {
                Ok(()) => self.fired = true,
                Err(TryRecvError::Closed) => self.closed = true,
                Err(TryRecvError::Empty) => {}
            }
        }
        self.fired
    }
}

impl Future for Subscription {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.fired {
            return Poll::Ready(());
        }
        if self.closed {
            return Poll::Pending;
        }
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(())) => {
                self.fired = true;
                Poll::Ready(())
            }
            Poll::Ready(Err(_)) => {
                self.closed = true;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
