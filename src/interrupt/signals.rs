//! # Cross-platform OS signal listening.
//!
//! [`SignalListener`] registers OS listeners for a configurable set of
//! [`Signal`]s up front (so registration errors surface at construction) and
//! completes when the first of them arrives.
//!
//! **Unix platforms:** each [`Signal`] maps to its `SignalKind`.
//!
//! **Other platforms:** any non-empty signal list waits for Ctrl-C via
//! [`tokio::signal::ctrl_c`].

use std::io;

use crate::config::Signal;

/// Installed listeners for the configured signals.
pub(crate) struct SignalListener {
    #[cfg(unix)]
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(not(unix))]
    enabled: bool,
}

#[cfg(unix)]
impl SignalListener {
    /// Registers a listener per signal.
    ///
    /// Returns `Err` if any registration fails. Must run inside a tokio runtime.
    pub(crate) fn install(signals: &[Signal]) -> io::Result<Self> {
        use tokio::signal::unix::signal;

        let mut streams = Vec::with_capacity(signals.len());
        for &sig in signals {
            streams.push((sig, signal(kind(sig))?));
        }
        Ok(Self { streams })
    }

    /// Waits for the first configured signal. Never completes for an empty set.
    pub(crate) async fn recv(mut self) -> Signal {
        if self.streams.is_empty() {
            return std::future::pending().await;
        }

        let waits = self.streams.iter_mut().map(|(sig, stream)| {
            Box::pin(async move {
                match stream.recv().await {
                    Some(()) => *sig,
                    None => std::future::pending().await,
                }
            })
        });
        futures::future::select_all(waits).await.0
    }
}

#[cfg(unix)]
fn kind(sig: Signal) -> tokio::signal::unix::SignalKind {
    use tokio::signal::unix::SignalKind;

    match sig {
        Signal::Interrupt => SignalKind::interrupt(),
        Signal::Terminate => SignalKind::terminate(),
        Signal::Quit => SignalKind::quit(),
        Signal::Hangup => SignalKind::hangup(),
    }
}

#[cfg(not(unix))]
impl SignalListener {
    pub(crate) fn install(signals: &[Signal]) -> io::Result<Self> {
        Ok(Self {
            enabled: !signals.is_empty(),
        })
    }

    pub(crate) async fn recv(self) -> Signal {
        if !self.enabled {
            return std::future::pending().await;
        }
        match tokio::signal::ctrl_c().await {
            Ok(()) => Signal::Interrupt,
            Err(e) => {
                tracing::warn!(error = %e, "ctrl-c listener failed; interrupter will not fire");
                std::future::pending().await
            }
        }
    }
}
