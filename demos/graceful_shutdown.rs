//! # Example: graceful_shutdown
//!
//! Composition root wiring an [`Interrupter`] to a [`TerminationManager`].
//!
//! Demonstrates how to:
//! - Listen for SIGINT/SIGTERM with [`Interrupter::listen`].
//! - Stop a worker loop through [`Interrupter::token`].
//! - Register cleanup actions and run them once the interruption arrives.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Interrupter::listen(default signals)
//!   ├─► spawn worker (ticks until interrupter.token() is cancelled)
//!   ├─► register: close-listener, flush-log, drop-cache (panics)
//!   ├─► await subscription (Ctrl-C, or self-delivered after 3s)
//!   └─► manager.terminate() ──► report outcome
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example graceful_shutdown            # sequential
//! cargo run --example graceful_shutdown -- parallel
//! ```

use std::time::Duration;

use graceful::{
    ActionError, ExecutionMode, Interrupter, InterrupterConfig, ManagerConfig, TerminationManager,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    // 1. Signal fan-out
    let interrupter = Interrupter::listen(InterrupterConfig::default())?;

    // 2. Termination policy
    let mut cfg = ManagerConfig::default()
        .with_total_timeout(Duration::from_secs(3))
        .with_action_timeout(Duration::from_secs(1));
    if std::env::args().any(|a| a == "parallel") {
        cfg.mode = ExecutionMode::Parallel;
    }
    let manager = TerminationManager::new(cfg);

    // 3. A worker that honors the interrupter's token
    let stop = interrupter.token();
    let worker = tokio::spawn(async move {
        let mut ticks = 0u32;
        while !stop.is_cancelled() {
            ticks += 1;
            tracing::info!(ticks, "worker tick");
            tokio::select! {
                _ = stop.cancelled() => {}
                _ = tokio::time::sleep(Duration::from_millis(500)) => {}
            }
        }
        ticks
    });

    // 4. Cleanup actions
    manager.register_fn("close-listener", |_ctx: CancellationToken| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, ActionError>(())
    })?;
    manager.register_fn("flush-log", |ctx: CancellationToken| async move {
        tokio::select! {
            _ = ctx.cancelled() => Err(ActionError::failed("flush interrupted")),
            _ = tokio::time::sleep(Duration::from_millis(200)) => Ok(()),
        }
    })?;
    manager.register_fn("drop-cache", |_ctx: CancellationToken| async {
        if std::env::var_os("GRACEFUL_DEMO_PANIC").is_some() {
            panic!("cache already poisoned");
        }
        Ok::<_, ActionError>(())
    })?;

    // 5. Wait for Ctrl-C, or deliver ourselves so the demo terminates
    let shutdown = interrupter.subscribe();
    tokio::select! {
        _ = shutdown => {}
        _ = tokio::time::sleep(Duration::from_secs(3)) => {
            interrupter.deliver();
        }
    }

    let ticks = worker.await?;
    tracing::info!(ticks, "worker stopped");

    // 6. Run cleanup once
    match manager.terminate(&CancellationToken::new()).await {
        Ok(()) => tracing::info!("clean shutdown"),
        Err(e) => tracing::error!(label = e.as_label(), "shutdown incomplete: {}", e.as_message()),
    }
    Ok(())
}
