//! # Termination and interruption configuration.
//!
//! Provides [`ManagerConfig`] for the [`TerminationManager`](crate::TerminationManager)
//! and [`InterrupterConfig`] for [`Interrupter::listen`](crate::Interrupter::listen).
//!
//! Both are set once at construction and never change afterward.
//!
//! ## Sentinel values
//! - `total_timeout = 0s` → no overall budget (bounded only by the parent token)
//! - `action_timeout = 0s` → no per-action budget
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use graceful::{ExecutionMode, ManagerConfig};
//!
//! let mut cfg = ManagerConfig::default();
//! cfg.total_timeout = Duration::from_secs(10);
//! cfg.mode = ExecutionMode::Parallel;
//!
//! assert_eq!(cfg.action_limit(), Some(Duration::from_secs(5)));
//! ```

use std::time::Duration;

/// How registered actions are run during termination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One at a time in registration order, stopping at the first failure.
    #[default]
    Sequential,
    /// All at once; every failure is collected.
    Parallel,
}

/// Configuration for the termination manager.
///
/// ## Field semantics
/// - `total_timeout`: upper bound on one whole `terminate()` call (`0s` = unbounded)
/// - `action_timeout`: upper bound on any single action (`0s` = unbounded)
/// - `mode`: sequential (default) or parallel execution
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Maximum duration of a complete termination run.
    ///
    /// When exceeded, `terminate()` returns `DeadlineExceeded` and abandons
    /// every action still in flight.
    pub total_timeout: Duration,

    /// Maximum duration of one action.
    ///
    /// In sequential mode the effective budget is the smaller of this and the
    /// remaining total budget.
    pub action_timeout: Duration,

    /// Execution strategy.
    pub mode: ExecutionMode,
}

impl ManagerConfig {
    /// Returns the overall budget as an `Option`.
    ///
    /// - `None` → no overall timeout
    /// - `Some(d)` → `terminate()` gives up after `d`
    #[inline]
    pub fn total_limit(&self) -> Option<Duration> {
        non_zero(self.total_timeout)
    }

    /// Returns the per-action budget as an `Option`.
    #[inline]
    pub fn action_limit(&self) -> Option<Duration> {
        non_zero(self.action_timeout)
    }

    /// Sets the overall budget.
    #[must_use]
    pub fn with_total_timeout(mut self, timeout: Duration) -> Self {
        self.total_timeout = timeout;
        self
    }

    /// Sets the per-action budget.
    #[must_use]
    pub fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Switches to [`ExecutionMode::Parallel`].
    #[must_use]
    pub fn parallel(mut self) -> Self {
        self.mode = ExecutionMode::Parallel;
        self
    }
}

impl Default for ManagerConfig {
    /// Default configuration:
    ///
    /// - `total_timeout = 20s`
    /// - `action_timeout = 5s`
    /// - `mode = ExecutionMode::Sequential`
    fn default() -> Self {
        Self {
            total_timeout: Duration::from_secs(20),
            action_timeout: Duration::from_secs(5),
            mode: ExecutionMode::default(),
        }
    }
}

#[inline]
fn non_zero(d: Duration) -> Option<Duration> {
    if d == Duration::ZERO { None } else { Some(d) }
}

/// External termination requests an [`Interrupter`](crate::Interrupter) can listen for.
///
/// On non-unix targets every variant maps to Ctrl-C.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Signal {
    /// `SIGINT` (Ctrl-C in terminal).
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
}

impl Signal {
    /// Returns a short stable label for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            Signal::Interrupt => "sigint",
            Signal::Terminate => "sigterm",
            Signal::Quit => "sigquit",
            Signal::Hangup => "sighup",
        }
    }
}

/// Configuration for a signal-backed interrupter.
#[derive(Clone, Debug)]
pub struct InterrupterConfig {
    /// Signals that trigger delivery. An empty list never fires on its own.
    pub allowed_signals: Vec<Signal>,
}

impl InterrupterConfig {
    /// Replaces the signal list.
    #[must_use]
    pub fn with_allowed_signals(mut self, signals: impl IntoIterator<Item = Signal>) -> Self {
        self.allowed_signals = signals.into_iter().collect();
        self
    }
}

impl Default for InterrupterConfig {
    /// Listens for `SIGINT` and `SIGTERM`.
    fn default() -> Self {
        Self {
            allowed_signals: vec![Signal::Interrupt, Signal::Terminate],
        }
    }
}
