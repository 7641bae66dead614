//! Termination core: registry, execution strategies and the action runner.
//!
//! The only public API from this module is [`TerminationManager`] together
//! with the [`Registrator`] and [`Terminator`] capability traits.
//!
//! Internal modules:
//! - [`runner`]: runs one action on its own task under a deadline, inside the fault boundary;
//! - [`strategy`]: sequential (fail-fast) and parallel (collect-all) execution;
//! - [`core`]: registry, single-shot guard and the overall deadline race.

mod core;
mod runner;
mod strategy;

pub use self::core::{Registrator, TerminationManager, Terminator};
