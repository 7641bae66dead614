//! # Signal-to-cancellation fan-out.
//!
//! [`Interrupter`] turns one external termination request into exactly one
//! notification per [`Subscription`], whenever that subscription was created.
//!
//! ```text
//! SIGINT / SIGTERM ──► signal listener task ──► Interrupter::deliver()
//!                                                  ├──► stored subscriptions fired
//!                                                  ├──► root token cancelled
//!                                                  └──► later subscribe() fired immediately
//! ```

mod interrupter;
mod signals;
mod subscription;

pub use interrupter::Interrupter;
pub use subscription::Subscription;
