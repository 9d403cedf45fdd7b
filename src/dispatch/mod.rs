//! Bounded-concurrency dispatch of test-case setup work.
//!
//! [`SetupDispatcher`] runs every discovered case's setup routine against the
//! live cluster, never exceeding the configured job count, and drains rather
//! than kills in-flight work when a case fails.

mod dispatcher;
mod outcome;

pub use dispatcher::*;
pub use outcome::*;
