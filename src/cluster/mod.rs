//! Lifecycle management for one ephemeral database instance.
//!
//! [`Cluster`] owns the on-disk state and the running-process state of the
//! instance and drives it through a strictly forward state machine
//! ([`ClusterState`]). The engine itself is an external collaborator behind
//! the [`ClusterEngine`] seam; [`ProcessEngine`] is the production
//! implementation driving an engine control binary.

mod engine;
mod lifecycle;
mod process_engine;
mod state;

pub use engine::*;
pub use lifecycle::*;
pub use process_engine::*;
pub use state::*;

#[cfg(test)]
mod process_engine_test;
