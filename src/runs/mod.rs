//! Run registry and lifecycle coordination.
//!
//! This module tracks externally-executing assistant runs: one registry
//! entry and one polling loop per outstanding request. A concurrent caller
//! can request cancellation at any time; the owning poll loop observes the
//! flag on its next tick and performs the actual remote cancel and cleanup.
//!
//! # Architecture
//!
//! - [`RunRegistry`]: process-wide `run_id -> RunEntry` map
//! - [`RunCoordinator`]: owns the poll loop; the only writer of terminal
//!   outcomes
//!
//! An entry exists in the registry iff a poll loop for it is currently
//! active or it has been marked cancelled and not yet reaped. Every entry
//! is removed exactly once, by the loop that registered it.

mod coordinator;
mod registry;

pub use coordinator::{RunCoordinator, RunOutcome};
pub use registry::{RunEntry, RunRegistry, RunStatus};
