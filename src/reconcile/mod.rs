//! Reconciliation engine.
//!
//! A run has two phases: [`classify_all`] decides, per manifest document
//! and without mutating anything, whether it needs a create, an update,
//! nothing, or a human decision; [`execute`] then applies the safe
//! operations, records confirmed successes in the ledger, and collects
//! everything into a [`SyncReport`].

pub mod classify;
pub mod execute;
pub mod report;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{
    classify, classify_all, ClassifyError, ClassifyFailure, ConflictReason, Outcome, Plan,
    PlannedConflict, PlannedCreate, PlannedUpdate,
};
pub use execute::{execute, ExecuteError, ExecuteOptions};
pub use report::{ConflictEntry, ErrorEntry, SkippedEntry, SyncReport, WriteEntry};
