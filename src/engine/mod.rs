// src/engine/mod.rs

//! Orchestration engine for assetkiln.
//!
//! [`Scheduler`] walks a `TaskExpr` and enforces its ordering: strict
//! happens-before between sequence steps, no ordering among parallel
//! siblings. [`RunReport`] records what completed and which guarded
//! failures were contained along the way.

pub mod report;
pub mod scheduler;

pub use report::{RunReport, TaskFailure};
pub use scheduler::Scheduler;
