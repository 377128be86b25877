// src/watch/mod.rs

//! File watching and re-triggering.
//!
//! This module is responsible for:
//! - Compiling glob patterns (shared with source resolution and config
//!   validation).
//! - Binding each asset class's `src` patterns to its pipeline task.
//! - Running a cross-platform filesystem watcher (`notify`) and spawning a
//!   fresh run of every bound task whose patterns match a changed path.
//!
//! Triggered runs are independent: nothing debounces, cancels or serializes
//! them against runs already in flight.

pub mod event_handler;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::{dispatch_change, is_content_change, matching_bindings};
pub use patterns::{WatchBinding, build_globset, normalize_pattern};
pub use watcher::WatchTask;
