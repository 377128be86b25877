// src/task/mod.rs

//! Named units of work and the expressions that compose them.
//!
//! - [`Task`] is the run contract: a name plus a `run()` returning a boxed
//!   future that resolves to the task's completion signal.
//! - [`expr`] holds [`TaskExpr`], the `Sequence` / `Parallel` tree that
//!   describes ordering constraints between tasks.
//! - [`registry`] stores tasks by name and builds expressions from names.
//!
//! Executing an expression is the job of `engine::Scheduler`.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub mod expr;
pub mod registry;

pub use expr::{TaskExpr, parallel, sequence};
pub use registry::TaskRegistry;

/// Canonical task name type.
pub type TaskName = String;

/// Future returned by [`Task::run`].
///
/// It owns everything it needs (`'static`) so the scheduler and the watcher
/// can spawn it on the runtime.
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// A unit of asynchronous work identified by name.
///
/// Every call to `run` starts a fresh, independent invocation; tasks hold
/// no per-run state, so the watcher may start overlapping runs of the same
/// task.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self) -> TaskFuture;
}
