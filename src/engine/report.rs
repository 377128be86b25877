// src/engine/report.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::task::TaskName;

/// A task whose failure was contained by a `Guarded` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: TaskName,
    pub message: String,
}

/// What happened during one `Scheduler::run`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Leaf tasks that completed successfully, in completion order.
    pub completed: Vec<TaskName>,
    /// Failures contained by `Guarded` nodes.
    pub failed: Vec<TaskFailure>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_tasks(&self) -> impl Iterator<Item = &str> {
        self.failed.iter().map(|f| f.task.as_str())
    }
}

/// Shared, append-only report handle used while a run is in flight.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReportSink {
    inner: Arc<Mutex<RunReport>>,
}

impl ReportSink {
    fn lock(&self) -> MutexGuard<'_, RunReport> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn completed(&self, task: &str) {
        self.lock().completed.push(task.to_string());
    }

    pub(crate) fn failed(&self, task: impl Into<TaskName>, message: impl Into<String>) {
        self.lock().failed.push(TaskFailure {
            task: task.into(),
            message: message.into(),
        });
    }

    pub(crate) fn snapshot(&self) -> RunReport {
        self.lock().clone()
    }
}
