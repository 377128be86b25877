// src/task/registry.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::errors::{KilnError, Result};
use crate::task::{Task, TaskExpr, TaskName};

/// Named tasks available for composition.
///
/// Tasks are registered once and never mutated afterwards; expressions hold
/// `Arc` handles to them.
#[derive(Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskName, Arc<dyn Task>>,
}

impl fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Arc<dyn Task>) -> Result<()> {
        let name = task.name().to_string();
        if self.tasks.contains_key(&name) {
            return Err(KilnError::ConfigError(format!(
                "task '{name}' is already registered"
            )));
        }
        self.tasks.insert(name, task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Task>> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| KilnError::TaskNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(|s| s.as_str())
    }

    /// Leaf expression for a registered task.
    pub fn task(&self, name: &str) -> Result<TaskExpr> {
        Ok(TaskExpr::Task(self.get(name)?))
    }

    /// `Sequence` over registered task names.
    pub fn sequence(&self, names: &[&str]) -> Result<TaskExpr> {
        let steps = names
            .iter()
            .map(|n| self.task(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(TaskExpr::Sequence(steps))
    }

    /// `Parallel` over registered task names.
    pub fn parallel(&self, names: &[&str]) -> Result<TaskExpr> {
        let steps = names
            .iter()
            .map(|n| self.task(n))
            .collect::<Result<Vec<_>>>()?;
        Ok(TaskExpr::Parallel(steps))
    }
}
