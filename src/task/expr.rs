// src/task/expr.rs

use std::fmt;
use std::sync::Arc;

use crate::task::Task;

/// A tree of tasks combined by ordering constraints.
///
/// - `Sequence`: each step starts only after the previous one completed.
/// - `Parallel`: every child starts before any is awaited; the node
///   completes when all children completed, or fails with the first failure.
/// - `Guarded`: a failure inside is logged and recorded in the run report,
///   and the node still completes.
#[derive(Clone)]
pub enum TaskExpr {
    Task(Arc<dyn Task>),
    Sequence(Vec<TaskExpr>),
    Parallel(Vec<TaskExpr>),
    Guarded(Box<TaskExpr>),
}

pub fn sequence(steps: impl IntoIterator<Item = TaskExpr>) -> TaskExpr {
    TaskExpr::Sequence(steps.into_iter().collect())
}

pub fn parallel(steps: impl IntoIterator<Item = TaskExpr>) -> TaskExpr {
    TaskExpr::Parallel(steps.into_iter().collect())
}

impl TaskExpr {
    pub fn task(task: Arc<dyn Task>) -> Self {
        TaskExpr::Task(task)
    }

    /// Wrap this expression so its failure does not fail the parent.
    pub fn guarded(self) -> Self {
        TaskExpr::Guarded(Box::new(self))
    }

    /// Names of all leaf tasks, in declaration order.
    pub fn task_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names(&self, out: &mut Vec<String>) {
        match self {
            TaskExpr::Task(task) => out.push(task.name().to_string()),
            TaskExpr::Sequence(steps) | TaskExpr::Parallel(steps) => {
                for step in steps {
                    step.collect_names(out);
                }
            }
            TaskExpr::Guarded(inner) => inner.collect_names(out),
        }
    }
}

impl fmt::Display for TaskExpr {
    /// `clean → (html ‖ js) → watch`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskExpr::Task(task) => f.write_str(task.name()),
            TaskExpr::Sequence(steps) => write_joined(f, steps, " → ", false),
            TaskExpr::Parallel(steps) => write_joined(f, steps, " ‖ ", true),
            TaskExpr::Guarded(inner) => fmt::Display::fmt(inner, f),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    steps: &[TaskExpr],
    separator: &str,
    parens: bool,
) -> fmt::Result {
    let parens = parens && steps.len() > 1;
    if parens {
        f.write_str("(")?;
    }
    for (i, step) in steps.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        fmt::Display::fmt(step, f)?;
    }
    if parens {
        f.write_str(")")?;
    }
    Ok(())
}

impl fmt::Debug for TaskExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TaskExpr").field(&self.to_string()).finish()
    }
}
