// src/engine/scheduler.rs

use std::future::Future;
use std::pin::Pin;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::engine::report::{ReportSink, RunReport};
use crate::errors::{KilnError, Result};
use crate::task::TaskExpr;

type ExecFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// Executes [`TaskExpr`] trees.
///
/// - `Sequence` awaits each step before starting the next; a failing step
///   stops the sequence.
/// - `Parallel` spawns every child onto the runtime, then waits. On the first
///   failure the remaining children are detached (they keep running to their
///   own completion) and the failure is returned.
/// - `Guarded` converts a failure into a report entry.
///
/// There is no cancellation: a started task always runs to completion or
/// failure.
#[derive(Debug, Clone, Default)]
pub struct Scheduler;

impl Scheduler {
    pub fn new() -> Self {
        Self
    }

    /// Run `expr` to completion.
    ///
    /// Returns the report on success; a failure not contained by a `Guarded`
    /// node is returned as the error.
    pub async fn run(&self, expr: &TaskExpr) -> Result<RunReport> {
        info!(plan = %expr, "running task expression");
        let sink = ReportSink::default();
        execute(expr.clone(), sink.clone()).await?;
        Ok(sink.snapshot())
    }
}

fn execute(expr: TaskExpr, sink: ReportSink) -> ExecFuture {
    Box::pin(async move {
        match expr {
            TaskExpr::Task(task) => {
                let name = task.name().to_string();
                let started = Instant::now();
                info!(task = %name, "task started");

                let result = task.run().await;
                let elapsed_ms = started.elapsed().as_millis() as u64;

                match result {
                    Ok(()) => {
                        info!(task = %name, elapsed_ms, "task finished");
                        sink.completed(&name);
                        Ok(())
                    }
                    Err(err) => {
                        error!(task = %name, elapsed_ms, error = %err, "task failed");
                        Err(err)
                    }
                }
            }

            TaskExpr::Sequence(steps) => {
                for step in steps {
                    execute(step, sink.clone()).await?;
                }
                Ok(())
            }

            TaskExpr::Parallel(children) => run_parallel(children, sink).await,

            TaskExpr::Guarded(inner) => {
                let label = inner.to_string();
                match execute(*inner, sink.clone()).await {
                    Ok(()) => Ok(()),
                    Err(err) => {
                        warn!(task = %label, error = %err, "failure contained; continuing");
                        sink.failed(label, format!("{err:#}"));
                        Ok(())
                    }
                }
            }
        }
    })
}

async fn run_parallel(children: Vec<TaskExpr>, sink: ReportSink) -> Result<()> {
    let mut set = JoinSet::new();
    for child in children {
        set.spawn(execute(child, sink.clone()));
    }
    debug!(count = set.len(), "parallel children spawned");

    while let Some(joined) = set.join_next().await {
        let failure = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(err)) => err,
            Err(join_err) => KilnError::TaskPanicked(join_err.to_string()),
        };

        if !set.is_empty() {
            debug!(
                remaining = set.len(),
                "parallel child failed; leaving siblings to finish"
            );
        }
        set.detach_all();
        return Err(failure);
    }

    Ok(())
}
