// src/pipeline/stage.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;

use crate::errors::StageWarning;
use crate::pipeline::item::FileItem;

/// Result of pulling one item through the stage chain.
pub type StageResult = Result<FileItem, StageError>;

/// Lazy, finite, single-pass sequence of items.
pub type FileItems = Box<dyn Iterator<Item = StageResult> + Send>;

/// Failure raised by a stage.
#[derive(Debug)]
pub enum StageError {
    /// One item failed; it is dropped and the rest of the run continues.
    Warning(StageWarning),
    /// The owning pipeline's run must stop.
    Fatal { stage: String, cause: anyhow::Error },
}

impl StageError {
    /// Per-item failure: the item is dropped with a warning, unless it is a
    /// concatenated bundle, in which case the run is aborted.
    pub fn warning(stage: &str, item: &FileItem, cause: impl std::fmt::Display) -> Self {
        if item.bundled {
            return StageError::fatal(
                stage,
                anyhow!("bundle {:?}: {cause:#}", item.relative),
            );
        }
        StageError::Warning(StageWarning {
            stage: stage.to_string(),
            path: item.origin.clone(),
            message: format!("{cause:#}"),
        })
    }

    pub fn fatal(stage: &str, cause: anyhow::Error) -> Self {
        StageError::Fatal {
            stage: stage.to_string(),
            cause,
        }
    }
}

/// Counters owned by a single pipeline run.
///
/// Handed to every stage's [`Stage::apply`], so concurrent runs of the same
/// pipeline never see each other's counts.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    skipped: Arc<AtomicUsize>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an input dropped because its output is up to date.
    pub fn record_skip(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }
}

/// Position a stage takes relative to source-map accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Transform,
    SourceMapBegin,
    SourceMapEnd,
}

/// One transform step in a pipeline.
///
/// Most stages only implement [`Stage::process`], which sees one item at a
/// time and may rewrite it, rename it, drop it (`Ok(vec![])`) or fan it out
/// into several derived items. Stages that need the whole sequence (for
/// example concatenation) override [`Stage::apply`] instead.
pub trait Stage: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn kind(&self) -> StageKind {
        StageKind::Transform
    }

    fn process(&self, item: FileItem) -> Result<Vec<FileItem>, StageError> {
        Ok(vec![item])
    }

    /// Thread the upstream sequence through this stage.
    ///
    /// The default maps [`Stage::process`] lazily over each item and passes
    /// upstream errors through untouched. `stats` belongs to the current run.
    fn apply(self: Arc<Self>, items: FileItems, _stats: &RunStats) -> FileItems {
        Box::new(items.flat_map(move |res| match res {
            Ok(item) => match self.process(item) {
                Ok(out) => out.into_iter().map(Ok).collect::<Vec<_>>(),
                Err(err) => vec![Err(err)],
            },
            Err(err) => vec![Err(err)],
        }))
    }
}
