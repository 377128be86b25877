// src/pipeline/mod.rs

//! Per-asset-class pipelines.
//!
//! A [`Pipeline`] resolves its entry patterns into a lazy sequence of
//! [`FileItem`]s, threads that sequence through an ordered list of
//! [`Stage`]s and writes whatever survives under its destination,
//! preserving paths relative to the glob base.
//!
//! - [`item`]: `FileItem` and the accumulated `SourceMap`.
//! - [`stage`]: the `Stage` trait and `StageError`.
//! - [`source`]: glob resolution against the source tree.
//! - [`incremental`]: `IncrementalFilter` and its stage form.

pub mod incremental;
pub mod item;
pub mod source;
pub mod stage;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use anyhow::anyhow;
use tracing::{debug, info, warn};

use crate::config::PathSpec;
use crate::errors::PipelineError;
use crate::fs::FileSystem;

pub use incremental::{IncrementalFilter, IncrementalStage};
pub use item::{FileItem, SourceMap};
pub use source::{glob_base, resolve_sources};
pub use stage::{FileItems, RunStats, Stage, StageError, StageKind, StageResult};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Source files pulled from the tree.
    pub read: usize,
    /// Files written to the destination.
    pub written: usize,
    /// Inputs dropped because their output was already up to date.
    pub skipped: usize,
    /// Items dropped by a stage warning.
    pub warnings: usize,
    /// Total bytes written.
    pub bytes: usize,
}

/// An ordered chain of stages over the files matched by a [`PathSpec`].
pub struct Pipeline {
    name: String,
    root: PathBuf,
    spec: PathSpec,
    stages: Vec<Arc<dyn Stage>>,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("stages", &self.stage_names())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(
        name: impl Into<String>,
        root: impl Into<PathBuf>,
        spec: PathSpec,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            spec,
            stages: Vec::new(),
            fs,
        }
    }

    /// Append a stage; stages run in the order they are added.
    pub fn stage(mut self, stage: impl Stage) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &PathSpec {
        &self.spec
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Absolute destination directory.
    pub fn dest_dir(&self) -> PathBuf {
        self.root.join(&self.spec.dest)
    }

    /// Run the pipeline to completion on the current thread.
    ///
    /// Stage warnings are logged and the item dropped; the first fatal
    /// stage error aborts this run with a [`PipelineError`].
    pub fn run(&self) -> Result<PipelineSummary, PipelineError> {
        let started = Instant::now();
        self.check_stage_order()?;

        let entries = resolve_sources(self.fs.as_ref(), &self.root, self.spec.entry_patterns())
            .map_err(|cause| self.error("src", cause))?;
        debug!(task = %self.name, matched = entries.len(), "sources resolved");

        let read = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&read);
        let mut items: FileItems = Box::new(
            source::read_items(Arc::clone(&self.fs), entries).inspect(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );

        let stats = RunStats::new();
        for stage in &self.stages {
            items = Arc::clone(stage).apply(items, &stats);
        }

        let dest = self.dest_dir();
        let mut summary = PipelineSummary::default();

        for result in items {
            match result {
                Ok(item) => {
                    self.write_item(&dest, &item)?;
                    summary.written += 1;
                    summary.bytes += item.contents.len();
                }
                Err(StageError::Warning(warning)) => {
                    warn!(task = %self.name, stage = %warning.stage, path = ?warning.path, "{}", warning.message);
                    summary.warnings += 1;
                }
                Err(StageError::Fatal { stage, cause }) => {
                    return Err(self.error(&stage, cause));
                }
            }
        }

        summary.read = read.load(Ordering::Relaxed);
        summary.skipped = stats.skipped();
        info!(
            task = %self.name,
            read = summary.read,
            written = summary.written,
            skipped = summary.skipped,
            warnings = summary.warnings,
            bytes = summary.bytes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "pipeline finished"
        );
        Ok(summary)
    }

    fn write_item(&self, dest: &Path, item: &FileItem) -> Result<(), PipelineError> {
        let target = dest.join(&item.relative);
        debug!(task = %self.name, path = ?target, bytes = item.contents.len(), "writing");
        self.fs
            .write(&target, &item.contents)
            .map_err(|cause| self.error("dest", cause))
    }

    /// Source-map accumulation must wrap every transform: begin before the
    /// first transform, end after the last one.
    fn check_stage_order(&self) -> Result<(), PipelineError> {
        let mut begun = false;
        let mut ended = false;
        let mut transformed = false;

        for stage in &self.stages {
            match stage.kind() {
                StageKind::SourceMapBegin => {
                    if begun || ended {
                        return Err(self.error(stage.name(), anyhow!("source maps begun twice")));
                    }
                    if transformed {
                        return Err(self.error(
                            stage.name(),
                            anyhow!("source maps begun after a transform already ran"),
                        ));
                    }
                    begun = true;
                }
                StageKind::SourceMapEnd => {
                    if !begun {
                        return Err(self.error(
                            stage.name(),
                            anyhow!("source maps written before they were begun"),
                        ));
                    }
                    ended = true;
                }
                StageKind::Transform => {
                    if ended {
                        return Err(self.error(
                            stage.name(),
                            anyhow!("transform placed after source maps were written"),
                        ));
                    }
                    transformed = true;
                }
            }
        }
        Ok(())
    }

    fn error(&self, stage: &str, cause: anyhow::Error) -> PipelineError {
        PipelineError {
            task: self.name.clone(),
            stage: stage.to_string(),
            cause,
        }
    }
}
