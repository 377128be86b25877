// src/pipeline/incremental.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;
use crate::pipeline::item::FileItem;
use crate::pipeline::stage::{FileItems, RunStats, Stage, StageError};

/// Modification-recency check between an input and its existing output.
///
/// An input is stale (must be processed) when no output exists yet or the
/// input is strictly newer than it. Equal timestamps count as up to date.
#[derive(Debug, Clone)]
pub struct IncrementalFilter {
    fs: Arc<dyn FileSystem>,
}

impl IncrementalFilter {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Compare `input` with the file of the same name under `dest_dir`.
    pub fn is_stale(&self, input: &Path, dest_dir: &Path) -> Result<bool> {
        let Some(name) = input.file_name() else {
            return Ok(true);
        };
        self.is_stale_against(input, &dest_dir.join(name))
    }

    /// Compare `input` with an explicit output path.
    pub fn is_stale_against(&self, input: &Path, output: &Path) -> Result<bool> {
        if !self.fs.is_file(output) {
            return Ok(true);
        }
        let input_time = self.fs.modified(input)?;
        let output_time = self.fs.modified(output)?;
        Ok(input_time > output_time)
    }
}

/// Pipeline stage that drops items whose output is already up to date.
///
/// The output checked is `dest/<relative path>`, with its extension replaced
/// when `extension` is set, so a WebP pipeline compares `photo.jpg` against
/// `photo.webp` rather than against the re-encoded `photo.jpg`. Dropped
/// items are counted in the run's [`RunStats`].
#[derive(Debug, Clone)]
pub struct IncrementalStage {
    filter: IncrementalFilter,
    dest: PathBuf,
    extension: Option<String>,
}

impl IncrementalStage {
    pub fn new(fs: Arc<dyn FileSystem>, dest: impl Into<PathBuf>) -> Self {
        Self {
            filter: IncrementalFilter::new(fs),
            dest: dest.into(),
            extension: None,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = Some(extension.into());
        self
    }

    fn target_for(&self, item: &FileItem) -> PathBuf {
        let mut target = self.dest.join(&item.relative);
        if let Some(ext) = &self.extension {
            target.set_extension(ext);
        }
        target
    }

    /// `Ok(None)` when the item's output is up to date.
    fn check(&self, item: FileItem) -> Result<Option<FileItem>, StageError> {
        let target = self.target_for(&item);
        match self.filter.is_stale_against(&item.origin, &target) {
            Ok(true) => Ok(Some(item)),
            Ok(false) => {
                debug!(path = ?item.origin, output = ?target, "up to date; skipping");
                Ok(None)
            }
            Err(err) => Err(StageError::warning(self.name(), &item, err)),
        }
    }
}

impl Stage for IncrementalStage {
    fn name(&self) -> &str {
        "incremental-filter"
    }

    fn process(&self, item: FileItem) -> Result<Vec<FileItem>, StageError> {
        Ok(self.check(item)?.into_iter().collect())
    }

    fn apply(self: Arc<Self>, items: FileItems, stats: &RunStats) -> FileItems {
        let stats = stats.clone();
        Box::new(items.filter_map(move |res| match res {
            Ok(item) => match self.check(item) {
                Ok(Some(item)) => Some(Ok(item)),
                Ok(None) => {
                    stats.record_skip();
                    None
                }
                Err(err) => Some(Err(err)),
            },
            Err(err) => Some(Err(err)),
        }))
    }
}
