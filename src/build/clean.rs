// src/build/clean.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{KilnError, Result};
use crate::fs::FileSystem;
use crate::task::{Task, TaskFuture};

/// Empties the output root, keeping the preserved subtrees untouched.
///
/// A preserved path nested deeper than one level (`dist/assets/img`) keeps
/// its ancestors too: the clean descends into them instead of removing
/// them. Deletion finishes before the task's future resolves.
#[derive(Debug, Clone)]
pub struct CleanTask {
    fs: Arc<dyn FileSystem>,
    output_root: PathBuf,
    preserve: Vec<PathBuf>,
}

impl CleanTask {
    /// `output_root` and `preserve` are absolute (already joined to the
    /// project root).
    pub fn new(fs: Arc<dyn FileSystem>, output_root: PathBuf, preserve: Vec<PathBuf>) -> Self {
        Self {
            fs,
            output_root,
            preserve,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Run the deletion on the current thread. Returns how many entries
    /// were removed.
    pub fn clean(&self) -> Result<usize> {
        if !self.fs.is_dir(&self.output_root) {
            debug!(path = ?self.output_root, "output root missing; nothing to clean");
            return Ok(0);
        }
        let removed = self.clean_dir(&self.output_root)?;
        info!(path = ?self.output_root, removed, "output root cleaned");
        Ok(removed)
    }

    fn clean_dir(&self, dir: &Path) -> Result<usize> {
        let entries = self.fs.read_dir(dir).map_err(|cause| KilnError::Clean {
            path: dir.to_path_buf(),
            cause,
        })?;

        let mut removed = 0;
        for entry in entries {
            if self.preserve.iter().any(|p| p == &entry) {
                debug!(path = ?entry, "preserved");
                continue;
            }

            let is_dir = self.fs.is_dir(&entry);
            if is_dir && self.preserve.iter().any(|p| p.starts_with(&entry)) {
                removed += self.clean_dir(&entry)?;
                continue;
            }

            let res = if is_dir {
                self.fs.remove_dir_all(&entry)
            } else {
                self.fs.remove_file(&entry)
            };
            res.map_err(|cause| KilnError::Clean {
                path: entry.clone(),
                cause,
            })?;
            debug!(path = ?entry, "removed");
            removed += 1;
        }
        Ok(removed)
    }
}

impl Task for CleanTask {
    fn name(&self) -> &str {
        "clean"
    }

    fn run(&self) -> TaskFuture {
        let this = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || this.clean())
                .await
                .map_err(|e| KilnError::TaskPanicked(format!("clean: {e}")))??;
            Ok(())
        })
    }
}
