// src/watch/patterns.rs

use std::fmt;
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::config::PathSpec;
use crate::task::Task;

/// Drop any leading `./` so `./src/*.js` and `src/*.js` match the same
/// root-relative paths.
pub fn normalize_pattern(pattern: &str) -> &str {
    let mut pat = pattern;
    while let Some(rest) = pat.strip_prefix("./") {
        pat = rest.trim_start_matches('/');
    }
    pat
}

/// Build a GlobSet from simple string patterns.
///
/// `*` never crosses a `/`; only `**` spans directories. Sources, watch
/// bindings and config validation all compile their patterns here.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(normalize_pattern(pat))
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// A compiled set of patterns and the task to re-run when one of them
/// matches a changed path.
///
/// Patterns are relative to the project root; the watcher passes paths such
/// as `"src/js/a.js"` into [`WatchBinding::matches`].
#[derive(Clone)]
pub struct WatchBinding {
    patterns: Vec<String>,
    set: GlobSet,
    task: Arc<dyn Task>,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("task", &self.task.name())
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl WatchBinding {
    pub fn new(patterns: Vec<String>, task: Arc<dyn Task>) -> Result<Self> {
        let set = build_globset(&patterns)
            .with_context(|| format!("building watch globset for task {}", task.name()))?;
        Ok(Self {
            patterns,
            set,
            task,
        })
    }

    /// Bind every `src` pattern of a path spec to `task`.
    pub fn for_spec(spec: &PathSpec, task: Arc<dyn Task>) -> Result<Self> {
        Self::new(spec.watch_patterns().to_vec(), task)
    }

    pub fn task_name(&self) -> &str {
        self.task.name()
    }

    pub fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}
