// src/watch/watcher.rs

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info};

use crate::errors::{KilnError, Result};
use crate::task::{Task, TaskFuture};
use crate::watch::event_handler::{dispatch_change, is_content_change};
use crate::watch::patterns::WatchBinding;

/// The terminal `watch` task.
///
/// Observes the project root recursively and re-runs every bound task whose
/// patterns match a changed path. Runs until the process is interrupted; it
/// only returns on a watch error.
#[derive(Clone)]
pub struct WatchTask {
    root: PathBuf,
    bindings: Arc<Vec<WatchBinding>>,
}

impl fmt::Debug for WatchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchTask")
            .field("root", &self.root)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl WatchTask {
    pub fn new(root: impl Into<PathBuf>, bindings: Vec<WatchBinding>) -> Self {
        Self {
            root: root.into(),
            bindings: Arc::new(bindings),
        }
    }

    pub fn bindings(&self) -> &[WatchBinding] {
        &self.bindings
    }
}

impl Task for WatchTask {
    fn name(&self) -> &str {
        "watch"
    }

    fn run(&self) -> TaskFuture {
        let root = self.root.clone();
        let bindings = Arc::clone(&self.bindings);
        Box::pin(watch_loop(root, bindings))
    }
}

async fn watch_loop(root: PathBuf, bindings: Arc<Vec<WatchBinding>>) -> Result<()> {
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or(root);

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<notify::Result<Event>>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            // The receiver only goes away when the loop below has ended.
            let _ = event_tx.send(res);
        },
        Config::default(),
    )
    .map_err(|e| KilnError::WatchIo(format!("creating watcher: {e}")))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| KilnError::WatchIo(format!("watching {:?}: {e}", root)))?;

    info!(root = ?root, bindings = bindings.len(), "watching for changes");

    while let Some(res) = event_rx.recv().await {
        let event = res.map_err(|e| KilnError::WatchIo(e.to_string()))?;
        if !is_content_change(&event.kind) {
            continue;
        }
        debug!(?event, "received notify event");
        dispatch_change(&root, event.paths.iter().map(PathBuf::as_path), &bindings);
    }

    debug!("watcher event loop finished");
    Ok(())
}
