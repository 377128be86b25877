// src/watch/event_handler.rs

//! Turn a changed path into task runs.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use notify::EventKind;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::task::Task;
use crate::watch::path_utils::relative_str;
use crate::watch::patterns::WatchBinding;

/// Whether a notify event reflects a change to file contents or the set of
/// files. Access and other informational events are ignored.
pub fn is_content_change(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Indices of the bindings whose patterns match any of `paths`.
///
/// A binding matched by several paths of the same event is listed once.
pub fn matching_bindings<'a, I>(root: &Path, paths: I, bindings: &[WatchBinding]) -> Vec<usize>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut hits = BTreeSet::new();
    for path in paths {
        let Some(rel) = relative_str(root, path) else {
            warn!("could not relativize path {:?} against root {:?}", path, root);
            continue;
        };
        debug!(?path, rel = %rel, "normalized event path");

        for (idx, binding) in bindings.iter().enumerate() {
            if binding.matches(&rel) {
                hits.insert(idx);
            }
        }
    }
    hits.into_iter().collect()
}

/// Spawn one independent run of every binding that matches a changed path.
///
/// Runs are not cancelled or coalesced with runs already in flight. A
/// failing run is logged; it never stops the watcher.
pub fn dispatch_change<'a, I>(
    root: &Path,
    paths: I,
    bindings: &[WatchBinding],
) -> Vec<JoinHandle<()>>
where
    I: IntoIterator<Item = &'a Path>,
{
    matching_bindings(root, paths, bindings)
        .into_iter()
        .map(|idx| spawn_run(Arc::clone(bindings[idx].task())))
        .collect()
}

fn spawn_run(task: Arc<dyn Task>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let name = task.name().to_string();
        info!(task = %name, "change detected; re-running");
        if let Err(err) = task.run().await {
            error!(task = %name, error = %err, "re-run failed");
        }
    })
}
