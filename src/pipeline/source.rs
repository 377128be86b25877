// src/pipeline/source.rs

//! Resolve glob patterns against the source tree.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use globset::GlobSet;
use tracing::debug;

use crate::fs::FileSystem;
use crate::pipeline::item::FileItem;
use crate::pipeline::stage::{FileItems, StageError};
use crate::watch::patterns::{build_globset, normalize_pattern};

/// Literal directory prefix of a glob: every leading component that holds
/// no glob metacharacter, minus the final (file-name) component.
///
/// `src/img/**/*` -> `src/img`, `src/*.html` -> `src`,
/// `src/scss/style.scss` -> `src/scss`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    let components: Vec<Component<'_>> = Path::new(normalize_pattern(pattern))
        .components()
        .collect();
    let Some((_, dirs)) = components.split_last() else {
        return base;
    };
    for component in dirs {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[', '{']) {
            break;
        }
        base.push(component);
    }
    base
}

/// A matched source path together with the base it is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub base: PathBuf,
}

/// Find every file under `root` matching any of `patterns`.
///
/// The result is deduplicated and sorted by path so bundles concatenate in
/// a stable order. When a file matches several patterns, the first matching
/// pattern decides its base.
pub fn resolve_sources(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[String],
) -> Result<Vec<SourceEntry>> {
    let mut found: BTreeMap<PathBuf, PathBuf> = BTreeMap::new();

    for pattern in patterns {
        let matcher = build_globset(std::slice::from_ref(pattern))?;
        let rel_base = glob_base(pattern);
        let base = if rel_base.as_os_str().is_empty() {
            root.to_path_buf()
        } else {
            root.join(rel_base)
        };

        if !fs.is_dir(&base) {
            debug!(pattern = %pattern, base = ?base, "pattern base does not exist; no matches");
            continue;
        }

        for path in walk_files(fs, &base)? {
            if found.contains_key(&path) {
                continue;
            }
            if matches_relative(&matcher, root, &path) {
                found.insert(path, base.clone());
            }
        }
    }

    Ok(found
        .into_iter()
        .map(|(path, base)| SourceEntry { path, base })
        .collect())
}

fn matches_relative(matcher: &GlobSet, root: &Path, path: &Path) -> bool {
    match path.strip_prefix(root) {
        Ok(rel) => matcher.is_match(rel.to_string_lossy().replace('\\', "/")),
        Err(_) => false,
    }
}

fn walk_files(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    Ok(files)
}

/// Turn resolved entries into a lazy item sequence.
///
/// Paths are resolved up front; contents and modification times are read
/// one item at a time as the sequence is pulled. A file that vanished or
/// cannot be read in between is reported as a warning for that item.
pub fn read_items(fs: Arc<dyn FileSystem>, entries: Vec<SourceEntry>) -> FileItems {
    Box::new(entries.into_iter().map(move |entry| {
        let contents = fs.read(&entry.path).with_context(|| "reading source");
        let modified = fs.modified(&entry.path).ok();
        let mut item = FileItem::new(entry.path, entry.base, Vec::new());
        match contents {
            Ok(bytes) => {
                item.contents = bytes;
                item.modified = modified;
                Ok(item)
            }
            Err(err) => Err(StageError::warning("src", &item, err)),
        }
    }))
}
