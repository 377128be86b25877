// src/stages/concat.rs

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use crate::pipeline::{
    FileItem, FileItems, RunStats, SourceMap, Stage, StageError, StageResult,
};

/// Join every item into a single bundle named `bundle`.
///
/// Contents are joined with a newline in upstream order (sources are
/// resolved sorted, so the order is deterministic). Source maps carried by
/// the inputs are merged into the bundle's map. Upstream warnings pass
/// through; an empty input produces no bundle.
#[derive(Debug, Clone)]
pub struct ConcatStage {
    bundle: String,
}

impl ConcatStage {
    pub fn new(bundle: impl Into<String>) -> Self {
        Self {
            bundle: bundle.into(),
        }
    }

    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    fn concat(&self, items: FileItems) -> Vec<StageResult> {
        let mut out = Vec::new();
        let mut parts: Vec<FileItem> = Vec::new();

        for result in items {
            match result {
                Ok(item) => parts.push(item),
                Err(err @ StageError::Warning(_)) => out.push(Err(err)),
                Err(fatal) => return vec![Err(fatal)],
            }
        }

        let Some(first) = parts.first() else {
            debug!(bundle = %self.bundle, "nothing to concatenate");
            return out;
        };

        let mut contents = Vec::new();
        let mut map: Option<SourceMap> = None;
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                contents.push(b'\n');
            }
            contents.extend_from_slice(&part.contents);
            if let Some(part_map) = &part.source_map {
                map.get_or_insert_with(|| SourceMap {
                    version: 3,
                    ..SourceMap::default()
                })
                .merge(part_map);
            }
        }

        let mut bundle = FileItem::new(first.origin.clone(), first.base.clone(), contents);
        bundle.relative = PathBuf::from(&self.bundle);
        bundle.source_map = map;
        bundle.modified = parts.iter().filter_map(|p| p.modified).max();
        bundle.bundled = true;

        debug!(bundle = %self.bundle, parts = parts.len(), "concatenated");
        out.push(Ok(bundle));
        out
    }
}

impl Stage for ConcatStage {
    fn name(&self) -> &str {
        "concat"
    }

    fn apply(self: Arc<Self>, items: FileItems, _stats: &RunStats) -> FileItems {
        Box::new(std::iter::once_with(move || self.concat(items)).flatten())
    }
}
