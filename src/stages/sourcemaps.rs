// src/stages/sourcemaps.rs

use anyhow::Context;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::pipeline::{FileItem, SourceMap, Stage, StageError, StageKind};
use crate::types::SourceMapMode;

/// Start tracking sources: every item gets a map listing itself.
#[derive(Debug, Clone, Default)]
pub struct SourceMapBegin;

impl SourceMapBegin {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for SourceMapBegin {
    fn name(&self) -> &str {
        "sourcemaps-init"
    }

    fn kind(&self) -> StageKind {
        StageKind::SourceMapBegin
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let content = String::from_utf8_lossy(&item.contents).into_owned();
        item.source_map = Some(SourceMap::for_source(item.source_name(), content));
        Ok(vec![item])
    }
}

/// Comment syntax used to reference a source map from its output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `//# sourceMappingURL=...`
    Js,
    /// `/*# sourceMappingURL=... */`
    Css,
}

impl CommentStyle {
    fn comment(&self, url: &str) -> String {
        match self {
            CommentStyle::Js => format!("\n//# sourceMappingURL={url}\n"),
            CommentStyle::Css => format!("\n/*# sourceMappingURL={url} */\n"),
        }
    }
}

/// Serialize accumulated maps according to `mode`.
#[derive(Debug, Clone)]
pub struct SourceMapEnd {
    mode: SourceMapMode,
    style: CommentStyle,
}

impl SourceMapEnd {
    pub fn new(mode: SourceMapMode, style: CommentStyle) -> Self {
        Self { mode, style }
    }

    pub fn mode(&self) -> SourceMapMode {
        self.mode
    }
}

impl Stage for SourceMapEnd {
    fn name(&self) -> &str {
        "sourcemaps-write"
    }

    fn kind(&self) -> StageKind {
        StageKind::SourceMapEnd
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let Some(mut map) = item.source_map.take() else {
            return Ok(vec![item]);
        };
        if self.mode == SourceMapMode::None {
            return Ok(vec![item]);
        }

        let file_name = item
            .relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        map.file = Some(file_name.clone());

        let json = serde_json::to_vec(&map)
            .context("serializing source map")
            .map_err(|err| StageError::warning(self.name(), &item, err))?;

        match self.mode {
            SourceMapMode::Inline => {
                let url = format!(
                    "data:application/json;charset=utf8;base64,{}",
                    STANDARD.encode(&json)
                );
                item.contents.extend_from_slice(self.style.comment(&url).as_bytes());
                Ok(vec![item])
            }
            SourceMapMode::File => {
                let map_name = format!("{file_name}.map");
                item.contents
                    .extend_from_slice(self.style.comment(&map_name).as_bytes());

                let mut map_item = item.clone();
                map_item.relative = item.relative.with_file_name(&map_name);
                map_item.contents = json;
                Ok(vec![item, map_item])
            }
            SourceMapMode::None => Ok(vec![item]),
        }
    }
}
