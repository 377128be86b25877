// src/pipeline/item.rs

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

/// One matched input file flowing through a pipeline.
///
/// Owned by the pipeline run that produced it; stages take it by value and
/// hand back zero or more items.
#[derive(Debug, Clone)]
pub struct FileItem {
    /// Absolute (root-joined) path of the source file this item came from.
    pub origin: PathBuf,
    /// Literal directory prefix of the glob that matched `origin`.
    pub base: PathBuf,
    /// Logical output path, relative to the pipeline destination.
    pub relative: PathBuf,
    pub contents: Vec<u8>,
    pub source_map: Option<SourceMap>,
    pub modified: Option<SystemTime>,
    /// Set on the output of a concatenation. A bundle stands for every
    /// input, so a stage failing on it fails the run instead of dropping it.
    pub bundled: bool,
}

impl FileItem {
    pub fn new(origin: PathBuf, base: PathBuf, contents: Vec<u8>) -> Self {
        let relative = origin
            .strip_prefix(&base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(origin.file_name().unwrap_or_default()));
        Self {
            origin,
            base,
            relative,
            contents,
            source_map: None,
            modified: None,
            bundled: false,
        }
    }

    /// Output path relative to the destination, as a forward-slash string.
    pub fn relative_str(&self) -> String {
        self.relative.to_string_lossy().replace('\\', "/")
    }

    /// Path of the source relative to its glob base, used for source-map
    /// `sources` entries.
    pub fn source_name(&self) -> String {
        self.origin
            .strip_prefix(&self.base)
            .unwrap_or(&self.origin)
            .to_string_lossy()
            .replace('\\', "/")
    }

    pub fn extension(&self) -> Option<String> {
        self.relative
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn text(&self) -> anyhow::Result<&str> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| anyhow::anyhow!("{:?} is not valid UTF-8: {e}", self.origin))
    }
}

/// Source map v3 accumulated alongside a bundle.
///
/// Tracks original sources and their content. Segment mappings are not
/// produced: the bundled minifiers do not report positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    pub version: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub sources: Vec<String>,
    pub sources_content: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    /// Map for a single, untransformed source.
    pub fn for_source(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            version: 3,
            file: None,
            sources: vec![name.into()],
            sources_content: vec![content.into()],
            names: Vec::new(),
            mappings: String::new(),
        }
    }

    /// Append the sources of `other`, skipping ones already present.
    pub fn merge(&mut self, other: &SourceMap) {
        for (source, content) in other.sources.iter().zip(&other.sources_content) {
            if !self.sources.contains(source) {
                self.sources.push(source.clone());
                self.sources_content.push(content.clone());
            }
        }
    }
}
