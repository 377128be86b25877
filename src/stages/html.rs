// src/stages/html.rs

//! Markup stages: include resolution, minification and output renaming.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::{Context, Result, anyhow, bail};
use regex::{Captures, Regex};
use serde_json::{Map, Value};
use tracing::debug;

use crate::fs::FileSystem;
use crate::pipeline::{FileItem, Stage, StageError};

const MAX_INCLUDE_DEPTH: usize = 32;

fn include_regex() -> &'static Regex {
    static INCLUDE: OnceLock<Regex> = OnceLock::new();
    INCLUDE.get_or_init(|| {
        Regex::new(r#"(?s)@@include\(\s*['"]([^'"]+)['"]\s*(?:,\s*(\{.*?\}))?\s*\)"#)
            .expect("invalid include regex")
    })
}

fn param_regex() -> &'static Regex {
    static PARAM: OnceLock<Regex> = OnceLock::new();
    PARAM.get_or_init(|| {
        Regex::new(r"@@([A-Za-z_][A-Za-z0-9_]*)").expect("invalid parameter regex")
    })
}

/// Inline `@@include('path'[, {params}])` directives.
///
/// Paths are relative to the file containing the directive. Included files
/// are expanded recursively; `@@name` placeholders inside them are replaced
/// with the JSON parameters passed by the directive (merged over the
/// parameters of the including file). Unknown placeholders are left alone.
#[derive(Debug, Clone)]
pub struct IncludeStage {
    fs: Arc<dyn FileSystem>,
}

impl IncludeStage {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Expand every include in `text`, which was read from `file`.
    pub fn expand(&self, text: &str, file: &Path) -> Result<String> {
        let mut stack = vec![file.to_path_buf()];
        self.expand_with(text, file, &Map::new(), &mut stack)
    }

    fn expand_with(
        &self,
        text: &str,
        file: &Path,
        params: &Map<String, Value>,
        stack: &mut Vec<PathBuf>,
    ) -> Result<String> {
        if stack.len() > MAX_INCLUDE_DEPTH {
            bail!("includes nested deeper than {MAX_INCLUDE_DEPTH} levels");
        }

        let text = substitute(text, params);
        let dir = file.parent().unwrap_or_else(|| Path::new(""));

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in include_regex().captures_iter(&text) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&text[last..whole.start()]);
            last = whole.end();

            let target = normalize(&dir.join(&caps[1]));
            if stack.contains(&target) {
                let chain: Vec<String> = stack
                    .iter()
                    .chain(std::iter::once(&target))
                    .map(|p| p.display().to_string())
                    .collect();
                bail!("include cycle: {}", chain.join(" -> "));
            }

            let mut merged = params.clone();
            if let Some(raw) = caps.get(2) {
                let extra: Map<String, Value> = serde_json::from_str(raw.as_str())
                    .with_context(|| format!("parsing include parameters for {:?}", target))?;
                merged.extend(extra);
            }

            let included = self
                .fs
                .read_to_string(&target)
                .with_context(|| format!("reading include {:?}", target))?;
            debug!(from = ?file, include = ?target, "resolving include");

            stack.push(target.clone());
            let expanded = self.expand_with(&included, &target, &merged, stack)?;
            stack.pop();

            out.push_str(&expanded);
        }
        out.push_str(&text[last..]);
        Ok(out)
    }
}

impl Stage for IncludeStage {
    fn name(&self) -> &str {
        "include"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let expanded = item
            .text()
            .and_then(|text| self.expand(text, &item.origin))
            .map_err(|err| StageError::warning(self.name(), &item, err))?;
        item.contents = expanded.into_bytes();
        Ok(vec![item])
    }
}

fn substitute(text: &str, params: &Map<String, Value>) -> String {
    if params.is_empty() {
        return text.to_string();
    }
    param_regex()
        .replace_all(text, |caps: &Captures<'_>| match params.get(&caps[1]) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Collapse `.` and `..` components without touching the file system.
fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Collapse whitespace with `minify-html`. Comments are kept.
///
/// Closing tags and the `<html>`/`<head>` opening tags are kept so the
/// output stays valid for strict parsers.
#[derive(Debug, Clone, Default)]
pub struct HtmlMinifyStage;

impl HtmlMinifyStage {
    pub fn new() -> Self {
        Self
    }

    pub fn minify(&self, source: &[u8]) -> Vec<u8> {
        let mut cfg = minify_html::Cfg::new();
        cfg.keep_closing_tags = true;
        cfg.keep_comments = true;
        cfg.keep_html_and_head_opening_tags = true;
        minify_html::minify(source, &cfg)
    }
}

impl Stage for HtmlMinifyStage {
    fn name(&self) -> &str {
        "html-minify"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        if let Err(err) = item.text() {
            return Err(StageError::warning(self.name(), &item, err));
        }
        item.contents = self.minify(&item.contents);
        Ok(vec![item])
    }
}

/// Insert a suffix between the file stem and its extension:
/// `about/index.html` with `.min` becomes `about/index.min.html`.
#[derive(Debug, Clone)]
pub struct RenameStage {
    suffix: String,
}

impl RenameStage {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn renamed(&self, path: &Path) -> Result<PathBuf> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| anyhow!("{:?} has no file name", path))?;
        let name = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{stem}{}.{ext}", self.suffix),
            None => format!("{stem}{}", self.suffix),
        };
        Ok(path.with_file_name(name))
    }
}

impl Stage for RenameStage {
    fn name(&self) -> &str {
        "rename"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let renamed = self
            .renamed(&item.relative)
            .map_err(|err| StageError::warning(self.name(), &item, err))?;
        item.relative = renamed;
        Ok(vec![item])
    }
}
