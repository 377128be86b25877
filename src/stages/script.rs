// src/stages/script.rs

use anyhow::{Result, anyhow};
use minify_js::{Session, TopLevelMode};

use crate::pipeline::{FileItem, Stage, StageError};

/// Minify JavaScript with `minify-js`.
#[derive(Debug, Clone, Default)]
pub struct JsMinifyStage;

impl JsMinifyStage {
    pub fn new() -> Self {
        Self
    }

    pub fn minify(&self, source: &[u8]) -> Result<Vec<u8>> {
        let session = Session::new();
        let mut out = Vec::with_capacity(source.len());
        minify_js::minify(&session, TopLevelMode::Global, source, &mut out)
            .map_err(|e| anyhow!("javascript syntax error: {e:?}"))?;
        Ok(out)
    }
}

impl Stage for JsMinifyStage {
    fn name(&self) -> &str {
        "js-minify"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        item.contents = self
            .minify(&item.contents)
            .map_err(|err| StageError::warning(self.name(), &item, err))?;
        Ok(vec![item])
    }
}
