// src/build/pipelines.rs

//! The per-asset-class pipelines and the task wrapper that runs them.

use std::sync::Arc;

use crate::config::ConfigFile;
use crate::errors::{KilnError, Result};
use crate::fs::FileSystem;
use crate::pipeline::{IncrementalStage, Pipeline, PipelineSummary};
use crate::stages::{
    AvifStage, CommandStage, CommentStyle, ConcatStage, CssMinifyStage, HtmlMinifyStage,
    IncludeStage, JsMinifyStage, PrefixStage, RenameStage, ReencodeStage, SassStage,
    SourceMapBegin, SourceMapEnd, WebpStage,
};
use crate::task::{Task, TaskFuture};

/// include-resolution → minify → rename-with-suffix
pub fn html_pipeline(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Pipeline {
    Pipeline::new("html", cfg.root(), cfg.html_paths(), Arc::clone(&fs))
        .stage(IncludeStage::new(fs))
        .stage(HtmlMinifyStage::new())
        .stage(RenameStage::new(cfg.html().suffix.clone()))
}

/// source-map-begin → transpile → concatenate → minify → source-map-end
pub fn js_pipeline(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Pipeline {
    let js = cfg.js();
    Pipeline::new("js", cfg.root(), cfg.js_paths(), fs)
        .stage(SourceMapBegin::new())
        .stage(CommandStage::new("transpile", js.transpile.clone()))
        .stage(ConcatStage::new(js.bundle.clone()))
        .stage(JsMinifyStage::new())
        .stage(SourceMapEnd::new(cfg.source_maps(), CommentStyle::Js))
}

/// source-map-begin → compile → vendor-prefix → concatenate → minify →
/// source-map-end
pub fn styles_pipeline(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Pipeline {
    let styles = cfg.styles();
    Pipeline::new("styles", cfg.root(), cfg.styles_paths(), Arc::clone(&fs))
        .stage(SourceMapBegin::new())
        .stage(SassStage::new(fs))
        .stage(PrefixStage::new())
        .stage(ConcatStage::new(styles.bundle.clone()))
        .stage(CssMinifyStage::new(styles.level))
        .stage(SourceMapEnd::new(cfg.source_maps(), CommentStyle::Css))
}

/// incremental-filter → generic re-encode
pub fn images_pipeline(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Pipeline {
    let spec = cfg.images_paths();
    let dest = cfg.root().join(&spec.dest);
    Pipeline::new("images", cfg.root(), spec, Arc::clone(&fs))
        .stage(IncrementalStage::new(fs, dest))
        .stage(ReencodeStage::new(cfg.images().jpeg_quality))
}

/// incremental-filter (against `.webp`) → WebP re-encode
pub fn images_webp_pipeline(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Pipeline {
    let spec = cfg.images_paths();
    let dest = cfg.root().join(&spec.dest);
    Pipeline::new("images-webp", cfg.root(), spec, Arc::clone(&fs))
        .stage(IncrementalStage::new(fs, dest).with_extension("webp"))
        .stage(WebpStage::new(cfg.images().webp_quality))
}

/// incremental-filter (against `.avif`) → AVIF re-encode
pub fn images_avif_pipeline(cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Pipeline {
    let images = cfg.images();
    let spec = cfg.images_paths();
    let dest = cfg.root().join(&spec.dest);
    Pipeline::new("images-avif", cfg.root(), spec, Arc::clone(&fs))
        .stage(IncrementalStage::new(fs, dest).with_extension("avif"))
        .stage(AvifStage::new(images.avif_quality, images.avif_speed))
}

/// Runs a [`Pipeline`] as a task.
///
/// Stage work is CPU- and file-bound, so each run goes to the blocking pool
/// and sibling pipelines proceed concurrently.
#[derive(Debug, Clone)]
pub struct PipelineTask {
    pipeline: Arc<Pipeline>,
}

impl PipelineTask {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Run once and return the summary.
    pub async fn run_once(&self) -> Result<PipelineSummary> {
        let pipeline = Arc::clone(&self.pipeline);
        let name = pipeline.name().to_string();
        let summary = tokio::task::spawn_blocking(move || pipeline.run())
            .await
            .map_err(|e| KilnError::TaskPanicked(format!("{name}: {e}")))??;
        Ok(summary)
    }
}

impl Task for PipelineTask {
    fn name(&self) -> &str {
        self.pipeline.name()
    }

    fn run(&self) -> TaskFuture {
        let this = self.clone();
        Box::pin(async move {
            this.run_once().await?;
            Ok(())
        })
    }
}
