// src/build/driver.rs

use std::sync::Arc;

use tracing::debug;

use crate::build::clean::CleanTask;
use crate::build::pipelines::{
    PipelineTask, html_pipeline, images_avif_pipeline, images_pipeline, images_webp_pipeline,
    js_pipeline, styles_pipeline,
};
use crate::config::ConfigFile;
use crate::engine::{RunReport, Scheduler};
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::task::{Task, TaskExpr, TaskRegistry, parallel, sequence};
use crate::watch::{WatchBinding, WatchTask};

/// Asset pipelines, in the order they are registered and displayed.
pub const ASSET_TASKS: [&str; 6] = [
    "html",
    "js",
    "styles",
    "images",
    "images-webp",
    "images-avif",
];

/// Wires config, tasks and scheduler into the fixed build topology:
///
/// `clean → (html ‖ js ‖ styles ‖ images ‖ images-webp ‖ images-avif) → watch`
#[derive(Debug)]
pub struct BuildDriver {
    config: ConfigFile,
    registry: TaskRegistry,
    scheduler: Scheduler,
}

impl BuildDriver {
    /// Register `clean`, every asset pipeline and `watch` (bound to each
    /// pipeline's `src` patterns).
    pub fn new(config: ConfigFile, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let root = config.root().to_path_buf();
        let mut registry = TaskRegistry::new();

        let images_dest = root.join(&config.images_paths().dest);
        registry.register(Arc::new(CleanTask::new(
            Arc::clone(&fs),
            root.join(config.output_root()),
            vec![images_dest],
        )))?;

        let pipelines = [
            html_pipeline(&config, Arc::clone(&fs)),
            js_pipeline(&config, Arc::clone(&fs)),
            styles_pipeline(&config, Arc::clone(&fs)),
            images_pipeline(&config, Arc::clone(&fs)),
            images_webp_pipeline(&config, Arc::clone(&fs)),
            images_avif_pipeline(&config, Arc::clone(&fs)),
        ];

        let mut bindings = Vec::with_capacity(pipelines.len());
        for pipeline in pipelines {
            debug!(task = %pipeline.name(), stages = ?pipeline.stage_names(), "registering pipeline");
            let spec = pipeline.spec().clone();
            let task: Arc<dyn Task> = Arc::new(PipelineTask::new(pipeline));
            bindings.push(WatchBinding::for_spec(&spec, Arc::clone(&task))?);
            registry.register(task)?;
        }

        registry.register(Arc::new(WatchTask::new(root, bindings)))?;

        Ok(Self {
            config,
            registry,
            scheduler: Scheduler::new(),
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Every asset pipeline in parallel, each guarded so one failed build
    /// neither fails the group nor keeps `watch` from starting.
    fn assets_expr(&self) -> Result<TaskExpr> {
        let children = ASSET_TASKS
            .iter()
            .map(|name| self.registry.task(name).map(TaskExpr::guarded))
            .collect::<Result<Vec<_>>>()?;
        Ok(parallel(children))
    }

    /// `clean → (assets…) → watch`
    pub fn default_expr(&self) -> Result<TaskExpr> {
        Ok(sequence([
            self.registry.task("clean")?,
            self.assets_expr()?,
            self.registry.task("watch")?,
        ]))
    }

    /// `clean → (assets…)`, for one-shot builds.
    pub fn build_expr(&self) -> Result<TaskExpr> {
        Ok(sequence([self.registry.task("clean")?, self.assets_expr()?]))
    }

    pub fn clean_expr(&self) -> Result<TaskExpr> {
        self.registry.task("clean")
    }

    pub async fn run(&self, expr: &TaskExpr) -> Result<RunReport> {
        self.scheduler.run(expr).await
    }
}
