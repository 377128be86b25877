// src/errors.rs

//! Crate-wide error types.
//!
//! `KilnError` is what escapes task runs and the top-level entry points.
//! Transform stages work with plain `anyhow` errors internally; the pipeline
//! turns those into either a [`StageWarning`] (logged, item dropped) or a
//! [`PipelineError`] (the owning pipeline's run is aborted).

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KilnError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("clean failed at {path:?}: {cause}")]
    Clean { path: PathBuf, cause: anyhow::Error },

    #[error("watch error: {0}")]
    WatchIo(String),

    #[error("task panicked: {0}")]
    TaskPanicked(String),

    #[error("build failed: {}", .0.join(", "))]
    BuildFailed(Vec<String>),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A transform stage failed for one pipeline run.
#[derive(Error, Debug)]
#[error("{task} pipeline failed in stage '{stage}': {cause:#}")]
pub struct PipelineError {
    pub task: String,
    pub stage: String,
    pub cause: anyhow::Error,
}

/// A single item failed a stage; the item is dropped and the run goes on.
#[derive(Error, Debug)]
#[error("stage '{stage}' dropped {path:?}: {message}")]
pub struct StageWarning {
    pub stage: String,
    pub path: PathBuf,
    pub message: String,
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, KilnError>;
