// src/build/mod.rs

//! The concrete build: the clean task, one pipeline task per asset class
//! and the driver that composes them with the watcher.

pub mod clean;
pub mod driver;
pub mod pipelines;

pub use clean::CleanTask;
pub use driver::{ASSET_TASKS, BuildDriver};
pub use pipelines::PipelineTask;
