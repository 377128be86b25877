// src/lib.rs

pub mod build;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod stages;
pub mod task;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::build::BuildDriver;
use crate::cli::{CliArgs, Entry};
use crate::config::{ConfigFile, load_or_default};
use crate::errors::{KilnError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::task::TaskExpr;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (+ CLI overrides)
/// - the build driver (clean, pipelines, watch)
/// - the scheduler run for the chosen entry point
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let (config_path, explicit) = args.config_path();
    let mut cfg = load_or_default(&config_path, explicit)?;
    if let Some(mode) = args.source_maps {
        cfg.set_source_maps(mode);
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let driver = BuildDriver::new(cfg, fs)?;

    let expr = match (args.entry, args.once) {
        (Entry::Clean, _) => driver.clean_expr()?,
        (Entry::Default, true) => driver.build_expr()?,
        (Entry::Default, false) => driver.default_expr()?,
    };

    if args.dry_run {
        print_dry_run(driver.config(), &expr);
        return Ok(());
    }

    let report = tokio::select! {
        res = driver.run(&expr) => res?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted; shutting down");
            return Ok(());
        }
    };

    for failure in &report.failed {
        error!(task = %failure.task, "{}", failure.message);
    }
    info!(
        completed = report.completed.len(),
        failed = report.failed.len(),
        "run finished"
    );

    if !report.is_success() {
        return Err(KilnError::BuildFailed(
            report.failed_tasks().map(str::to_string).collect(),
        ));
    }
    Ok(())
}

/// Simple dry-run output: print settings, path specs and the task plan.
fn print_dry_run(cfg: &ConfigFile, expr: &TaskExpr) {
    println!("assetkiln dry-run");
    println!("  root = {}", cfg.root().display());
    println!("  config.output_root = {}", cfg.output_root().display());
    println!("  config.source_maps = {:?}", cfg.source_maps());
    println!();

    println!("path specs:");
    for spec in cfg.path_specs() {
        println!("  - {}", spec.class);
        println!("      src: {:?}", spec.src);
        if let Some(ref main) = spec.main {
            println!("      main: {:?}", main);
        }
        println!("      dest: {}", spec.dest.display());
    }
    println!();

    println!("plan: {expr}");

    debug!("dry-run complete (no execution)");
}
