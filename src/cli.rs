// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;
use crate::types::SourceMapMode;

/// Command-line arguments for `assetkiln`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetkiln",
    version,
    about = "Build front-end assets (markup, scripts, styles, images) and rebuild them on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Entry point to run.
    #[arg(value_enum, default_value_t = Entry::Default)]
    pub entry: Entry,

    /// Path to the config file (TOML).
    ///
    /// Default: `Assetkiln.toml` in the current working directory; built-in
    /// defaults are used when that file does not exist.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Build once without watching; exit non-zero if any pipeline failed.
    #[arg(long)]
    pub once: bool,

    /// Override `[config] source_maps` (inline, file, none).
    #[arg(long, value_name = "MODE")]
    pub source_maps: Option<SourceMapMode>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETKILN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the path specs and the task plan, but don't
    /// run anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Config path to load and whether the user asked for it explicitly.
    pub fn config_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (default_config_path(), false),
        }
    }
}

/// Operator-facing entry points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum Entry {
    /// clean → parallel asset builds → watch
    Default,
    /// Only empty the output root (keeping the images destination).
    Clean,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
