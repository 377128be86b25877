// src/config/loader.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = std::fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
///
/// Relative patterns in the file are anchored at the directory that
/// contains it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config.with_root(config_root_dir(path)))
}

/// Resolve the configuration the CLI should use.
///
/// An explicitly requested file must exist. When the default
/// `Assetkiln.toml` is missing, the built-in defaults are used with the
/// current directory as project root.
pub fn load_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !explicit && !path.exists() {
        let config = ConfigFile::try_from(RawConfigFile::default())?;
        return Ok(config.with_root(config_root_dir(path)));
    }
    load_and_validate(path)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Assetkiln.toml")
}

/// Figure out the project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetkiln.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetkiln.toml" (parent = ""),
///   we fall back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
