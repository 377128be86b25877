#![allow(dead_code)]

use std::path::Path;

use assetkiln::config::{ConfigFile, RawConfigFile};
use assetkiln::types::SourceMapMode;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn output_root(mut self, root: &str) -> Self {
        self.config.config.output_root = root.to_string();
        self
    }

    pub fn source_maps(mut self, mode: SourceMapMode) -> Self {
        self.config.config.source_maps = mode;
        self
    }

    pub fn js_transpile(mut self, cmd: &str) -> Self {
        self.config.js.transpile = Some(cmd.to_string());
        self
    }

    pub fn js_main(mut self, pattern: &str) -> Self {
        self.config.js.main.get_or_insert_with(Vec::new).push(pattern.to_string());
        self
    }

    pub fn styles_level(mut self, level: u8) -> Self {
        self.config.styles.level = level;
        self
    }

    pub fn images_dest(mut self, dest: &str) -> Self {
        self.config.images.dest = dest.to_string();
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    /// Build and anchor at `root`.
    pub fn build_at(self, root: impl AsRef<Path>) -> ConfigFile {
        self.build().with_root(root.as_ref())
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
