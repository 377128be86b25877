// src/stages/styles.rs

//! Stylesheet stages: SCSS compilation (`grass`), vendor prefixing and
//! minification (`lightningcss`).

use std::io;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use crate::fs::FileSystem;
use crate::pipeline::{FileItem, Stage, StageError};

/// Browsers the prefixer and minifier target.
fn browser_targets() -> Targets {
    Targets::from(Browsers {
        chrome: Some(80 << 16),
        edge: Some(88 << 16),
        firefox: Some(78 << 16),
        safari: Some(12 << 16),
        ios_saf: Some(12 << 16),
        ..Browsers::default()
    })
}

/// `@import`/`@use` lookups for the SCSS compiler go through our FileSystem.
#[derive(Debug)]
struct SassFs<'a> {
    fs: &'a dyn FileSystem,
}

impl grass::Fs for SassFs<'_> {
    fn is_dir(&self, path: &Path) -> bool {
        self.fs.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.fs.is_file(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.fs.read(path).map_err(|e| io::Error::other(format!("{e:#}")))
    }
}

/// Compile SCSS to CSS; output files take the `.css` extension.
///
/// Imports resolve relative to the entry file's directory.
#[derive(Debug, Clone)]
pub struct SassStage {
    fs: Arc<dyn FileSystem>,
}

impl SassStage {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn compile(&self, source: &str, file: &Path) -> Result<String> {
        let adapter = SassFs {
            fs: self.fs.as_ref(),
        };
        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        let options = grass::Options::default().fs(&adapter).load_path(dir);
        grass::from_string(source.to_string(), &options).map_err(|e| anyhow!("{e}"))
    }
}

impl Stage for SassStage {
    fn name(&self) -> &str {
        "sass"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let css = item
            .text()
            .and_then(|text| self.compile(text, &item.origin))
            .map_err(|err| StageError::warning(self.name(), &item, err))?;
        item.contents = css.into_bytes();
        item.relative.set_extension("css");
        Ok(vec![item])
    }
}

fn transform(css: &str, filename: &str, structural: bool, minify: bool) -> Result<String> {
    let mut sheet = StyleSheet::parse(
        css,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| anyhow!("{e}"))?;

    if structural {
        sheet
            .minify(MinifyOptions {
                targets: browser_targets(),
                ..MinifyOptions::default()
            })
            .map_err(|e| anyhow!("{e}"))?;
    }

    let printed = sheet
        .to_css(PrinterOptions {
            minify,
            targets: browser_targets(),
            ..PrinterOptions::default()
        })
        .map_err(|e| anyhow!("{e}"))?;
    Ok(printed.code)
}

/// Add vendor prefixes required by the target browsers. Output stays
/// readable; minification is a separate stage.
#[derive(Debug, Clone, Default)]
pub struct PrefixStage;

impl PrefixStage {
    pub fn new() -> Self {
        Self
    }

    pub fn prefix(&self, css: &str, filename: &str) -> Result<String> {
        transform(css, filename, true, false)
    }
}

impl Stage for PrefixStage {
    fn name(&self) -> &str {
        "autoprefix"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let css = item
            .text()
            .and_then(|text| self.prefix(text, &item.relative_str()))
            .map_err(|err| StageError::warning(self.name(), &item, err))?;
        item.contents = css.into_bytes();
        Ok(vec![item])
    }
}

/// Minify CSS.
///
/// Level 0 only strips whitespace and comments; levels 1 and 2 also merge
/// and shorten rules and declarations.
#[derive(Debug, Clone)]
pub struct CssMinifyStage {
    level: u8,
}

impl CssMinifyStage {
    pub fn new(level: u8) -> Self {
        Self { level }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn minify(&self, css: &str, filename: &str) -> Result<String> {
        transform(css, filename, self.level > 0, true)
    }
}

impl Stage for CssMinifyStage {
    fn name(&self) -> &str {
        "css-minify"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let css = item
            .text()
            .and_then(|text| self.minify(text, &item.relative_str()))
            .map_err(|err| StageError::warning(self.name(), &item, err))?;
        item.contents = css.into_bytes();
        Ok(vec![item])
    }
}
