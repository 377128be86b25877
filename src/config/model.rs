// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{AssetClass, SourceMapMode};

/// Raw configuration as read from a TOML file.
///
/// Every section is optional; the defaults reproduce a conventional
/// `src/` -> `dist/` front-end layout:
///
/// ```toml
/// [config]
/// output_root = "dist"
/// source_maps = "inline"
///
/// [html]
/// src = ["src/**/*.html"]
/// main = ["src/*.html"]
/// dest = "dist"
///
/// [js]
/// src = ["src/**/*.js"]
/// bundle = "main.min.js"
/// transpile = "npx babel --presets=@babel/preset-env"
///
/// [styles]
/// main = ["src/scss/style.scss"]
/// level = 2
///
/// [images]
/// src = ["src/img/**/*"]
/// dest = "dist/img"
/// webp_quality = 80
/// avif_quality = 75
/// ```
///
/// This type performs no validation; use [`ConfigFile::try_from`] (or
/// `config::load_and_validate`) to obtain a checked [`ConfigFile`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub html: HtmlSection,

    #[serde(default)]
    pub js: ScriptSection,

    #[serde(default)]
    pub styles: StyleSection,

    #[serde(default)]
    pub images: ImageSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigSection {
    /// Output root shared by every pipeline; the clean stage empties it.
    #[serde(default = "default_output_root")]
    pub output_root: String,

    #[serde(default)]
    pub source_maps: SourceMapMode,
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            source_maps: SourceMapMode::default(),
        }
    }
}

/// `[html]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HtmlSection {
    /// Watched patterns (pages and partials).
    #[serde(default = "default_html_src")]
    pub src: Vec<String>,

    /// Pages actually emitted. Partials live below these and are only
    /// reachable through `@@include`.
    #[serde(default = "default_html_main")]
    pub main: Vec<String>,

    #[serde(default = "default_output_root")]
    pub dest: String,

    /// Inserted before the extension: `index.html` -> `index.min.html`.
    #[serde(default = "default_min_suffix")]
    pub suffix: String,
}

impl Default for HtmlSection {
    fn default() -> Self {
        Self {
            src: default_html_src(),
            main: default_html_main(),
            dest: default_output_root(),
            suffix: default_min_suffix(),
        }
    }
}

/// `[js]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptSection {
    #[serde(default = "default_js_src")]
    pub src: Vec<String>,

    /// Optional entry patterns; when absent every `src` match is bundled.
    #[serde(default)]
    pub main: Option<Vec<String>>,

    #[serde(default = "default_output_root")]
    pub dest: String,

    #[serde(default = "default_js_bundle")]
    pub bundle: String,

    /// Shell command used as the transpile stage. It reads one script on
    /// stdin and writes the transpiled script to stdout. Unset means the
    /// stage passes scripts through unchanged.
    #[serde(default)]
    pub transpile: Option<String>,
}

impl Default for ScriptSection {
    fn default() -> Self {
        Self {
            src: default_js_src(),
            main: None,
            dest: default_output_root(),
            bundle: default_js_bundle(),
            transpile: None,
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleSection {
    #[serde(default = "default_styles_src")]
    pub src: Vec<String>,

    #[serde(default = "default_styles_main")]
    pub main: Option<Vec<String>>,

    #[serde(default = "default_output_root")]
    pub dest: String,

    #[serde(default = "default_css_bundle")]
    pub bundle: String,

    /// Minification level: 0 = whitespace only, 1 and 2 also merge and
    /// shorten rules.
    #[serde(default = "default_css_level")]
    pub level: u8,
}

impl Default for StyleSection {
    fn default() -> Self {
        Self {
            src: default_styles_src(),
            main: default_styles_main(),
            dest: default_output_root(),
            bundle: default_css_bundle(),
            level: default_css_level(),
        }
    }
}

/// `[images]` section. One source pattern set feeds three pipelines
/// (generic re-encode, WebP, AVIF) that all write to `dest`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageSection {
    #[serde(default = "default_images_src")]
    pub src: Vec<String>,

    #[serde(default = "default_images_dest")]
    pub dest: String,

    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    #[serde(default = "default_webp_quality")]
    pub webp_quality: u8,

    #[serde(default = "default_avif_quality")]
    pub avif_quality: u8,

    /// rav1e speed preset, 1 (slowest) to 10 (fastest).
    #[serde(default = "default_avif_speed")]
    pub avif_speed: u8,
}

impl Default for ImageSection {
    fn default() -> Self {
        Self {
            src: default_images_src(),
            dest: default_images_dest(),
            jpeg_quality: default_jpeg_quality(),
            webp_quality: default_webp_quality(),
            avif_quality: default_avif_quality(),
            avif_speed: default_avif_speed(),
        }
    }
}

fn default_output_root() -> String {
    "dist".to_string()
}

fn default_min_suffix() -> String {
    ".min".to_string()
}

fn default_html_src() -> Vec<String> {
    vec!["src/**/*.html".to_string()]
}

fn default_html_main() -> Vec<String> {
    vec!["src/*.html".to_string()]
}

fn default_js_src() -> Vec<String> {
    vec!["src/**/*.js".to_string()]
}

fn default_js_bundle() -> String {
    "main.min.js".to_string()
}

fn default_styles_src() -> Vec<String> {
    vec!["src/scss/**/*.scss".to_string()]
}

fn default_styles_main() -> Option<Vec<String>> {
    Some(vec!["src/scss/style.scss".to_string()])
}

fn default_css_bundle() -> String {
    "main.min.css".to_string()
}

fn default_css_level() -> u8 {
    2
}

fn default_images_src() -> Vec<String> {
    vec!["src/img/**/*".to_string()]
}

fn default_images_dest() -> String {
    "dist/img".to_string()
}

fn default_jpeg_quality() -> u8 {
    75
}

fn default_webp_quality() -> u8 {
    80
}

fn default_avif_quality() -> u8 {
    75
}

fn default_avif_speed() -> u8 {
    6
}

/// Source/entry/destination patterns for one asset class.
///
/// Patterns are relative to the project root; `dest` is a project-relative
/// directory. Built once from the validated config and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    pub class: AssetClass,
    pub src: Vec<String>,
    pub main: Option<Vec<String>>,
    pub dest: PathBuf,
}

impl PathSpec {
    /// Patterns a pipeline reads: `main` when present, else `src`.
    pub fn entry_patterns(&self) -> &[String] {
        self.main.as_deref().unwrap_or(&self.src)
    }

    /// Patterns the watcher observes.
    pub fn watch_patterns(&self) -> &[String] {
        &self.src
    }
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (see `validate.rs`),
/// so every holder can rely on patterns compiling and destinations lying
/// inside the output root.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    root: PathBuf,
    config: ConfigSection,
    html: HtmlSection,
    js: ScriptSection,
    styles: StyleSection,
    images: ImageSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            root: PathBuf::from("."),
            config: raw.config,
            html: raw.html,
            js: raw.js,
            styles: raw.styles,
            images: raw.images,
        }
    }

    /// Anchor all relative patterns at `root` (the project directory).
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_root(&self) -> PathBuf {
        PathBuf::from(&self.config.output_root)
    }

    pub fn source_maps(&self) -> SourceMapMode {
        self.config.source_maps
    }

    pub fn set_source_maps(&mut self, mode: SourceMapMode) {
        self.config.source_maps = mode;
    }

    pub fn html(&self) -> &HtmlSection {
        &self.html
    }

    pub fn js(&self) -> &ScriptSection {
        &self.js
    }

    pub fn styles(&self) -> &StyleSection {
        &self.styles
    }

    pub fn images(&self) -> &ImageSection {
        &self.images
    }

    pub fn html_paths(&self) -> PathSpec {
        PathSpec {
            class: AssetClass::Markup,
            src: self.html.src.clone(),
            main: Some(self.html.main.clone()),
            dest: PathBuf::from(&self.html.dest),
        }
    }

    pub fn js_paths(&self) -> PathSpec {
        PathSpec {
            class: AssetClass::Script,
            src: self.js.src.clone(),
            main: self.js.main.clone(),
            dest: PathBuf::from(&self.js.dest),
        }
    }

    pub fn styles_paths(&self) -> PathSpec {
        PathSpec {
            class: AssetClass::Styles,
            src: self.styles.src.clone(),
            main: self.styles.main.clone(),
            dest: PathBuf::from(&self.styles.dest),
        }
    }

    pub fn images_paths(&self) -> PathSpec {
        PathSpec {
            class: AssetClass::Images,
            src: self.images.src.clone(),
            main: None,
            dest: PathBuf::from(&self.images.dest),
        }
    }

    /// All path specs, in asset-class order.
    pub fn path_specs(&self) -> Vec<PathSpec> {
        vec![
            self.html_paths(),
            self.js_paths(),
            self.styles_paths(),
            self.images_paths(),
        ]
    }
}
