// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// One category of source file, each with its own pipeline(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AssetClass {
    Markup,
    Script,
    Styles,
    Images,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Markup => "markup",
            AssetClass::Script => "script",
            AssetClass::Styles => "styles",
            AssetClass::Images => "images",
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How bundling pipelines emit their source maps.
///
/// - `Inline`: append a base64 `data:` URI comment to the bundle (default).
/// - `File`: write `<bundle>.map` next to the bundle and reference it.
/// - `None`: drop the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMapMode {
    Inline,
    File,
    None,
}

impl Default for SourceMapMode {
    fn default() -> Self {
        SourceMapMode::Inline
    }
}

impl FromStr for SourceMapMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(SourceMapMode::Inline),
            "file" => Ok(SourceMapMode::File),
            "none" => Ok(SourceMapMode::None),
            other => Err(format!(
                "invalid source_maps: {other} (expected \"inline\", \"file\" or \"none\")"
            )),
        }
    }
}
