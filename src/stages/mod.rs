// src/stages/mod.rs

//! Concrete transform stages.
//!
//! Each stage wraps one collaborator (a minifier, compiler or encoder)
//! behind the [`Stage`](crate::pipeline::Stage) trait. Collaborator failures
//! on a single file become stage warnings; failures that make the whole
//! output meaningless (a bundle that cannot be built) are fatal.

pub mod command;
pub mod concat;
pub mod html;
pub mod images;
pub mod script;
pub mod sourcemaps;
pub mod styles;

pub use command::CommandStage;
pub use concat::ConcatStage;
pub use html::{HtmlMinifyStage, IncludeStage, RenameStage};
pub use images::{AvifStage, ReencodeStage, WebpStage};
pub use script::JsMinifyStage;
pub use sourcemaps::{CommentStyle, SourceMapBegin, SourceMapEnd};
pub use styles::{CssMinifyStage, PrefixStage, SassStage};
