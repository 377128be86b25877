//! On-disk sample projects for end-to-end tests.

use std::fs;
use std::path::Path;

use anyhow::Result;
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, Rgb, RgbImage};

pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Fixture</title>
  </head>
  <body>
    @@include('partials/header.html', { "title": "Welcome" })
    <main>
      <p>Hello,    world.</p>
    </main>
  </body>
</html>
"#;

pub const HEADER_HTML: &str = r#"<header>
  <h1>@@title</h1>
</header>
"#;

pub const SCRIPT_A: &str = r#"// first script
function greet(name) {
  const message = "Hello, " + name;
  return message;
}
window.greet = greet;
"#;

pub const STYLE_SCSS: &str = r#"@import 'partial';

$accent: #ff0000;

.button {
  color: $accent;
  user-select: none;
}
"#;

pub const PARTIAL_SCSS: &str = r#".card {
  margin: 0px 0px 0px 0px;
}
"#;

pub fn write_file(root: &Path, rel: &str, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    Ok(())
}

/// A small, noise-free gradient encoded as a high-quality JPEG.
pub fn sample_jpeg(width: u32, height: u32) -> Result<Vec<u8>> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 100).encode(
        img.as_raw(),
        width,
        height,
        ColorType::Rgb8,
    )?;
    Ok(out)
}

/// Write the reference project:
///
/// - `src/index.html` including `src/partials/header.html`
/// - `src/js/a.js`
/// - `src/scss/style.scss` importing `src/scss/_partial.scss`
/// - `src/img/photo.jpg`
pub fn write_sample_project(root: &Path) -> Result<()> {
    write_file(root, "src/index.html", INDEX_HTML)?;
    write_file(root, "src/partials/header.html", HEADER_HTML)?;
    write_file(root, "src/js/a.js", SCRIPT_A)?;
    write_file(root, "src/scss/style.scss", STYLE_SCSS)?;
    write_file(root, "src/scss/_partial.scss", PARTIAL_SCSS)?;
    write_file(root, "src/img/photo.jpg", sample_jpeg(64, 48)?)?;
    Ok(())
}
