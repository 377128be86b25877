// src/stages/images.rs

//! Image re-encoding stages.
//!
//! The generic stage recompresses JPEG/PNG in place and passes other files
//! (SVG, ICO, ...) through. The WebP and AVIF stages derive a new file per
//! raster input and ignore everything else.

use anyhow::{Context, Result, anyhow};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::{WebPEncoder, WebPQuality};
use image::{ColorType, DynamicImage, ImageEncoder};
use ravif::{Encoder, Img, RGBA8};
use tracing::debug;

use crate::pipeline::{FileItem, Stage, StageError};

const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp"];

/// Whether an item is a raster image the encoders can decode.
pub fn is_raster(item: &FileItem) -> bool {
    item.extension()
        .is_some_and(|ext| RASTER_EXTENSIONS.contains(&ext.as_str()))
}

fn decode(item: &FileItem) -> Result<DynamicImage> {
    image::load_from_memory(&item.contents).with_context(|| format!("decoding {:?}", item.origin))
}

/// Recompress JPEG and PNG files, keeping the result only when it is
/// smaller than the input.
#[derive(Debug, Clone)]
pub struct ReencodeStage {
    jpeg_quality: u8,
}

impl ReencodeStage {
    pub fn new(jpeg_quality: u8) -> Self {
        Self { jpeg_quality }
    }

    fn encode_jpeg(&self, img: &DynamicImage) -> Result<Vec<u8>> {
        let rgb = img.to_rgb8();
        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.jpeg_quality).encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ColorType::Rgb8,
        )?;
        Ok(out)
    }

    fn encode_png(&self, img: &DynamicImage) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive)
            .write_image(img.as_bytes(), img.width(), img.height(), img.color())?;
        Ok(out)
    }
}

impl Stage for ReencodeStage {
    fn name(&self) -> &str {
        "imagemin"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        let encoded = match item.extension().as_deref() {
            Some("jpg" | "jpeg") => decode(&item).and_then(|img| self.encode_jpeg(&img)),
            Some("png") => decode(&item).and_then(|img| self.encode_png(&img)),
            _ => return Ok(vec![item]),
        };
        let encoded = encoded.map_err(|err| StageError::warning(self.name(), &item, err))?;

        if encoded.len() < item.contents.len() {
            debug!(
                path = ?item.origin,
                before = item.contents.len(),
                after = encoded.len(),
                "recompressed"
            );
            item.contents = encoded;
        }
        Ok(vec![item])
    }
}

/// Derive a lossy `.webp` from each raster input.
#[derive(Debug, Clone)]
pub struct WebpStage {
    quality: u8,
}

impl WebpStage {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    pub fn encode(&self, img: &DynamicImage) -> Result<Vec<u8>> {
        let rgba = img.to_rgba8();
        let mut out = Vec::new();
        WebPEncoder::new_with_quality(&mut out, WebPQuality::lossy(self.quality)).encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ColorType::Rgba8,
        )?;
        Ok(out)
    }
}

impl Stage for WebpStage {
    fn name(&self) -> &str {
        "webp"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        if !is_raster(&item) {
            return Ok(Vec::new());
        }
        item.contents = decode(&item)
            .and_then(|img| self.encode(&img))
            .map_err(|err| StageError::warning(self.name(), &item, err))?;
        item.relative.set_extension("webp");
        Ok(vec![item])
    }
}

/// Derive an `.avif` from each raster input.
#[derive(Debug, Clone)]
pub struct AvifStage {
    quality: u8,
    speed: u8,
}

impl AvifStage {
    pub fn new(quality: u8, speed: u8) -> Self {
        Self { quality, speed }
    }

    pub fn encode(&self, img: &DynamicImage) -> Result<Vec<u8>> {
        let rgba = img.to_rgba8();
        let pixels: Vec<RGBA8> = rgba
            .as_raw()
            .chunks_exact(4)
            .map(|p| RGBA8::new(p[0], p[1], p[2], p[3]))
            .collect();
        let encoded = Encoder::new()
            .with_quality(f32::from(self.quality))
            .with_speed(self.speed)
            .encode_rgba(Img::new(
                &pixels[..],
                rgba.width() as usize,
                rgba.height() as usize,
            ))
            .map_err(|e| anyhow!("avif encoding failed: {e}"))?;
        Ok(encoded.avif_file)
    }
}

impl Stage for AvifStage {
    fn name(&self) -> &str {
        "avif"
    }

    fn process(&self, mut item: FileItem) -> Result<Vec<FileItem>, StageError> {
        if !is_raster(&item) {
            return Ok(Vec::new());
        }
        item.contents = decode(&item)
            .and_then(|img| self.encode(&img))
            .map_err(|err| StageError::warning(self.name(), &item, err))?;
        item.relative.set_extension("avif");
        Ok(vec![item])
    }
}
