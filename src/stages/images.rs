//! Raster image stages: lossy/lossless optimization and WebP derivation.

use super::{StageError, StageOutput};
use crate::build::{discover_multi, has_extension, BuildContext};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Source patterns for the optimizer: rasters directly under the image root.
const RASTER_PATTERNS: &[&str] = &["img/*.png", "img/*.jpg"];

/// Optimizer output patterns, read back by the WebP stage.
const OPTIMIZED_PATTERNS: &[&str] = &["img/raster/*.png", "img/raster/*.jpg"];

fn patterns(list: &[&str]) -> Vec<String> {
    list.iter().map(|p| p.to_string()).collect()
}

/// Re-encode raster images into `img/raster/` under the output tree.
///
/// JPEGs are re-encoded at the configured quality, PNGs at the encoder's
/// best compression. A malformed input aborts the stage; there is no
/// skip-and-continue policy for bad rasters.
pub fn optimize(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let raster_dir = ctx.out_dir().join("img/raster");
    let files = discover_multi(&ctx.src_dir(), &patterns(RASTER_PATTERNS))?;
    if files.is_empty() {
        return Ok(StageOutput::default());
    }
    fs::create_dir_all(&raster_dir).map_err(|e| StageError::io(&raster_dir, e))?;

    let quality = ctx.config().images.jpeg_quality;
    let outputs: Result<Vec<PathBuf>, StageError> = files
        .par_iter()
        .map(|file| optimize_one(file, &raster_dir, quality))
        .collect();
    Ok(StageOutput::files(outputs?))
}

fn optimize_one(file: &Path, raster_dir: &Path, jpeg_quality: u8) -> Result<PathBuf, StageError> {
    let img = image::open(file)
        .map_err(|e| StageError::Image { path: file.to_path_buf(), message: e.to_string() })?;

    let file_name = file.file_name().unwrap_or_default();
    let dest = raster_dir.join(file_name);
    let mut encoded = Vec::new();

    if has_extension(file, &["jpg", "jpeg"]) {
        // JPEG has no alpha channel
        let rgb = img.to_rgb8();
        JpegEncoder::new_with_quality(&mut encoded, jpeg_quality)
            .encode_image(&rgb)
            .map_err(|e| StageError::Image { path: file.to_path_buf(), message: e.to_string() })?;
    } else {
        PngEncoder::new_with_quality(&mut encoded, CompressionType::Best, FilterType::Adaptive)
            .write_image(img.as_bytes(), img.width(), img.height(), img.color())
            .map_err(|e| StageError::Image { path: file.to_path_buf(), message: e.to_string() })?;
    }

    fs::write(&dest, &encoded).map_err(|e| StageError::io(&dest, e))?;
    Ok(dest)
}

/// Derive WebP variants from the optimizer's output.
///
/// Reads `img/raster/` back from the output tree, so this stage must run
/// after [`optimize`]. Output lands in `img/webp/` with the same base name.
pub fn webp(ctx: &BuildContext) -> Result<StageOutput, StageError> {
    let out_dir = ctx.out_dir();
    let webp_dir = out_dir.join("img/webp");
    let files = discover_multi(&out_dir, &patterns(OPTIMIZED_PATTERNS))?;
    if files.is_empty() {
        return Ok(StageOutput::default());
    }
    fs::create_dir_all(&webp_dir).map_err(|e| StageError::io(&webp_dir, e))?;

    let quality = ctx.config().images.webp_quality;
    let outputs: Result<Vec<PathBuf>, StageError> = files
        .par_iter()
        .map(|file| webp_one(file, &webp_dir, quality))
        .collect();
    Ok(StageOutput::files(outputs?))
}

fn webp_one(file: &Path, webp_dir: &Path, quality: f32) -> Result<PathBuf, StageError> {
    let img = image::open(file)
        .map_err(|e| StageError::Image { path: file.to_path_buf(), message: e.to_string() })?;
    let rgba = img.to_rgba8();
    let encoded = webp::Encoder::from_rgba(&rgba, rgba.width(), rgba.height()).encode(quality);

    let stem = file.file_stem().unwrap_or_default();
    let dest = webp_dir.join(stem).with_extension("webp");
    fs::write(&dest, &*encoded).map_err(|e| StageError::io(&dest, e))?;
    Ok(dest)
}
