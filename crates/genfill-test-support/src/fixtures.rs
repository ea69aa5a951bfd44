//! Image fixtures.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};

/// Opaque fill colour used by [`solid_canvas`].
pub const CANVAS_COLOUR: Rgba<u8> = Rgba([40, 80, 120, 255]);

/// Opaque `width` x `height` image filled with [`CANVAS_COLOUR`].
#[must_use]
pub fn solid_canvas(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, CANVAS_COLOUR)
}

/// PNG encoding of a `width` x `height` image filled with `colour`.
///
/// # Errors
///
/// Returns an error if the encoder rejects the image.
pub fn png_bytes(width: u32, height: u32, colour: Rgba<u8>) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    RgbaImage::from_pixel(width, height, colour)
        .write_to(&mut buffer, ImageFormat::Png)
        .context("failed to encode fixture png")?;
    Ok(buffer.into_inner())
}

/// Write a [`solid_canvas`] PNG to `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_canvas(path: &Path, width: u32, height: u32) -> Result<()> {
    solid_canvas(width, height)
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("failed to write canvas {}", path.display()))
}
