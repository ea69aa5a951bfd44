//! In-process raster document implementing [`EditingHost`].
//!
//! Behaves like the editing host during a fill cycle:
//! - export writes the offset record, the mask and the crop of the padded window
//!   without touching layers, selection or the active layer;
//! - placement adds the result as a new top layer centred on the canvas (as the
//!   host's place command does), then translates it so its top-left corner lands
//!   on the recorded offset.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use image::{GrayImage, ImageFormat, Luma, Rgba, RgbaImage, imageops};
use tracing::{debug, info};

use crate::artifacts::{
    ArtifactSet, missing_or_io, parse_offset_record, remove_if_exists, write_offset_record,
};
use crate::error::{HostError, HostResult};
use crate::geometry::{Offset, Rect};
use crate::host::EditingHost;
use crate::launcher::{LaunchSpec, spawn_detached};

/// A raster layer positioned in document space.
#[derive(Debug, Clone)]
pub struct Layer {
    /// Display name.
    pub name: String,
    /// Document position of the layer's top-left pixel.
    pub origin: Offset,
    /// Layer pixels.
    pub pixels: RgbaImage,
}

/// Layered raster document with an optional selection.
#[derive(Debug, Clone)]
pub struct Document {
    width: u32,
    height: u32,
    layers: Vec<Layer>,
    active: usize,
    selection: Option<Rect>,
}

impl Document {
    /// Document whose single background layer is `background`.
    #[must_use]
    pub fn new(background: RgbaImage) -> Self {
        Self {
            width: background.width(),
            height: background.height(),
            layers: vec![Layer {
                name: "Background".to_string(),
                origin: Offset::default(),
                pixels: background,
            }],
            active: 0,
            selection: None,
        }
    }

    /// Canvas width.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Canvas height.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Layers from bottom to top.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Index of the active layer.
    #[must_use]
    pub const fn active_layer(&self) -> usize {
        self.active
    }

    /// Active selection, if any.
    #[must_use]
    pub const fn selection(&self) -> Option<Rect> {
        self.selection
    }

    /// Select `rect`, clamped to the canvas.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidRect`] when nothing of `rect` lies on the canvas.
    pub fn select(&mut self, rect: Rect) -> HostResult<()> {
        let clamped = rect.clamped(self.width, self.height);
        if clamped.is_empty() {
            return Err(HostError::InvalidRect {
                value: format!(
                    "{},{},{},{}",
                    rect.left, rect.top, rect.right, rect.bottom
                ),
            });
        }
        self.selection = Some(clamped);
        Ok(())
    }

    /// Drop the selection.
    pub const fn deselect(&mut self) {
        self.selection = None;
    }

    /// Composite every layer, bottom to top, onto a transparent canvas.
    #[must_use]
    pub fn flatten(&self) -> RgbaImage {
        let mut canvas = RgbaImage::new(self.width, self.height);
        for layer in &self.layers {
            for (x, y, pixel) in layer.pixels.enumerate_pixels() {
                let Some((dx, dy)) = self.to_canvas(layer.origin, x, y) else {
                    continue;
                };
                blend_over(canvas.get_pixel_mut(dx, dy), *pixel);
            }
        }
        canvas
    }

    /// Composite crop of `window`.
    #[must_use]
    pub fn crop(&self, window: Rect) -> RgbaImage {
        let flattened = self.flatten();
        imageops::crop_imm(
            &flattened,
            window.left,
            window.top,
            window.width(),
            window.height(),
        )
        .to_image()
    }

    /// Add `pixels` as the new top layer centred on the canvas and make it active.
    /// Returns the layer index.
    pub fn place_layer(&mut self, name: impl Into<String>, pixels: RgbaImage) -> usize {
        let origin = Offset::new(
            centred(self.width, pixels.width()),
            centred(self.height, pixels.height()),
        );
        self.layers.push(Layer {
            name: name.into(),
            origin,
            pixels,
        });
        self.active = self.layers.len() - 1;
        self.active
    }

    /// Move layer `index` by `(dx, dy)`. Unknown indices are ignored.
    pub fn translate_layer(&mut self, index: usize, dx: i32, dy: i32) {
        if let Some(layer) = self.layers.get_mut(index) {
            layer.origin = Offset::new(
                layer.origin.x.saturating_add(dx),
                layer.origin.y.saturating_add(dy),
            );
        }
    }

    fn to_canvas(&self, origin: Offset, x: u32, y: u32) -> Option<(u32, u32)> {
        let dx = u32::try_from(i64::from(origin.x) + i64::from(x)).ok()?;
        let dy = u32::try_from(i64::from(origin.y) + i64::from(y)).ok()?;
        (dx < self.width && dy < self.height).then_some((dx, dy))
    }
}

fn centred(canvas: u32, extent: u32) -> i32 {
    let offset = (i64::from(canvas) - i64::from(extent)) / 2;
    i32::try_from(offset).unwrap_or(if offset < 0 { i32::MIN } else { i32::MAX })
}

fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let src_alpha = u32::from(src.0[3]);
    if src_alpha == 0 {
        return;
    }
    if src_alpha == 255 {
        *dst = src;
        return;
    }
    let dst_alpha = u32::from(dst.0[3]) * (255 - src_alpha) / 255;
    let out_alpha = src_alpha + dst_alpha;
    for (out, value) in dst.0.iter_mut().take(3).zip(src.0) {
        *out = to_u8((u32::from(value) * src_alpha + u32::from(*out) * dst_alpha) / out_alpha);
    }
    dst.0[3] = to_u8(out_alpha);
}

fn to_u8(value: u32) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

/// Mask of `selection` over `window`: white inside the selection, black elsewhere.
#[must_use]
pub fn selection_mask(selection: Rect, window: Rect) -> GrayImage {
    GrayImage::from_fn(window.width(), window.height(), |x, y| {
        if selection.contains(window.left + x, window.top + y) {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Editing host holding a [`Document`] in memory.
#[derive(Debug)]
pub struct RasterHost {
    document: Mutex<Document>,
    padding: u32,
}

impl RasterHost {
    /// Host over `document`, padding exported selections by `padding` pixels.
    #[must_use]
    pub const fn new(document: Document, padding: u32) -> Self {
        Self {
            document: Mutex::new(document),
            padding,
        }
    }

    /// Open the image at `path` as a single-layer document.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Image`] when the file cannot be decoded.
    pub fn open(path: &Path, padding: u32) -> HostResult<Self> {
        let pixels = image::open(path)
            .map_err(|source| HostError::Image {
                operation: "document.open",
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        Ok(Self::new(Document::new(pixels), padding))
    }

    /// Select `rect` in the document.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::InvalidRect`] when nothing of `rect` lies on the canvas.
    pub fn select(&self, rect: Rect) -> HostResult<()> {
        self.lock().select(rect)
    }

    /// Copy of the current document.
    #[must_use]
    pub fn snapshot(&self) -> Document {
        self.lock().clone()
    }

    /// Write the flattened document to `path` as PNG.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Image`] when encoding or writing fails.
    pub fn save_flattened(&self, path: &Path) -> HostResult<()> {
        let flattened = self.lock().flatten();
        flattened
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| HostError::Image {
                operation: "document.save",
                path: path.to_path_buf(),
                source,
            })
    }

    fn lock(&self) -> MutexGuard<'_, Document> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn export_window(
    document: &Document,
    padding: u32,
    artifacts: &ArtifactSet,
) -> HostResult<Offset> {
    let selection = document.selection().ok_or(HostError::NoSelection)?;
    let window = selection.padded(padding, document.width(), document.height());
    let offset = window.origin();

    write_offset_record(&artifacts.result_offset(), offset)?;
    save_png(
        &selection_mask(selection, window),
        artifacts.mask_path(),
        "mask.save",
    )?;
    save_png(&document.crop(window), artifacts.image_path(), "image.save")?;

    debug!(
        left = window.left,
        top = window.top,
        right = window.right,
        bottom = window.bottom,
        "exported selection window"
    );
    Ok(offset)
}

fn save_png<P>(
    image: &image::ImageBuffer<P, Vec<P::Subpixel>>,
    path: &Path,
    operation: &'static str,
) -> HostResult<()>
where
    P: image::PixelWithColorType,
    [P::Subpixel]: image::EncodableLayout,
{
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|source| HostError::Image {
            operation,
            path: path.to_path_buf(),
            source,
        })
}

fn load_result(png: &Path, record: &Path) -> HostResult<(RgbaImage, Offset)> {
    let content = std::fs::read_to_string(record)
        .map_err(|source| missing_or_io("offset.read", record, source))?;
    let offset = parse_offset_record(record, &content)?;
    let pixels = image::open(png)
        .map_err(|source| HostError::Image {
            operation: "result.open",
            path: png.to_path_buf(),
            source,
        })?
        .to_rgba8();
    Ok((pixels, offset))
}

fn layer_name(artifacts: &ArtifactSet) -> String {
    format!("Generative Fill {}", artifacts.timestamp())
}

#[async_trait]
impl EditingHost for RasterHost {
    async fn has_selection(&self) -> HostResult<bool> {
        Ok(self.lock().selection().is_some())
    }

    async fn export_selection(&self, artifacts: &ArtifactSet) -> HostResult<Offset> {
        let document = self.snapshot();
        let padding = self.padding;
        let artifacts = artifacts.clone();
        tokio::task::spawn_blocking(move || export_window(&document, padding, &artifacts))
            .await
            .map_err(|source| HostError::Task { source })?
    }

    async fn place_result(&self, artifacts: &ArtifactSet) -> HostResult<()> {
        let png: PathBuf = artifacts.result_png();
        let record = artifacts.result_offset();
        let (pixels, offset) = tokio::task::spawn_blocking(move || load_result(&png, &record))
            .await
            .map_err(|source| HostError::Task { source })??;

        let index = {
            let mut document = self.lock();
            let index = document.place_layer(layer_name(artifacts), pixels);
            let placed = document.layers()[index].origin;
            document.translate_layer(
                index,
                offset.x.saturating_sub(placed.x),
                offset.y.saturating_sub(placed.y),
            );
            index
        };
        info!(layer = index, x = offset.x, y = offset.y, "placed fill result");
        Ok(())
    }

    async fn delete_artifact(&self, path: &Path) -> HostResult<()> {
        remove_if_exists(path).await
    }

    async fn start_server(&self, launch: &LaunchSpec) -> HostResult<()> {
        spawn_detached(launch).map(|_| ())
    }
}
