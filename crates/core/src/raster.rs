//! Region extraction and extracted-raster lifecycle.
//!
//! # Coordinate Mapping
//!
//! A selection is made over the chart as displayed, which is rarely its
//! native size: a 2000px wide capture shown in a 500px column has a scale
//! of 4. The extractor maps the selection into native pixels and copies
//! exactly that region, so a zoomed-out display never degrades the result.
//!
//! # Ownership
//!
//! Extracted rasters live in a [`RasterStore`] and are referred to by
//! [`RasterHandle`]. The [`ExtractedRaster`] returned on creation is the
//! owning token: it is not `Clone`, and giving it back through
//! [`RasterStore::release`] frees the pixels. Consumers that only display
//! the raster (graph nodes) hold the `Copy` handle.

use crate::error::{AppError, Result};
use crate::geometry::ContentFrame;
use crate::source::ChartSource;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use eframe::egui::Rect;
use image::{ImageFormat, RgbaImage};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

const BYTES_PER_PIXEL: usize = 4;

/// Reference to a raster held by a [`RasterStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RasterHandle(u64);

impl fmt::Display for RasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "raster:{}", self.0)
    }
}

/// Owning token for a raster in a [`RasterStore`].
#[derive(Debug, PartialEq, Eq)]
pub struct ExtractedRaster {
    handle: RasterHandle,
    width: u32,
    height: u32,
}

impl ExtractedRaster {
    pub fn handle(&self) -> RasterHandle {
        self.handle
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A rectangle in native content pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Maps selections into content pixels and extracts them.
pub struct RasterExtractor;

impl RasterExtractor {
    /// Computes the native-pixel region covered by a selection.
    ///
    /// A region that sticks out of the source (stale frame, rounding at the
    /// edges) is clamped to the part that overlaps it.
    ///
    /// # Arguments
    ///
    /// * `selection` - Normalized, container-relative selection rectangle
    /// * `frame` - Where the content is displayed right now
    /// * `source_size` - Actual pixel size of the decoded source
    ///
    /// # Errors
    ///
    /// - [`AppError::GeometryUndefined`] if the frame has no displayed area
    /// - [`AppError::SelectionTooSmall`] if the region rounds to zero pixels
    /// - [`AppError::RegionOutOfBounds`] if it does not overlap the source
    pub fn content_region(
        selection: Rect,
        frame: &ContentFrame,
        source_size: [u32; 2],
    ) -> Result<PixelRegion> {
        let rect = frame.to_content_rect(selection)?;

        let x = rect.min.x.round() as i64;
        let y = rect.min.y.round() as i64;
        let width = rect.width().round() as i64;
        let height = rect.height().round() as i64;
        if width <= 0 || height <= 0 {
            return Err(AppError::SelectionTooSmall);
        }

        let [source_w, source_h] = source_size.map(i64::from);
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(source_w);
        let y1 = (y + height).min(source_h);

        if x1 <= x0 || y1 <= y0 {
            return Err(AppError::RegionOutOfBounds {
                x,
                y,
                width: u32::try_from(width).unwrap_or(u32::MAX),
                height: u32::try_from(height).unwrap_or(u32::MAX),
            });
        }
        if (x0, y0, x1, y1) != (x, y, x + width, y + height) {
            log::warn!(
                "clamped extraction region {x},{y} {width}x{height} to source {source_w}x{source_h}"
            );
        }

        Ok(PixelRegion {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }

    /// Extracts the selected region of `source` into a new raster.
    ///
    /// # Errors
    ///
    /// [`AppError::SourceNotReady`] if the source has not been decoded,
    /// otherwise see [`Self::content_region`] and
    /// [`RasterStore::create_from_region`]. No raster is created on error.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let rect = selection.confirm()?;
    /// let raster = RasterExtractor::extract(&mut store, &source, rect, &frame)?;
    /// ```
    pub fn extract(
        store: &mut RasterStore,
        source: &ChartSource,
        selection: Rect,
        frame: &ContentFrame,
    ) -> Result<ExtractedRaster> {
        let image = source.image()?;
        let region = Self::content_region(selection, frame, [image.width(), image.height()])?;
        store.create_from_region(image, region)
    }
}

/// Holds every extracted raster until it is released.
#[derive(Default)]
pub struct RasterStore {
    next_id: u64,
    live: HashMap<RasterHandle, RgbaImage>,
}

impl RasterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies `region` of `source` into a freshly allocated raster.
    ///
    /// # Errors
    ///
    /// - [`AppError::RegionOutOfBounds`] if the region is not fully inside
    ///   `source`
    /// - [`AppError::AllocationFailed`] if the destination buffer cannot be
    ///   reserved
    pub fn create_from_region(
        &mut self,
        source: &RgbaImage,
        region: PixelRegion,
    ) -> Result<ExtractedRaster> {
        let pixels = copy_region(source, region)?;
        Ok(self.insert(pixels))
    }

    /// Takes ownership of an already decoded raster.
    pub fn insert(&mut self, image: RgbaImage) -> ExtractedRaster {
        let handle = RasterHandle(self.next_id);
        self.next_id += 1;

        let raster = ExtractedRaster {
            handle,
            width: image.width(),
            height: image.height(),
        };
        log::debug!("created {handle} ({}x{})", raster.width, raster.height);
        self.live.insert(handle, image);
        raster
    }

    pub fn get(&self, handle: RasterHandle) -> Option<&RgbaImage> {
        self.live.get(&handle)
    }

    pub fn is_held(&self, handle: RasterHandle) -> bool {
        self.live.contains_key(&handle)
    }

    /// Number of rasters not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Releases a raster through its owning token.
    pub fn release(&mut self, raster: ExtractedRaster) -> Result<()> {
        self.release_handle(raster.handle)
    }

    /// Releases a raster by handle.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::DoubleRelease`] if the handle is not currently
    /// held. The store is left unchanged in that case.
    pub fn release_handle(&mut self, handle: RasterHandle) -> Result<()> {
        match self.live.remove(&handle) {
            Some(_) => {
                log::debug!("released {handle}");
                Ok(())
            }
            None => {
                log::warn!("release of {handle} which is not held");
                Err(AppError::DoubleRelease(handle))
            }
        }
    }

    /// Encodes a held raster as a PNG `data:` URI.
    pub fn to_data_uri(&self, handle: RasterHandle) -> Result<String> {
        let image = self.get(handle).ok_or(AppError::SourceNotReady)?;
        Ok(format!("data:image/png;base64,{}", encode_to_base64_png(image)?))
    }

    /// Writes a held raster to disk; the format follows the extension.
    pub fn save(&self, handle: RasterHandle, path: &Path) -> Result<()> {
        let image = self.get(handle).ok_or(AppError::SourceNotReady)?;
        image
            .save(path)
            .map_err(|e| AppError::image(format!("Failed to write {}: {}", path.display(), e)))
    }
}

/// Row-by-row copy of a region into a buffer reserved up front, so that a
/// huge selection surfaces as an error instead of an abort.
fn copy_region(source: &RgbaImage, region: PixelRegion) -> Result<RgbaImage> {
    let PixelRegion {
        x,
        y,
        width,
        height,
    } = region;

    let fits = u64::from(x) + u64::from(width) <= u64::from(source.width())
        && u64::from(y) + u64::from(height) <= u64::from(source.height());
    if !fits {
        return Err(AppError::RegionOutOfBounds {
            x: x.into(),
            y: y.into(),
            width,
            height,
        });
    }

    let alloc_failed = || AppError::AllocationFailed { width, height };
    let row_len = width as usize * BYTES_PER_PIXEL;
    let len = row_len
        .checked_mul(height as usize)
        .ok_or_else(alloc_failed)?;

    let mut buffer: Vec<u8> = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| alloc_failed())?;

    let stride = source.width() as usize * BYTES_PER_PIXEL;
    let raw = source.as_raw();
    for row in y..y + height {
        let start = row as usize * stride + x as usize * BYTES_PER_PIXEL;
        buffer.extend_from_slice(&raw[start..start + row_len]);
    }

    RgbaImage::from_raw(width, height, buffer).ok_or_else(alloc_failed)
}

fn encode_to_base64_png(image: &RgbaImage) -> Result<String> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    image
        .write_to(&mut cursor, ImageFormat::Png)
        .map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

    Ok(BASE64.encode(buffer))
}
