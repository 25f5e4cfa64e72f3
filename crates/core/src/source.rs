//! The chart content a selection is made over.
//!
//! A chart comes either from an image file or from a capture of a whole
//! monitor. It is decoded to RGBA once, up front, so extraction is a plain
//! row copy.

use crate::error::{AppError, Result};
use image::{DynamicImage, RgbaImage};
use screenshots::Screen;
use std::path::Path;

/// Decoded (or not yet decoded) chart content.
pub struct ChartSource {
    name: String,
    image: Option<RgbaImage>,
}

impl ChartSource {
    /// A source whose pixels have not arrived yet.
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: None,
        }
    }

    pub fn from_image(name: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            name: name.into(),
            image: Some(image.to_rgba8()),
        }
    }

    /// Decodes an image file.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if the file cannot be read or
    /// decoded.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .map_err(|e| AppError::image(format!("Failed to open {}: {}", path.display(), e)))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::from_image(name, image))
    }

    /// Captures a monitor by its zero-based index.
    ///
    /// # Errors
    ///
    /// - [`AppError::ScreenNotFound`] if the index is out of bounds
    /// - [`AppError::ScreenCapture`] if enumeration or capture fails
    pub fn from_screen(index: usize) -> Result<Self> {
        let screens = all_screens()?;
        let screen = screens.get(index).ok_or(AppError::ScreenNotFound(index))?;

        let captured = screen
            .capture()
            .map_err(|e| AppError::capture(format!("Failed to capture screen: {}", e)))?;

        // screenshots links its own `image` version; go through raw RGBA.
        let (width, height) = (captured.width(), captured.height());
        let pixels = RgbaImage::from_raw(width, height, captured.into_raw())
            .ok_or_else(|| AppError::capture("Failed to create image buffer"))?;

        Ok(Self {
            name: format!("monitor-{index}"),
            image: Some(pixels),
        })
    }

    /// Lists monitors with their dimensions and scale factor.
    pub fn list_screens() -> Result<Vec<String>> {
        Ok(all_screens()?
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "Monitor {}: {}x{} (scale: {})",
                    i, s.display_info.width, s.display_info.height, s.display_info.scale_factor
                )
            })
            .collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ready(&self) -> bool {
        self.image().is_ok()
    }

    /// The decoded pixels.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::SourceNotReady`] if nothing has been decoded or
    /// the decoded image is empty.
    pub fn image(&self) -> Result<&RgbaImage> {
        match &self.image {
            Some(image) if image.width() > 0 && image.height() > 0 => Ok(image),
            _ => Err(AppError::SourceNotReady),
        }
    }

    pub fn natural_size(&self) -> Option<[u32; 2]> {
        self.image().ok().map(|i| [i.width(), i.height()])
    }
}

fn all_screens() -> Result<Vec<Screen>> {
    let screens = Screen::all()
        .map_err(|e| AppError::capture(format!("Failed to enumerate screens: {}", e)))?;
    if screens.is_empty() {
        return Err(AppError::capture("No screens detected"));
    }
    Ok(screens)
}
