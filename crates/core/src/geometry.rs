//! Coordinate mapping between screen, container and content space.
//!
//! The host reports pointer positions in absolute screen coordinates and
//! layout boxes as on-screen rectangles. Selections are tracked relative to
//! the container that hosts the chart, and extraction happens in the chart's
//! native pixel grid, which may be larger or smaller than what is displayed
//! (HiDPI captures, letterboxed "contain" layout, zoomed-out previews).
//!
//! Nothing here caches: layout may change between two frames, so callers
//! rebuild a [`ContentFrame`] for every query.

use crate::error::{AppError, Result};

pub use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

/// Pure helpers for moving points and rectangles between coordinate spaces.
pub struct CoordinateMapper;

impl CoordinateMapper {
    /// Pointer position relative to the container's top-left corner.
    pub fn to_container(client: Pos2, container: Rect) -> Pos2 {
        (client - container.min).to_pos2()
    }

    /// Pointer position relative to a displayed element's top-left corner.
    pub fn to_element(client: Pos2, element: Rect) -> Pos2 {
        (client - element.min).to_pos2()
    }

    /// Scale factors from displayed space into native content space.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::GeometryUndefined`] if the element has not been
    /// laid out yet (zero or negative displayed size).
    pub fn scale_factors(natural: Vec2, display: Vec2) -> Result<Vec2> {
        if !(display.x > 0.0 && display.y > 0.0) {
            return Err(AppError::GeometryUndefined);
        }
        Ok(vec2(natural.x / display.x, natural.y / display.y))
    }

    /// Maps an element-relative rectangle into native content pixels.
    pub fn to_content_rect(display_rect: Rect, scale: Vec2) -> Rect {
        Rect::from_min_size(
            pos2(display_rect.min.x * scale.x, display_rect.min.y * scale.y),
            vec2(display_rect.width() * scale.x, display_rect.height() * scale.y),
        )
    }
}

/// Where a piece of content is drawn, and how big it really is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContentFrame {
    /// Native pixel width of the content.
    pub natural_width: u32,
    /// Native pixel height of the content.
    pub natural_height: u32,
    /// Displayed rectangle, relative to the hosting container.
    pub bounds: Rect,
}

impl ContentFrame {
    /// Builds a frame from two on-screen boxes reported by the host.
    pub fn from_layout(container: Rect, element: Rect, natural: [u32; 2]) -> Self {
        let min = CoordinateMapper::to_container(element.min, container);
        Self {
            natural_width: natural[0],
            natural_height: natural[1],
            bounds: Rect::from_min_size(min, element.size()),
        }
    }

    /// Frame for content displayed "object-contain" inside a container:
    /// scaled uniformly to fit and centred, leaving bars on one axis.
    pub fn contain(container_size: Vec2, natural: [u32; 2]) -> Self {
        let [w, h] = natural;
        let bounds = if w == 0 || h == 0 || container_size.x <= 0.0 || container_size.y <= 0.0 {
            Rect::from_min_size(Pos2::ZERO, Vec2::ZERO)
        } else {
            let fit = (container_size.x / w as f32).min(container_size.y / h as f32);
            let size = vec2(w as f32 * fit, h as f32 * fit);
            Rect::from_min_size(((container_size - size) / 2.0).to_pos2(), size)
        };
        Self {
            natural_width: w,
            natural_height: h,
            bounds,
        }
    }

    pub fn natural_size(&self) -> Vec2 {
        vec2(self.natural_width as f32, self.natural_height as f32)
    }

    pub fn offset(&self) -> Vec2 {
        self.bounds.min.to_vec2()
    }

    pub fn display_size(&self) -> Vec2 {
        self.bounds.size()
    }

    pub fn is_laid_out(&self) -> bool {
        self.bounds.width() > 0.0 && self.bounds.height() > 0.0
    }

    /// See [`CoordinateMapper::scale_factors`].
    pub fn scale(&self) -> Result<Vec2> {
        CoordinateMapper::scale_factors(self.natural_size(), self.display_size())
    }

    /// Whether a container-relative point lies on the displayed content
    /// (edges included).
    pub fn contains(&self, point: Pos2) -> bool {
        self.bounds.contains(point)
    }

    /// Nearest container-relative point on the displayed content.
    pub fn clamp(&self, point: Pos2) -> Pos2 {
        self.bounds.clamp(point)
    }

    /// Maps a container-relative rectangle into native content pixels.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::GeometryUndefined`] when the frame has no area.
    pub fn to_content_rect(&self, rect: Rect) -> Result<Rect> {
        let scale = self.scale()?;
        let local = rect.translate(-self.offset());
        Ok(CoordinateMapper::to_content_rect(local, scale))
    }
}
