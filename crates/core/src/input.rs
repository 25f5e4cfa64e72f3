//! Pointer input and layout queries supplied by the host surface.

use crate::geometry::ContentFrame;
use eframe::egui::{Pos2, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    /// The pointer left the trackable surface.
    Leave,
}

/// A pointer event in absolute screen coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerKind,
    pub pos: Pos2,
    /// Id of the node under the pointer, if the host hit-tested one.
    pub target: Option<String>,
}

impl PointerEvent {
    pub fn down(pos: Pos2) -> Self {
        Self {
            kind: PointerKind::Down,
            pos,
            target: None,
        }
    }

    pub fn down_on(target: impl Into<String>, pos: Pos2) -> Self {
        Self {
            kind: PointerKind::Down,
            pos,
            target: Some(target.into()),
        }
    }

    pub fn moved(pos: Pos2) -> Self {
        Self {
            kind: PointerKind::Move,
            pos,
            target: None,
        }
    }

    pub fn up(pos: Pos2) -> Self {
        Self {
            kind: PointerKind::Up,
            pos,
            target: None,
        }
    }

    pub fn leave(pos: Pos2) -> Self {
        Self {
            kind: PointerKind::Leave,
            pos,
            target: None,
        }
    }
}

/// Bounding boxes the host layout reports for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HostLayout {
    /// On-screen rectangle of the container receiving pointer events.
    pub container: Rect,
    /// On-screen rectangle of the displayed chart image, if one is shown.
    pub content: Option<Rect>,
    /// Native pixel size of the displayed chart image.
    pub natural_size: [u32; 2],
}

impl HostLayout {
    /// Layout for a surface without displayed content (the graph canvas).
    pub fn canvas(container: Rect) -> Self {
        Self {
            container,
            content: None,
            natural_size: [0, 0],
        }
    }

    /// Content frame for the displayed chart, relative to the container.
    pub fn frame(&self) -> Option<ContentFrame> {
        self.content
            .map(|content| ContentFrame::from_layout(self.container, content, self.natural_size))
    }
}
