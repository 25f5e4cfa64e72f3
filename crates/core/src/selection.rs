//! Rectangular region selection over displayed content.
//!
//! The controller is a small state machine:
//! `Idle` -> `Dragging` (pointer down on the content) -> `Finalized`
//! (pointer up) -> `Idle` (reselect, cancel or confirm).
//!
//! Rectangles are stored in container-relative coordinates. While dragging
//! the moving corner is clamped to the displayed content, so a selection can
//! never extend past the visible image even when the pointer does.

use crate::config::DEFAULT_MIN_SELECTION;
use crate::error::{AppError, Result};
use crate::geometry::{ContentFrame, CoordinateMapper};
use eframe::egui::{Pos2, Rect};

/// Two corners of a selection, in drag order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub start: Pos2,
    pub end: Pos2,
}

impl Selection {
    /// A zero-sized selection anchored at `pos`.
    pub fn at(pos: Pos2) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    /// Normalizes the selection to a rectangle with non-negative size.
    ///
    /// Users can drag in any direction, so `end` may be above or left of
    /// `start`.
    pub fn normalized(&self) -> Rect {
        Rect::from_two_pos(self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectionState {
    #[default]
    Idle,
    Dragging(Selection),
    /// Tracking ended; the rectangle is frozen until reset or confirmed.
    Finalized(Selection),
}

/// Result of feeding a pointer event to the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionEvent {
    /// User started a new selection drag.
    Started,
    /// User is actively dragging.
    Dragging,
    /// User released the pointer; the selection is finalized.
    Completed,
    /// The selection was discarded.
    Cleared,
    /// The event did not apply in the current state.
    None,
}

/// Owns the in-progress or finalized selection rectangle.
#[derive(Debug, Clone)]
pub struct SelectionController {
    state: SelectionState,
    min_extent: f32,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SELECTION)
    }
}

impl SelectionController {
    /// Creates an idle controller.
    ///
    /// # Arguments
    /// * `min_extent` - Smallest displayed width and height a selection may
    ///   have and still be confirmed. Zero-sized selections are always
    ///   rejected.
    pub fn new(min_extent: f32) -> Self {
        Self {
            state: SelectionState::Idle,
            min_extent,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Whether a drag is currently being tracked.
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SelectionState::Dragging(_))
    }

    /// The current selection, normalized, for rendering.
    pub fn selection(&self) -> Option<Rect> {
        match &self.state {
            SelectionState::Idle => None,
            SelectionState::Dragging(s) | SelectionState::Finalized(s) => Some(s.normalized()),
        }
    }

    /// Starts a selection if the pointer lands on the displayed content and
    /// nothing is selected yet.
    ///
    /// # Arguments
    /// * `client` - Pointer position in screen coordinates
    /// * `container` - On-screen rectangle of the hosting container
    /// * `frame` - Where the content is currently displayed
    pub fn pointer_down(
        &mut self,
        client: Pos2,
        container: Rect,
        frame: &ContentFrame,
    ) -> SelectionEvent {
        if !matches!(self.state, SelectionState::Idle) {
            return SelectionEvent::None;
        }
        if !frame.is_laid_out() {
            log::debug!("ignoring pointer down: {}", AppError::GeometryUndefined);
            return SelectionEvent::None;
        }

        let pos = CoordinateMapper::to_container(client, container);
        if !frame.contains(pos) {
            return SelectionEvent::None;
        }

        self.state = SelectionState::Dragging(Selection::at(pos));
        SelectionEvent::Started
    }

    /// Moves the free corner, clamped to the displayed content.
    pub fn pointer_move(
        &mut self,
        client: Pos2,
        container: Rect,
        frame: &ContentFrame,
    ) -> SelectionEvent {
        let SelectionState::Dragging(selection) = &mut self.state else {
            return SelectionEvent::None;
        };
        if !frame.is_laid_out() {
            return SelectionEvent::None;
        }

        let pos = CoordinateMapper::to_container(client, container);
        selection.end = frame.clamp(pos);
        SelectionEvent::Dragging
    }

    /// Ends tracking. The rectangle keeps its last value.
    pub fn pointer_up(&mut self) -> SelectionEvent {
        match self.state {
            SelectionState::Dragging(selection) => {
                self.state = SelectionState::Finalized(selection);
                SelectionEvent::Completed
            }
            _ => SelectionEvent::None,
        }
    }

    /// Discards any selection ("reselect" or "cancel").
    pub fn reset(&mut self) -> SelectionEvent {
        match std::mem::take(&mut self.state) {
            SelectionState::Idle => SelectionEvent::None,
            _ => SelectionEvent::Cleared,
        }
    }

    /// Consumes the finalized selection.
    ///
    /// On success and on [`AppError::SelectionTooSmall`] the controller is
    /// back to idle afterwards.
    ///
    /// # Errors
    ///
    /// - [`AppError::SelectionNotFinalized`] if nothing is finalized; state
    ///   is left untouched.
    /// - [`AppError::SelectionTooSmall`] if the rectangle is degenerate.
    pub fn confirm(&mut self) -> Result<Rect> {
        let SelectionState::Finalized(selection) = self.state else {
            return Err(AppError::SelectionNotFinalized);
        };
        self.state = SelectionState::Idle;

        let rect = selection.normalized();
        if !is_confirmable(rect, self.min_extent) {
            return Err(AppError::SelectionTooSmall);
        }
        Ok(rect)
    }
}

/// Whether a normalized rectangle is big enough to extract.
pub fn is_confirmable(rect: Rect, min_extent: f32) -> bool {
    let (w, h) = (rect.width(), rect.height());
    w > 0.0 && h > 0.0 && w >= min_extent && h >= min_extent
}
