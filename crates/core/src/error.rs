//! Error types for the chartgraph-core library.
//!
//! Every interaction failure the capture and graph flows can hit has its own
//! variant, so callers can decide between "reset and try again" and a hard
//! failure without string matching.

use crate::raster::RasterHandle;
use thiserror::Error;

/// Errors that can occur within the chartgraph-core library.
#[derive(Error, Debug)]
pub enum AppError {
    /// A layout box has zero width or height, so no mapping can be derived.
    #[error("Geometry undefined: displayed element has zero area")]
    GeometryUndefined,

    /// Confirm was requested on a rectangle without usable area.
    #[error("Selection is too small to extract, please reselect")]
    SelectionTooSmall,

    /// Confirm was requested while no finalized selection exists.
    #[error("No finalized selection to confirm")]
    SelectionNotFinalized,

    /// The source content has not been loaded or decoded yet.
    #[error("Source content is not ready")]
    SourceNotReady,

    /// The mapped region does not overlap the source content at all.
    #[error("Region {x},{y} {width}x{height} lies outside the source content")]
    RegionOutOfBounds {
        x: i64,
        y: i64,
        width: u32,
        height: u32,
    },

    /// The destination raster buffer could not be allocated.
    #[error("Failed to allocate a {width}x{height} raster")]
    AllocationFailed { width: u32, height: u32 },

    /// A pointer event referenced a node that is no longer on the canvas.
    #[error("Unknown node reference: {0}")]
    UnknownNodeReference(String),

    /// A raster was released while not currently held.
    #[error("Raster {0} released more than once")]
    DoubleRelease(RasterHandle),

    /// The node set violates a graph invariant (focal uniqueness, duplicate ids).
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// Configuration-related errors (invalid values).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Screen capture operation failed.
    #[error("Screen capture failed: {0}")]
    ScreenCapture(String),

    /// Requested screen/monitor index was not found.
    #[error("Screen not found: index {0}")]
    ScreenNotFound(usize),

    /// Image decoding or encoding failed.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// UI-related errors (rendering, window management).
    #[error("UI error: {0}")]
    Ui(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a screen capture error with the given message.
    pub fn capture(msg: impl Into<String>) -> Self {
        Self::ScreenCapture(msg.into())
    }

    /// Creates an image processing error with the given message.
    pub fn image(msg: impl Into<String>) -> Self {
        Self::ImageProcessing(msg.into())
    }

    /// Creates an invalid graph error with the given message.
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::InvalidGraph(msg.into())
    }

    /// Creates a UI error with the given message.
    pub fn ui(msg: impl Into<String>) -> Self {
        Self::Ui(msg.into())
    }

    /// Whether the interaction can continue after resetting to idle.
    ///
    /// Selection, extraction and node-reference failures only cost the user
    /// a retry; environment failures (I/O, display, configuration) do not
    /// go away by resetting state.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::GeometryUndefined
                | Self::SelectionTooSmall
                | Self::SelectionNotFinalized
                | Self::SourceNotReady
                | Self::RegionOutOfBounds { .. }
                | Self::AllocationFailed { .. }
                | Self::UnknownNodeReference(_)
                | Self::DoubleRelease(_)
                | Self::InvalidGraph(_)
        )
    }
}

/// A convenient alias for Result with [`AppError`].
pub type Result<T> = std::result::Result<T, AppError>;
