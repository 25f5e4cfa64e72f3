//! Chart Graph Core Library
//!
//! Crop a region out of a displayed chart, attach a (simulated) analysis
//! to it, and pin it as the focal node of a small draggable knowledge graph.
//!
//! # Overview
//!
//! - **Geometry**: screen to container to natural-pixel mapping via [`geometry`]
//! - **Capture**: rubber-band selection via [`selection`], pixel extraction via [`raster`]
//! - **Graph**: node canvas via [`graph::GraphCanvas`], connectors via [`graph::EdgeRenderer`]
//! - **Shell**: the view state machine tying both flows together, in [`shell`]
//! - **User Interface**: an eframe viewer via [`ui`]
//!
//! # Quick Start
//!
//! ```ignore
//! use chartgraph_core::ChartGraph;
//!
//! let app = ChartGraph::new()?;
//! app.run_interactive(app.open("chart.png".as_ref())?)?;
//! ```
//!
//! Headless use goes through [`shell::CanvasShell`] directly, feeding it
//! [`input::PointerEvent`]s and [`shell::ShellCommand`]s.

pub mod analysis;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod graph;
pub mod input;
pub mod raster;
pub mod selection;
pub mod shell;
pub mod source;
pub mod ui;

// Re-export primary types for convenience
pub use config::Config;
pub use error::{AppError, Result};
pub use geometry::{ContentFrame, CoordinateMapper};
pub use graph::{DragPolicy, EdgeRenderer, GraphCanvas, GraphNode, NodeKind};
pub use raster::{ExtractedRaster, RasterExtractor, RasterHandle, RasterStore};
pub use selection::SelectionController;
pub use shell::{CanvasShell, ShellCommand, ShellEvent, ShellMode};
pub use source::ChartSource;

use std::path::Path;

/// Entry point for the interactive viewer.
///
/// Holds the configuration and opens chart sources for display.
pub struct ChartGraph {
    config: Config,
}

impl ChartGraph {
    /// Creates an instance configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Config`] if a `CHARTGRAPH_*` variable is malformed.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config: Config::load()?,
        })
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Decodes a chart image from disk.
    pub fn open(&self, path: &Path) -> Result<ChartSource> {
        ChartSource::open(path)
    }

    /// Captures a monitor to use as the chart.
    pub fn capture(&self, monitor_index: usize) -> Result<ChartSource> {
        ChartSource::from_screen(monitor_index)
    }

    /// Lists available monitors with their dimensions.
    pub fn list_monitors(&self) -> Result<Vec<String>> {
        ChartSource::list_screens()
    }

    /// Opens the viewer on `source` and blocks until its window closes.
    pub fn run_interactive(&self, source: ChartSource) -> Result<()> {
        ui::run(source, self.config.clone())
    }

    /// A headless shell over `source` with this configuration.
    pub fn shell(&self, source: ChartSource) -> CanvasShell {
        CanvasShell::new(source, &self.config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }
}
