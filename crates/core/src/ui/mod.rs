//! Interactive viewer for a chart.
//!
//! # Architecture
//!
//! - [`app`]: the eframe application; routes input to the shell and paints it
//! - [`settings`]: user preferences and persistence
//! - [`rendering`]: drawing helpers for the crop overlay and the graph
//!
//! All state transitions live in [`crate::shell::CanvasShell`]; this module
//! only draws what the shell exposes.

mod app;
mod rendering;
mod settings;

pub use app::ChartGraphApp;
pub use rendering::calculate_popup_position;
pub use settings::{DEFAULT_OVERLAY_ALPHA, Settings};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::source::ChartSource;
use eframe::egui;

/// Opens a window showing `source` and blocks until it is closed.
///
/// # Errors
///
/// Returns [`AppError::SourceNotReady`] when the source has no pixels, or
/// [`AppError::Ui`] if the window cannot be created.
pub fn run(source: ChartSource, config: Config) -> Result<()> {
    let [width, height] = source.natural_size().ok_or(AppError::SourceNotReady)?;
    let title = format!("Chart Graph - {}", source.name());

    // Start no larger than a phone-sized viewport; the chart letterboxes.
    let inner = egui::vec2(width as f32, height as f32).min(egui::vec2(430.0, 932.0));
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size(inner.max(egui::vec2(320.0, 320.0))),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(ChartGraphApp::new(source, &config)) as Box<dyn eframe::App>)),
    )
    .map_err(|e| AppError::ui(format!("Failed to run UI: {}", e)))
}
