//! User preferences persisted between sessions.
//!
//! Only view preferences are stored. Graph nodes and captures are
//! session-scoped and never written to disk.

use crate::config::Config;
use crate::error::Result;
use crate::graph::DragPolicy;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default darkness of the area outside a selection (0-255).
pub const DEFAULT_OVERLAY_ALPHA: u8 = 150;

/// Preferences stored as JSON in the user's config directory
/// (e.g., `~/.config/chartgraph/settings.json` on Linux).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether dragged nodes stay inside the canvas.
    pub drag_policy: DragPolicy,
    /// Darkness of the dimmed area around a selection.
    #[serde(default = "default_overlay_alpha")]
    pub overlay_alpha: u8,
    /// Draw relationship labels on edges.
    #[serde(default = "default_true")]
    pub show_edge_labels: bool,
}

fn default_overlay_alpha() -> u8 {
    DEFAULT_OVERLAY_ALPHA
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Returns the path to the settings file.
    ///
    /// Creates the config directory if it doesn't exist.
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "chartgraph", "chartgraph").map(|dirs| {
            let config_dir = dirs.config_dir();
            if !config_dir.exists() {
                let _ = fs::create_dir_all(config_dir);
            }
            config_dir.join("settings.json")
        })
    }

    /// Loads settings from disk, falling back to values derived from
    /// `config` if none are stored or the file is unreadable.
    pub fn load(config: &Config) -> Self {
        Self::config_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_else(|| Self::with_defaults(config))
    }

    pub fn with_defaults(config: &Config) -> Self {
        Self {
            drag_policy: config.drag_policy,
            overlay_alpha: DEFAULT_OVERLAY_ALPHA,
            show_edge_labels: true,
        }
    }

    /// Persists settings to disk.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = Self::config_path() {
            let json = serde_json::to_string_pretty(self)?;
            fs::write(path, json)?;
        }
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::with_defaults(&Config::default())
    }
}
