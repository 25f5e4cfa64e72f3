//! Environment-driven configuration.
//!
//! Values come from process environment variables, with a `.env` file in
//! the working directory loaded first when present.

use crate::error::{AppError, Result};
use crate::graph::DragPolicy;
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Delay before the simulated analysis report becomes available.
pub const DEFAULT_ANALYSIS_DELAY: Duration = Duration::from_millis(3000);

/// Visual radius of the focal node (half of its 96px diameter).
pub const DEFAULT_FOCAL_RADIUS: f32 = 48.0;

/// Minimum displayed extent, on both axes, of a confirmable selection.
pub const DEFAULT_MIN_SELECTION: f32 = 1.0;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub analysis_delay: Duration,
    pub drag_policy: DragPolicy,
    pub min_selection_extent: f32,
    pub focal_radius: f32,
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file if it exists, ignore if it doesn't
        let _ = dotenv();

        let mut builder = Self::builder();

        if let Some(ms) = read_var::<u64>("CHARTGRAPH_ANALYSIS_DELAY_MS")? {
            builder = builder.with_analysis_delay(Duration::from_millis(ms));
        }
        if let Some(policy) = read_var::<DragPolicy>("CHARTGRAPH_DRAG_POLICY")? {
            builder = builder.with_drag_policy(policy);
        }
        if let Some(extent) = read_var::<f32>("CHARTGRAPH_MIN_SELECTION")? {
            builder = builder.with_min_selection_extent(extent);
        }
        if let Some(radius) = read_var::<f32>("CHARTGRAPH_FOCAL_RADIUS")? {
            builder = builder.with_focal_radius(radius);
        }

        builder.build()
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis_delay: DEFAULT_ANALYSIS_DELAY,
            drag_policy: DragPolicy::default(),
            min_selection_extent: DEFAULT_MIN_SELECTION,
            focal_radius: DEFAULT_FOCAL_RADIUS,
        }
    }
}

/// Builder for programmatic overrides of [`Config`].
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn with_analysis_delay(mut self, delay: Duration) -> Self {
        self.config.analysis_delay = delay;
        self
    }

    pub fn with_drag_policy(mut self, policy: DragPolicy) -> Self {
        self.config.drag_policy = policy;
        self
    }

    pub fn with_min_selection_extent(mut self, extent: f32) -> Self {
        self.config.min_selection_extent = extent;
        self
    }

    pub fn with_focal_radius(mut self, radius: f32) -> Self {
        self.config.focal_radius = radius;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    /// Returns [`AppError::Config`] for negative or non-finite extents.
    pub fn build(self) -> Result<Config> {
        let c = self.config;
        if !c.min_selection_extent.is_finite() || c.min_selection_extent < 0.0 {
            return Err(AppError::config(format!(
                "minimum selection extent must be a non-negative number, got {}",
                c.min_selection_extent
            )));
        }
        if !c.focal_radius.is_finite() || c.focal_radius < 0.0 {
            return Err(AppError::config(format!(
                "focal radius must be a non-negative number, got {}",
                c.focal_radius
            )));
        }
        Ok(c)
    }
}

fn read_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::config(format!("{name} has an invalid value: {raw:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::builder()
            .with_analysis_delay(Duration::ZERO)
            .with_drag_policy(DragPolicy::ClampToCanvas)
            .build()
            .unwrap();

        assert_eq!(config.analysis_delay, Duration::ZERO);
        assert_eq!(config.drag_policy, DragPolicy::ClampToCanvas);
        assert_eq!(config.focal_radius, DEFAULT_FOCAL_RADIUS);
    }

    #[test]
    fn negative_extent_is_rejected() {
        let err = Config::builder()
            .with_min_selection_extent(-2.0)
            .build()
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
