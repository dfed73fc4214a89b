//! Tunables for the crop interaction controller.
//!
//! All values have sensible defaults; hosts usually only override the
//! zoom limits to match their viewer.

use serde::{Deserialize, Serialize};

use crate::error::CropError;

/// Interaction tuning parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Distance from the viewport boundary (logical px) at which edge-push starts
    pub edge_threshold_px: f64,
    /// Maximum fraction the view shrinks by in one edge-push update
    pub edge_max_shrink: f64,
    /// Pan gain at the lowest pressure
    pub edge_pan_gain_min: f64,
    /// Pan gain at full pressure
    pub edge_pan_gain_max: f64,
    /// Exponential damping factor for view auto-scaling (0 to 1)
    pub view_damping: f64,
    /// Smallest allowed view zoom (device px per image px)
    pub min_view_zoom: f64,
    /// Largest allowed view zoom (device px per image px)
    pub max_view_zoom: f64,
    /// Minimum normalized crop width and height
    pub min_crop_size: f64,
    /// Scale tolerance under which a candidate counts as fitting
    pub fit_epsilon: f64,
    /// Texture safety margin used by UV validation
    pub uv_padding_pixels: u32,
    /// Iteration cap for the binary scale search
    pub search_max_iterations: u32,
    /// Interval width at which the binary scale search stops early
    pub search_tolerance: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            edge_threshold_px: 48.0,
            edge_max_shrink: 0.05,
            edge_pan_gain_min: 0.75,
            edge_pan_gain_max: 1.0,
            view_damping: 0.3,
            min_view_zoom: 0.02,
            max_view_zoom: 40.0,
            min_crop_size: 0.01,
            fit_epsilon: 1e-4,
            uv_padding_pixels: 3,
            search_max_iterations: 10,
            search_tolerance: 0.001,
        }
    }
}

impl InteractionConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that every value is usable by the controller.
    pub fn validate(&self) -> Result<(), CropError> {
        let invalid = |msg: &str| {
            log::warn!("rejecting interaction config: {}", msg);
            Err(CropError::InvalidConfig(msg.to_string()))
        };

        if !(self.edge_threshold_px.is_finite() && self.edge_threshold_px > 0.0) {
            return invalid("edge_threshold_px must be positive");
        }
        if !(0.0..1.0).contains(&self.edge_max_shrink) {
            return invalid("edge_max_shrink must be in [0, 1)");
        }
        if !(self.edge_pan_gain_min >= 0.0 && self.edge_pan_gain_min <= self.edge_pan_gain_max) {
            return invalid("edge pan gains must satisfy 0 <= min <= max");
        }
        if !(self.view_damping > 0.0 && self.view_damping <= 1.0) {
            return invalid("view_damping must be in (0, 1]");
        }
        if !(self.min_view_zoom > 0.0 && self.min_view_zoom <= self.max_view_zoom) {
            return invalid("view zoom limits must satisfy 0 < min <= max");
        }
        if !(self.min_crop_size > 0.0 && self.min_crop_size < 1.0) {
            return invalid("min_crop_size must be in (0, 1)");
        }
        if !(self.fit_epsilon >= 0.0 && self.fit_epsilon.is_finite()) {
            return invalid("fit_epsilon must be a finite non-negative value");
        }
        if self.search_max_iterations == 0 {
            return invalid("search_max_iterations must be at least 1");
        }
        if !(self.search_tolerance > 0.0 && self.search_tolerance < 1.0) {
            return invalid("search_tolerance must be in (0, 1)");
        }
        Ok(())
    }
}
