//! Interaction tuning.

use serde::{Deserialize, Serialize};

/// Thresholds and defaults used by hit-testing and the gesture state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Size of a freshly drawn shape.
    pub default_size: f64,
    /// Floor applied to every size derived from a drag.
    pub min_size: f64,
    /// Half-width of the band around the radius that starts a resize.
    pub edge_band: f64,
    /// Grab radius around a line endpoint.
    pub endpoint_radius: f64,
    /// Slack allowed when testing whether a point lies on a line.
    pub line_tolerance: f64,
    /// Area tolerance for the triangle containment test.
    pub triangle_tolerance: f64,
    /// Horizontal offset of the synthetic end point of a new line.
    pub line_length: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            default_size: 50.0,
            min_size: 10.0,
            edge_band: 10.0,
            endpoint_radius: 10.0,
            line_tolerance: 5.0,
            triangle_tolerance: 0.1,
            line_length: 100.0,
        }
    }
}

impl InteractionConfig {
    pub fn with_default_size(mut self, size: f64) -> Self {
        self.default_size = size;
        self
    }

    pub fn with_min_size(mut self, size: f64) -> Self {
        self.min_size = size;
        self
    }

    /// Widen or narrow the line grab tolerance.
    pub fn with_line_tolerance(mut self, tolerance: f64) -> Self {
        self.line_tolerance = tolerance;
        self
    }

    pub fn with_endpoint_radius(mut self, radius: f64) -> Self {
        self.endpoint_radius = radius;
        self
    }

    pub fn with_edge_band(mut self, band: f64) -> Self {
        self.edge_band = band;
        self
    }

    /// Clamp a drag-derived size to the configured floor.
    pub fn clamp_size(&self, size: f64) -> f64 {
        size.max(self.min_size)
    }
}
