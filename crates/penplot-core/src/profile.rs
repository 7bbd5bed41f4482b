//! Plotter profile: pen heights, feed rates and axis orientation.

use crate::geometry::Area;
use serde::{Deserialize, Serialize};

/// Motion parameters for one plotter, constant across a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotterProfile {
    /// Addressable area (mm)
    pub area: Area,
    /// Z height with the pen lifted (mm)
    pub z_up: f64,
    /// Z height with the pen on paper (mm)
    pub z_down: f64,
    /// Feed rate while drawing (mm/min)
    pub feed_rate_draw: f64,
    /// Feed rate for pen-up travel (mm/min)
    pub feed_rate_travel: f64,
    /// Feed rate for Z moves (mm/min)
    pub feed_rate_z: f64,
    /// Emit Y as `area.height - y`
    pub invert_y: bool,
}

impl PlotterProfile {
    pub const DEFAULT_Z_UP: f64 = 20.0;
    pub const DEFAULT_Z_DOWN: f64 = 0.0;
    pub const DEFAULT_FEED_RATE_DRAW: f64 = 3000.0;
    pub const DEFAULT_FEED_RATE_TRAVEL: f64 = 6000.0;
    pub const DEFAULT_FEED_RATE_Z: f64 = 1500.0;

    /// Profile with default motion parameters for the given area.
    pub fn with_area(area: Area) -> Self {
        Self {
            area,
            z_up: Self::DEFAULT_Z_UP,
            z_down: Self::DEFAULT_Z_DOWN,
            feed_rate_draw: Self::DEFAULT_FEED_RATE_DRAW,
            feed_rate_travel: Self::DEFAULT_FEED_RATE_TRAVEL,
            feed_rate_z: Self::DEFAULT_FEED_RATE_Z,
            invert_y: false,
        }
    }
}

impl Default for PlotterProfile {
    fn default() -> Self {
        Self::with_area(Area::new(385.0, 460.0))
    }
}
