//! Unit conversion utilities
//!
//! Everything is stored in millimetres; the CLI can display and accept
//! values in inches instead.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Measurement system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementSystem {
    /// Metric system (mm)
    #[default]
    Metric,
    /// Imperial system (inches)
    Imperial,
}

impl MeasurementSystem {
    pub fn from_imperial_flag(imperial: bool) -> Self {
        if imperial {
            Self::Imperial
        } else {
            Self::Metric
        }
    }

    /// Millimetres per display unit.
    pub fn factor(&self) -> f64 {
        match self {
            Self::Metric => 1.0,
            Self::Imperial => MM_PER_INCH,
        }
    }

    pub fn unit_label(&self) -> &'static str {
        match self {
            Self::Metric => "mm",
            Self::Imperial => "in",
        }
    }

    /// Converts a value entered in this system to millimetres.
    pub fn to_mm(&self, value: f64) -> f64 {
        value * self.factor()
    }

    /// Converts millimetres to this system.
    pub fn from_mm(&self, value_mm: f64) -> f64 {
        value_mm / self.factor()
    }

    /// Formats a millimetre length for display, e.g. `210.00mm` or `8.27in`.
    pub fn format_length(&self, value_mm: f64) -> String {
        format!("{:.2}{}", self.from_mm(value_mm), self.unit_label())
    }

    /// Formats a `width x height` pair for display.
    pub fn format_size(&self, width_mm: f64, height_mm: f64) -> String {
        format!(
            "{} x {}",
            self.format_length(width_mm),
            self.format_length(height_mm)
        )
    }
}

impl fmt::Display for MeasurementSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric => write!(f, "Metric"),
            Self::Imperial => write!(f, "Imperial"),
        }
    }
}

impl FromStr for MeasurementSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metric" | "mm" => Ok(Self::Metric),
            "imperial" | "inch" | "in" => Ok(Self::Imperial),
            _ => Err(format!("Unknown measurement system: {}", s)),
        }
    }
}
