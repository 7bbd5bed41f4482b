//! Boundary and calibration pattern generators
//!
//! Both build geometry on a paper-sized page so it can go through the
//! regular pipeline and be centered in the plotter area like any artwork.

use penplot_core::{Point, SourceGeometry};
use std::fmt;
use std::str::FromStr;

/// Length of each arm of a corner mark (mm)
pub const CORNER_MARK_LENGTH: f64 = 10.0;
/// Distance between the paper edge and the calibration pattern (mm)
pub const CALIBRATION_MARGIN: f64 = 10.0;
/// Spacing between calibration lines (mm)
pub const CALIBRATION_STEP: f64 = 5.0;

pub const BOUNDARY_LAYER: &str = "boundary";
pub const CALIBRATION_LAYER: &str = "calibration";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryStyle {
    /// Four L-shaped marks at the paper corners
    #[default]
    CornerMarks,
    /// The full paper rectangle
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CalibrationPattern {
    /// Nested rectangles stepping inwards
    #[default]
    Spiral,
    /// Evenly spaced horizontal and vertical lines
    Grid,
}

impl fmt::Display for CalibrationPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spiral => write!(f, "spiral"),
            Self::Grid => write!(f, "grid"),
        }
    }
}

impl FromStr for CalibrationPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "spiral" => Ok(Self::Spiral),
            "grid" => Ok(Self::Grid),
            _ => Err(format!("Unknown calibration pattern: {}", s)),
        }
    }
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> [Point; 5] {
    [
        Point::new(x, y),
        Point::new(x + w, y),
        Point::new(x + w, y + h),
        Point::new(x, y + h),
        Point::new(x, y),
    ]
}

/// Boundary marks for a `width x height` sheet.
pub fn boundary_geometry(width: f64, height: f64, style: BoundaryStyle) -> SourceGeometry {
    let mut source = SourceGeometry::new(width, height);
    match style {
        BoundaryStyle::Outline => {
            source.push_chain(BOUNDARY_LAYER, &rect(0.0, 0.0, width, height));
        }
        BoundaryStyle::CornerMarks => {
            let arm = CORNER_MARK_LENGTH.min(width.min(height) / 2.0);
            let corners = [
                (0.0, 0.0, 1.0, 1.0),
                (width, 0.0, -1.0, 1.0),
                (width, height, -1.0, -1.0),
                (0.0, height, 1.0, -1.0),
            ];
            for (cx, cy, dx, dy) in corners {
                source.push_chain(
                    BOUNDARY_LAYER,
                    &[
                        Point::new(cx + dx * arm, cy),
                        Point::new(cx, cy),
                        Point::new(cx, cy + dy * arm),
                    ],
                );
            }
        }
    }
    source
}

/// Calibration pattern covering a `width x height` sheet inside the margin.
///
/// A sheet too small for the margin yields an empty pattern.
pub fn calibration_geometry(
    width: f64,
    height: f64,
    pattern: CalibrationPattern,
) -> SourceGeometry {
    let mut source = SourceGeometry::new(width, height);
    let inner_w = width - 2.0 * CALIBRATION_MARGIN;
    let inner_h = height - 2.0 * CALIBRATION_MARGIN;
    if inner_w <= 0.0 || inner_h <= 0.0 {
        tracing::warn!(
            "Paper {}mm x {}mm leaves no room inside the {}mm margin",
            width,
            height,
            CALIBRATION_MARGIN
        );
        return source;
    }

    match pattern {
        CalibrationPattern::Spiral => {
            let loops = (inner_w.min(inner_h) / (2.0 * CALIBRATION_STEP)).floor() as usize;
            for i in 0..loops.max(1) {
                let inset = i as f64 * CALIBRATION_STEP;
                let w = inner_w - 2.0 * inset;
                let h = inner_h - 2.0 * inset;
                if w <= 0.0 || h <= 0.0 {
                    break;
                }
                source.push_chain(
                    CALIBRATION_LAYER,
                    &rect(CALIBRATION_MARGIN + inset, CALIBRATION_MARGIN + inset, w, h),
                );
            }
        }
        CalibrationPattern::Grid => {
            let (x0, y0) = (CALIBRATION_MARGIN, CALIBRATION_MARGIN);
            let (x1, y1) = (width - CALIBRATION_MARGIN, height - CALIBRATION_MARGIN);
            let columns = (inner_w / CALIBRATION_STEP).floor() as usize;
            for i in 0..=columns {
                let x = x0 + i as f64 * CALIBRATION_STEP;
                source.push_chain(CALIBRATION_LAYER, &[Point::new(x, y0), Point::new(x, y1)]);
            }
            let rows = (inner_h / CALIBRATION_STEP).floor() as usize;
            for j in 0..=rows {
                let y = y0 + j as f64 * CALIBRATION_STEP;
                source.push_chain(CALIBRATION_LAYER, &[Point::new(x0, y), Point::new(x1, y)]);
            }
        }
    }
    source
}

pub fn boundary_file_name(width: f64, height: f64) -> String {
    format!("boundary_{}x{}.gcode", width, height)
}

pub fn calibration_file_name(pattern: CalibrationPattern, width: f64, height: f64) -> String {
    format!("calibration_{}_{}x{}.gcode", pattern, width, height)
}
