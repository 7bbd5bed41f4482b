//! Layout Transformer
//!
//! Scales a drawing to a physical target size and positions it inside the
//! plotter area.
//!
//! Scaling is relative to the drawing's reference frame: the page rectangle
//! when one was carried over from the source, otherwise the bounding box of
//! the ink. After placement the ink itself must lie inside the area, so
//! geometry that spills off the page is still caught.

use penplot_core::{Area, DimensionExceededError, Drawing, InputError, Result};
use std::fmt;

/// Floating-point slack (mm) allowed on the area bounds.
///
/// Independent of the merge tolerance: the area is a hard physical limit.
pub const CONTAINMENT_SLACK: f64 = 1e-9;

/// Requested physical size of the reference frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TargetSize {
    /// Keep source dimensions
    #[default]
    Natural,
    /// Scale uniformly to this width (mm)
    Width(f64),
    /// Scale uniformly to this height (mm)
    Height(f64),
    /// Stretch to exactly this width and height (mm)
    Exact { width: f64, height: f64 },
}

impl TargetSize {
    /// Target from optional width/height inputs.
    pub fn from_dimensions(width: Option<f64>, height: Option<f64>) -> Self {
        match (width, height) {
            (Some(width), Some(height)) => Self::Exact { width, height },
            (Some(width), None) => Self::Width(width),
            (None, Some(height)) => Self::Height(height),
            (None, None) => Self::Natural,
        }
    }

    /// Fails unless every given dimension is positive and finite.
    pub fn validate(&self) -> Result<()> {
        let values = match *self {
            Self::Natural => vec![],
            Self::Width(w) => vec![w],
            Self::Height(h) => vec![h],
            Self::Exact { width, height } => vec![width, height],
        };
        for v in values {
            if !(v.is_finite() && v > 0.0) {
                return Err(InputError::InvalidDimensions {
                    reason: format!("target size must be positive (got {})", v),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Scale factors mapping a `width x height` frame onto this target.
    ///
    /// A zero-extent axis keeps factor 1.
    pub fn scale_factors(&self, width: f64, height: f64) -> (f64, f64) {
        let ratio = |target: f64, source: f64| {
            if source > 0.0 {
                target / source
            } else {
                1.0
            }
        };
        match *self {
            Self::Natural => (1.0, 1.0),
            Self::Width(w) => {
                let s = ratio(w, width);
                (s, s)
            }
            Self::Height(h) => {
                let s = ratio(h, height);
                (s, s)
            }
            Self::Exact { width: w, height: h } => (ratio(w, width), ratio(h, height)),
        }
    }

    /// Size of a `width x height` frame after scaling to this target.
    pub fn resolve(&self, width: f64, height: f64) -> (f64, f64) {
        let (sx, sy) = self.scale_factors(width, height);
        (width * sx, height * sy)
    }
}

/// Where the scaled frame lands inside the area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutPolicy {
    /// Frame centered in the area
    #[default]
    Centered,
    /// Frame's lower-left corner at the area origin
    Origin,
}

impl fmt::Display for LayoutPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Centered => write!(f, "centered"),
            Self::Origin => write!(f, "origin"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutTransformer {
    area: Area,
    policy: LayoutPolicy,
}

impl LayoutTransformer {
    pub fn new(area: Area) -> Self {
        Self {
            area,
            policy: LayoutPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: LayoutPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn area(&self) -> Area {
        self.area
    }

    fn exceeded(&self, width: f64, height: f64) -> DimensionExceededError {
        DimensionExceededError {
            allowed_width: self.area.width,
            allowed_height: self.area.height,
            actual_width: width,
            actual_height: height,
        }
    }

    /// Fails when a `width x height` rectangle cannot fit in the area.
    pub fn check_fits(&self, width: f64, height: f64) -> Result<()> {
        if width > self.area.width + CONTAINMENT_SLACK
            || height > self.area.height + CONTAINMENT_SLACK
        {
            return Err(self.exceeded(width, height).into());
        }
        Ok(())
    }

    /// Scales and positions `drawing`, returning a new drawing.
    pub fn layout(&self, drawing: &Drawing, target: TargetSize) -> Result<Drawing> {
        target.validate()?;

        let frame = drawing.reference_box();
        if frame.is_empty() {
            return Ok(drawing.clone());
        }

        let (sx, sy) = target.scale_factors(frame.width(), frame.height());
        let scaled_width = frame.width() * sx;
        let scaled_height = frame.height() * sy;
        self.check_fits(scaled_width, scaled_height)?;

        let scaled = drawing.scaled_xy(sx, sy);
        let scaled_frame = scaled.reference_box();
        let (dx, dy) = match self.policy {
            LayoutPolicy::Centered => (
                (self.area.width - scaled_frame.width()) / 2.0 - scaled_frame.min_x,
                (self.area.height - scaled_frame.height()) / 2.0 - scaled_frame.min_y,
            ),
            LayoutPolicy::Origin => (-scaled_frame.min_x, -scaled_frame.min_y),
        };
        let placed = scaled.translated(dx, dy);

        let ink = placed.bounding_box();
        if !ink.fits_within(&self.area, CONTAINMENT_SLACK) {
            return Err(self.exceeded(ink.width(), ink.height()).into());
        }

        tracing::info!(
            "Laid out {:.2}mm x {:.2}mm ({}) in {:.2}mm x {:.2}mm area",
            scaled_width,
            scaled_height,
            self.policy,
            self.area.width,
            self.area.height
        );

        Ok(placed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use penplot_core::{BoundingBox, Layer, Point, Polyline};

    fn drawing(points: &[(f64, f64)]) -> Drawing {
        let polyline = Polyline::new(points.iter().map(|&p| Point::from(p)).collect());
        Drawing::new(vec![Layer::new("ink", vec![polyline])])
    }

    #[test]
    fn test_width_only_preserves_aspect() {
        let d = drawing(&[(0.0, 0.0), (100.0, 50.0)]);
        let out = LayoutTransformer::new(Area::new(400.0, 400.0))
            .with_policy(LayoutPolicy::Origin)
            .layout(&d, TargetSize::Width(200.0))
            .unwrap();
        assert_eq!(out.size(), (200.0, 100.0));
        assert_eq!(out.bounding_box().min(), Point::origin());
    }

    #[test]
    fn test_exact_stretches() {
        let d = drawing(&[(0.0, 0.0), (100.0, 50.0)]);
        let out = LayoutTransformer::new(Area::new(400.0, 400.0))
            .layout(
                &d,
                TargetSize::Exact {
                    width: 100.0,
                    height: 100.0,
                },
            )
            .unwrap();
        assert_eq!(out.size(), (100.0, 100.0));
        // centered
        assert_eq!(out.bounding_box().min(), Point::new(150.0, 150.0));
    }

    #[test]
    fn test_page_frame_drives_scaling_and_centering() {
        let d = drawing(&[(10.0, 10.0), (20.0, 20.0)]).with_frame(BoundingBox::from_size(100.0, 100.0));
        let out = LayoutTransformer::new(Area::new(300.0, 300.0))
            .layout(&d, TargetSize::Width(200.0))
            .unwrap();
        assert_eq!(out.frame(), Some(BoundingBox::new(50.0, 50.0, 250.0, 250.0)));
        assert_eq!(out.bounding_box(), BoundingBox::new(70.0, 70.0, 90.0, 90.0));
    }

    #[test]
    fn test_exceeding_area_reports_allowed_and_actual() {
        let d = drawing(&[(0.0, 0.0), (420.0, 297.0)]);
        let err = LayoutTransformer::new(Area::new(385.0, 460.0))
            .layout(&d, TargetSize::Natural)
            .unwrap_err();
        let dim = err.as_dimension_error().unwrap();
        assert_eq!(dim.allowed_width, 385.0);
        assert_eq!(dim.actual_width, 420.0);
        assert_eq!(dim.actual_height, 297.0);
    }

    #[test]
    fn test_no_slack_past_area_edge() {
        let d = drawing(&[(0.0, 0.0), (385.9, 0.0)]);
        let area = Area::new(385.0, 460.0);
        let err = LayoutTransformer::new(area)
            .layout(&d, TargetSize::Natural)
            .unwrap_err();
        assert_eq!(err.as_dimension_error().unwrap().actual_width, 385.9);

        let d = drawing(&[(0.0, 0.0), (385.0, 0.0)]);
        let out = LayoutTransformer::new(area)
            .layout(&d, TargetSize::Natural)
            .unwrap();
        assert!(out.bounding_box().fits_within(&area, 0.0));
    }

    #[test]
    fn test_ink_outside_page_is_rejected() {
        let d = drawing(&[(-500.0, 0.0), (10.0, 10.0)]).with_frame(BoundingBox::from_size(100.0, 100.0));
        let err = LayoutTransformer::new(Area::new(300.0, 300.0))
            .layout(&d, TargetSize::Natural)
            .unwrap_err();
        assert!(err.is_dimension_error());
    }

    #[test]
    fn test_invalid_target() {
        let d = drawing(&[(0.0, 0.0), (1.0, 1.0)]);
        let err = LayoutTransformer::new(Area::new(10.0, 10.0))
            .layout(&d, TargetSize::Width(0.0))
            .unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_zero_height_drawing_scales_by_width() {
        let d = drawing(&[(0.0, 5.0), (10.0, 5.0)]);
        let out = LayoutTransformer::new(Area::new(100.0, 100.0))
            .with_policy(LayoutPolicy::Origin)
            .layout(&d, TargetSize::Exact { width: 50.0, height: 20.0 })
            .unwrap();
        assert_eq!(out.size(), (50.0, 0.0));
    }
}
