//! Geometry model shared by every pipeline stage.
//!
//! All coordinates are millimetres. Values are immutable in spirit: stage
//! operations such as [`Drawing::scaled`] return a new value instead of
//! mutating the input.

mod drawing;
mod point;
mod polyline;

pub use drawing::{Area, BoundingBox, Drawing, Layer, LayerSegments, SourceGeometry};
pub use point::{distance, Point};
pub use polyline::{Polyline, Segment};

/// Default tolerance ε (mm) under which two points are considered the same.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;
