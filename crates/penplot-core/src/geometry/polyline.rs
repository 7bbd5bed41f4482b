use super::{BoundingBox, Point};
use serde::{Deserialize, Serialize};

/// A straight line segment.
///
/// Directionless when matching endpoints, directional once placed in a tour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub const fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }

    /// True when both endpoints coincide within `tolerance`.
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        self.start.approx_eq(&self.end, tolerance)
    }

    pub fn reversed(&self) -> Segment {
        Segment::new(self.end, self.start)
    }
}

/// An ordered sequence of at least two points.
///
/// Consecutive points are distinct beyond the tolerance the polyline was
/// built with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<Point>,
}

impl Polyline {
    /// Creates a polyline from points, dropping consecutive duplicates
    /// within `tolerance`. Returns `None` if fewer than two distinct points
    /// remain.
    pub fn from_points(points: impl IntoIterator<Item = Point>, tolerance: f64) -> Option<Self> {
        let mut deduped: Vec<Point> = Vec::new();
        for p in points {
            match deduped.last() {
                Some(last) if last.approx_eq(&p, tolerance) => {}
                _ => deduped.push(p),
            }
        }
        if deduped.len() < 2 {
            return None;
        }
        Some(Self { points: deduped })
    }

    /// Creates a polyline from points that are already known to be valid.
    pub fn new(points: Vec<Point>) -> Self {
        debug_assert!(points.len() >= 2, "polyline needs at least two points");
        Self { points }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    /// True when the polyline ends where it starts.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        self.start().approx_eq(&self.end(), tolerance)
    }

    /// Drawn length (sum of the segment lengths).
    pub fn length(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| w[0].distance_to(&w[1]))
            .sum()
    }

    pub fn reversed(&self) -> Polyline {
        let mut points = self.points.clone();
        points.reverse();
        Polyline { points }
    }

    /// Consecutive segments of this polyline.
    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.points.windows(2).map(|w| Segment::new(w[0], w[1]))
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.points.iter().copied())
    }

    pub(crate) fn map_points(&self, f: impl Fn(&Point) -> Point) -> Polyline {
        Polyline {
            points: self.points.iter().map(f).collect(),
        }
    }
}
