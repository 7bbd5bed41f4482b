use super::{Point, Polyline, Segment};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
///
/// An empty box (no points) has inverted infinite bounds and reports zero
/// width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// A box anchored at the origin with the given size.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn empty() -> Self {
        Self::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        )
    }

    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Self {
        points.into_iter().fold(Self::empty(), |mut bb, p| {
            bb.include(p);
            bb
        })
    }

    pub fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_x.min(other.min_x),
            self.min_y.min(other.min_y),
            self.max_x.max(other.max_x),
            self.max_y.max(other.max_y),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_x - self.min_x
        }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            self.max_y - self.min_y
        }
    }

    pub fn min(&self) -> Point {
        Point::new(self.min_x, self.min_y)
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }
        let a = self.min().scaled(sx, sy);
        let b = Point::new(self.max_x, self.max_y).scaled(sx, sy);
        BoundingBox::from_points([a, b])
    }

    pub fn translated(&self, dx: f64, dy: f64) -> BoundingBox {
        if self.is_empty() {
            return *self;
        }
        BoundingBox::new(
            self.min_x + dx,
            self.min_y + dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// True when this box lies within `[0, area.width] x [0, area.height]`,
    /// allowing `tolerance` of slack on every side.
    pub fn fits_within(&self, area: &Area, tolerance: f64) -> bool {
        self.is_empty()
            || (self.min_x >= -tolerance
                && self.min_y >= -tolerance
                && self.max_x <= area.width + tolerance
                && self.max_y <= area.height + tolerance)
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// The plotter's addressable area in millimetres, anchored at the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub width: f64,
    pub height: f64,
}

impl Area {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Raw segments for one layer, as handed over by a geometry source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayerSegments {
    pub name: String,
    pub segments: Vec<Segment>,
}

impl LayerSegments {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            segments: Vec::new(),
        }
    }
}

/// Output of a geometry source: attribute-tagged segments plus the page size.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SourceGeometry {
    /// Layers in first-seen order of their attribute value.
    pub layers: Vec<LayerSegments>,
    /// Page width in mm.
    pub width: f64,
    /// Page height in mm.
    pub height: f64,
}

impl SourceGeometry {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            layers: Vec::new(),
            width,
            height,
        }
    }

    /// Adds a segment to the named layer, creating the layer on first use.
    pub fn push_segment(&mut self, layer: &str, segment: Segment) {
        match self.layers.iter_mut().find(|l| l.name == layer) {
            Some(existing) => existing.segments.push(segment),
            None => {
                let mut new_layer = LayerSegments::new(layer);
                new_layer.segments.push(segment);
                self.layers.push(new_layer);
            }
        }
    }

    /// Adds every segment of a point chain to the named layer.
    pub fn push_chain(&mut self, layer: &str, points: &[Point]) {
        for w in points.windows(2) {
            self.push_segment(layer, Segment::new(w[0], w[1]));
        }
    }

    /// The page frame `(0, 0) - (width, height)`.
    pub fn page(&self) -> BoundingBox {
        BoundingBox::from_size(self.width, self.height)
    }

    pub fn segment_count(&self) -> usize {
        self.layers.iter().map(|l| l.segments.len()).sum()
    }
}

/// A named group of polylines sharing a drawing attribute (e.g. pen colour).
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub polylines: Vec<Polyline>,
}

impl Layer {
    pub fn new(name: impl Into<String>, polylines: Vec<Polyline>) -> Self {
        Self {
            name: name.into(),
            polylines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.polylines.is_empty()
    }

    /// Total pen-down length.
    pub fn draw_length(&self) -> f64 {
        self.polylines.iter().map(Polyline::length).sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.polylines
            .iter()
            .fold(BoundingBox::empty(), |bb, pl| bb.union(&pl.bounding_box()))
    }

    fn map_points(&self, f: impl Fn(&Point) -> Point) -> Layer {
        Layer {
            name: self.name.clone(),
            polylines: self.polylines.iter().map(|pl| pl.map_points(&f)).collect(),
        }
    }
}

/// The full drawing: ordered layers plus the bounding box of all geometry.
///
/// Each pipeline stage produces a new `Drawing` instead of mutating its input.
/// An optional reference frame (the page) travels with the geometry through
/// scaling and translation.
#[derive(Debug, Clone, PartialEq)]
pub struct Drawing {
    layers: Vec<Layer>,
    bounds: BoundingBox,
    frame: Option<BoundingBox>,
}

impl Drawing {
    pub fn new(layers: Vec<Layer>) -> Self {
        let bounds = layers
            .iter()
            .fold(BoundingBox::empty(), |bb, l| bb.union(&l.bounding_box()));
        Self {
            layers,
            bounds,
            frame: None,
        }
    }

    /// Attaches a reference frame (usually the page the geometry was drawn on).
    pub fn with_frame(mut self, frame: BoundingBox) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn into_layers(self) -> Vec<Layer> {
        self.layers
    }

    /// Bounding box of all contained geometry.
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounds
    }

    /// Width and height of the geometry's bounding box.
    pub fn size(&self) -> (f64, f64) {
        (self.bounds.width(), self.bounds.height())
    }

    pub fn frame(&self) -> Option<BoundingBox> {
        self.frame
    }

    /// The frame if one is attached, otherwise the geometry bounds.
    pub fn reference_box(&self) -> BoundingBox {
        self.frame.unwrap_or(self.bounds)
    }

    pub fn polyline_count(&self) -> usize {
        self.layers.iter().map(|l| l.polylines.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Layer::is_empty)
    }

    /// Uniform scale about the origin.
    pub fn scaled(&self, factor: f64) -> Drawing {
        self.scaled_xy(factor, factor)
    }

    /// Independent X/Y scale about the origin.
    pub fn scaled_xy(&self, sx: f64, sy: f64) -> Drawing {
        let layers = self
            .layers
            .iter()
            .map(|l| l.map_points(|p| p.scaled(sx, sy)))
            .collect();
        Drawing {
            layers,
            bounds: self.bounds.scaled(sx, sy),
            frame: self.frame.map(|f| f.scaled(sx, sy)),
        }
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Drawing {
        let layers = self
            .layers
            .iter()
            .map(|l| l.map_points(|p| p.translated(dx, dy)))
            .collect();
        Drawing {
            layers,
            bounds: self.bounds.translated(dx, dy),
            frame: self.frame.map(|f| f.translated(dx, dy)),
        }
    }
}
