//! # penplot Core
//!
//! Core types and utilities for penplot.
//! Provides the geometry model shared by every pipeline stage, the
//! plotter profile consumed by the G-code emitter, unit conversion
//! helpers, and the error taxonomy used across the workspace.

pub mod error;
pub mod geometry;
pub mod profile;
pub mod units;

pub use error::{
    ConfigError, DimensionExceededError, Error, InputError, ProcessingError, Result, Stage,
};

pub use geometry::{
    distance, Area, BoundingBox, Drawing, Layer, LayerSegments, Point, Polyline, Segment,
    SourceGeometry, DEFAULT_TOLERANCE,
};

pub use profile::PlotterProfile;

pub use units::MeasurementSystem;
