//! # penplot CAM Tools
//!
//! The path-ordering and G-code generation engine.
//!
//! ## Stages
//!
//! - **Segment Merger**: joins touching segments into polylines
//! - **Layout Transformer**: scales and centers a drawing in the plotter area
//! - **Tour Optimizer**: nearest-neighbor construction plus 2-opt improvement
//! - **G-code Emitter**: pen-up/pen-down motion programs with fixed feed rates
//! - **Pipeline Coordinator**: runs the stages per layer on a bounded worker pool
//!
//! ## Geometry sources
//!
//! - **SVG import**: straight-line geometry grouped by stroke colour
//! - **Patterns**: paper boundary marks and calibration patterns

pub mod cancel;
pub mod gcode_gen;
pub mod layout;
pub mod merger;
pub mod optimizer;
pub mod patterns;
pub mod pipeline;
pub mod svg_import;

pub use cancel::CancellationFlag;
pub use gcode_gen::{format_coord, GcodeEmitter};
pub use layout::{LayoutPolicy, LayoutTransformer, TargetSize};
pub use merger::{merge_layer, merge_polylines, merge_segments, merge_source};
pub use optimizer::{travel_distance, OptimizerOptions, Tour, TourOptimizer, TourStep};
pub use patterns::{
    boundary_file_name, boundary_geometry, calibration_file_name, calibration_geometry,
    BoundaryStyle, CalibrationPattern,
};
pub use pipeline::{
    default_workers, resolve_output_paths, sanitize_layer_name, LayerReport, OutputSpec, Pipeline,
    PipelineOptions, PipelineReport, DEFAULT_OUTPUT_PATTERN,
};
pub use svg_import::{load_svg, parse_svg};
