//! Command-line interface definition

use clap::{Args, Parser, Subcommand, ValueEnum};
use penplot_camtools::{CalibrationPattern, LayoutPolicy, DEFAULT_OUTPUT_PATTERN};
use penplot_core::MeasurementSystem;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "penplot")]
#[command(about = "Generate pen plotter G-code from line artwork")]
#[command(version = crate::LONG_VERSION)]
pub struct Cli {
    /// Settings file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read and show lengths in inches
    #[arg(long, global = true)]
    pub imperial: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn units(&self) -> MeasurementSystem {
        MeasurementSystem::from_imperial_flag(self.imperial)
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the paper library
    List,

    /// Show plotter area, profile and optimizer settings
    General,

    /// Check which papers suit a drawing and whether a size fits the plotter
    Check {
        /// SVG file to inspect
        input: PathBuf,

        #[command(flatten)]
        size: SizeArgs,
    },

    /// Convert an SVG file into one G-code program per layer
    Process {
        /// SVG file to convert
        input: PathBuf,

        #[command(flatten)]
        size: SizeArgs,

        /// Output directory (defaults to a folder named after the input, next to it)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output file name pattern; `{name}` is the input name, `{layer}` the layer
        #[arg(long, default_value = DEFAULT_OUTPUT_PATTERN)]
        pattern: String,

        /// Placement inside the plotter area
        #[arg(long, value_enum, default_value = "centered")]
        layout: LayoutArg,

        /// Maximum 2-opt passes per layer
        #[arg(long)]
        passes: Option<usize>,

        /// Concurrent layer tasks
        #[arg(long)]
        workers: Option<usize>,

        /// Endpoint matching tolerance in mm
        #[arg(long)]
        tolerance: Option<f64>,
    },

    /// Manage the paper library
    Paper {
        #[command(subcommand)]
        action: PaperCommand,
    },

    /// Plot the corners or outline of a paper size
    Boundary {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Draw the full rectangle instead of corner marks
        #[arg(long)]
        outline: bool,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Plot a calibration pattern on a paper size
    Calibrate {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Pattern to draw
        #[arg(long, value_enum, default_value = "spiral")]
        pattern: PatternArg,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum PaperCommand {
    /// Add a paper size
    Add {
        name: String,
        width: f64,
        height: f64,
    },

    /// Change the width and/or height of a paper size
    Edit {
        name: String,

        #[arg(long)]
        width: Option<f64>,

        #[arg(long)]
        height: Option<f64>,
    },

    /// Remove a paper size
    Remove { name: String },
}

/// Requested output size: a library paper or explicit dimensions.
#[derive(Args, Debug, Clone, Default)]
pub struct SizeArgs {
    /// Fit the drawing to a paper from the library
    #[arg(long, conflicts_with_all = ["width", "height"])]
    pub paper: Option<String>,

    /// Target width (height follows the aspect ratio unless given)
    #[arg(long)]
    pub width: Option<f64>,

    /// Target height (width follows the aspect ratio unless given)
    #[arg(long)]
    pub height: Option<f64>,
}

/// Sheet for boundary and calibration output: a library paper or a custom size.
#[derive(Args, Debug, Clone, Default)]
pub struct SheetArgs {
    /// Paper name from the library
    #[arg(
        required_unless_present_all = ["width", "height"],
        conflicts_with_all = ["width", "height"]
    )]
    pub paper: Option<String>,

    /// Custom sheet width
    #[arg(long, requires = "height")]
    pub width: Option<f64>,

    /// Custom sheet height
    #[arg(long, requires = "width")]
    pub height: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutArg {
    /// Center the page in the plotter area
    Centered,
    /// Put the page's corner at the machine origin
    Origin,
}

impl From<LayoutArg> for LayoutPolicy {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Centered => LayoutPolicy::Centered,
            LayoutArg::Origin => LayoutPolicy::Origin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternArg {
    /// Nested rectangles
    Spiral,
    /// Horizontal and vertical lines
    Grid,
}

impl From<PatternArg> for CalibrationPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Spiral => CalibrationPattern::Spiral,
            PatternArg::Grid => CalibrationPattern::Grid,
        }
    }
}
