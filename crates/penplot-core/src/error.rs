//! Error handling for penplot
//!
//! Provides the error types for every layer of the tool:
//! - Input errors (malformed or missing geometry source)
//! - Configuration errors (settings file, paper library)
//! - Dimension errors (laid-out drawing exceeds the plotter area)
//! - Processing errors (merge/optimize/emit/output failures)
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::fmt;
use thiserror::Error;

/// Input error type
///
/// Represents problems with the geometry source handed to the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// Input file does not exist
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that could not be found.
        path: String,
    },

    /// Input file format is not supported
    #[error("Unsupported input format: {reason}")]
    UnsupportedFormat {
        /// Why the format was rejected.
        reason: String,
    },

    /// Input could not be parsed
    #[error("Malformed input: {reason}")]
    Malformed {
        /// What was wrong with the input.
        reason: String,
    },

    /// Document dimensions are missing or unusable
    #[error("Invalid document dimensions: {reason}")]
    InvalidDimensions {
        /// What was wrong with the dimensions.
        reason: String,
    },

    /// Input could not be read
    #[error("Failed to read {path}: {reason}")]
    Unreadable {
        /// The path that failed to read.
        path: String,
        /// The underlying reason.
        reason: String,
    },
}

/// Configuration error type
///
/// Represents problems with the settings file, plotter profile or paper library.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Settings document could not be parsed (includes unknown keys)
    #[error("Invalid settings file {path}: {reason}")]
    Parse {
        /// The settings file path.
        path: String,
        /// The parser's message.
        reason: String,
    },

    /// A setting has an invalid value
    #[error("Invalid setting '{key}': {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// Settings file extension is not recognised
    #[error("Unsupported settings format: {0}")]
    UnsupportedFormat(String),

    /// Paper size not present in the library
    #[error("Paper size not found: {name}")]
    PaperNotFound {
        /// The requested paper name.
        name: String,
    },

    /// Paper size name already used
    #[error("Paper size already exists: {name}")]
    DuplicatePaper {
        /// The duplicated paper name.
        name: String,
    },

    /// Settings could not be read or written
    #[error("Settings I/O error on {path}: {reason}")]
    Io {
        /// The settings file path.
        path: String,
        /// The underlying reason.
        reason: String,
    },

    /// No location could be determined for the settings file
    #[error("No configuration directory available on this platform")]
    NoConfigDirectory,
}

/// Raised when a drawing does not fit inside the plotter's addressable area.
///
/// Carries both the allowed and the actual extents so callers can tell the
/// operator exactly how far off the request is.
#[derive(Error, Debug, Clone, PartialEq)]
#[error(
    "Dimensions exceed the plotter area: allowed {allowed_width:.2}mm x {allowed_height:.2}mm, \
     actual {actual_width:.2}mm x {actual_height:.2}mm"
)]
pub struct DimensionExceededError {
    /// Area width in mm.
    pub allowed_width: f64,
    /// Area height in mm.
    pub allowed_height: f64,
    /// Requested/laid-out width in mm.
    pub actual_width: f64,
    /// Requested/laid-out height in mm.
    pub actual_height: f64,
}

/// Processing error type
///
/// Internal pipeline failures. These indicate bugs or aborted runs rather than
/// bad user input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    /// A layer task failed or panicked
    #[error("Layer '{layer}' failed: {reason}")]
    LayerFailed {
        /// The layer name.
        layer: String,
        /// The failure reason.
        reason: String,
    },

    /// An output artifact could not be written
    #[error("Failed to write {path}: {reason}")]
    Output {
        /// The output path.
        path: String,
        /// The underlying reason.
        reason: String,
    },

    /// The run was cancelled
    #[error("Processing cancelled")]
    Cancelled,
}

/// Pipeline stage, used to report where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the geometry source
    Input,
    /// Segment merging
    Merge,
    /// Scaling and positioning
    Layout,
    /// Tour optimization
    Optimize,
    /// G-code emission
    Emit,
    /// Writing output artifacts
    Output,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Merge => write!(f, "merge"),
            Self::Layout => write!(f, "layout"),
            Self::Optimize => write!(f, "optimize"),
            Self::Emit => write!(f, "emit"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Main error type for penplot
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Input error
    #[error(transparent)]
    Input(#[from] InputError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Dimension error
    #[error(transparent)]
    DimensionExceeded(#[from] DimensionExceededError),

    /// Processing error
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// A pipeline stage failed
    #[error("{stage} stage failed: {source}")]
    Stage {
        /// The stage that failed.
        stage: Stage,
        /// The stage's error.
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Wrap this error with the pipeline stage it came from.
    ///
    /// Already-tagged errors keep their original stage.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Strip stage tags and return the underlying error.
    pub fn root(&self) -> &Error {
        match self {
            Error::Stage { source, .. } => source.root(),
            other => other,
        }
    }

    /// The stage this error was raised in, if tagged
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// The dimension error, if this is one
    pub fn as_dimension_error(&self) -> Option<&DimensionExceededError> {
        match self.root() {
            Error::DimensionExceeded(e) => Some(e),
            _ => None,
        }
    }

    /// Check if this is a dimension error
    pub fn is_dimension_error(&self) -> bool {
        self.as_dimension_error().is_some()
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self.root(), Error::Config(_))
    }

    /// Check if this is an input error
    pub fn is_input_error(&self) -> bool {
        matches!(self.root(), Error::Input(_))
    }

    /// Check if this run was cancelled
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Error::Processing(ProcessingError::Cancelled))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
