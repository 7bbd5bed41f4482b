//! # penplot
//!
//! Turns straight-line vector artwork into pen plotter G-code.
//!
//! ## Architecture
//!
//! penplot is organized as a workspace with multiple crates:
//!
//! 1. **penplot-core** - Geometry model, plotter profile, error taxonomy
//! 2. **penplot-settings** - Settings file and paper library
//! 3. **penplot-camtools** - Merger, tour optimizer, layout, G-code emitter, pipeline
//! 4. **penplot** - The command-line binary that ties the crates together
//!
//! Each layer of the input becomes one G-code program. Touching segments
//! are joined into polylines, the drawing is scaled and centered in the
//! plotter area, and the order and direction of strokes is chosen to keep
//! pen-up travel short.

pub mod cli;
pub mod commands;

pub use penplot_camtools::{Pipeline, PipelineOptions, PipelineReport};
pub use penplot_core::{Error, MeasurementSystem, Result};
pub use penplot_settings::{Config, SettingsManager};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Version line shown by `--version`
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ")"
);

/// Initialize logging
///
/// Sets up structured logging on stderr so stdout only carries command
/// output. `RUST_LOG` takes precedence; otherwise the level is `warn`, or
/// `debug` with `verbose`.
pub fn init_logging(verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_level(true)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Renders an error as a framed panel for the terminal.
///
/// Dimension errors also show the allowed and actual size in `units`.
pub fn error_panel(err: &anyhow::Error, units: MeasurementSystem) -> String {
    let mut lines = Vec::new();
    for cause in err.chain() {
        lines.push(cause.to_string());
        // penplot errors already include their sources in the message
        if cause.downcast_ref::<Error>().is_some() {
            break;
        }
    }

    if let Some(dim) = err
        .downcast_ref::<Error>()
        .and_then(|e| e.as_dimension_error())
    {
        lines.push(format!(
            "Allowed: {}",
            units.format_size(dim.allowed_width, dim.allowed_height)
        ));
        lines.push(format!(
            "Actual:  {}",
            units.format_size(dim.actual_width, dim.actual_height)
        ));
    }

    let width = lines
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .max(6);
    let mut panel = format!("╭─ Error {}╮\n", "─".repeat(width - 6));
    for line in &lines {
        let pad = width - line.chars().count();
        panel.push_str(&format!("│ {}{} │\n", line, " ".repeat(pad)));
    }
    panel.push_str(&format!("╰{}╯\n", "─".repeat(width + 2)));
    panel
}
