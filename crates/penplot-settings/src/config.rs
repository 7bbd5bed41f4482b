//! Configuration and settings management for penplot
//!
//! Provides settings file handling and validation. Supports JSON and TOML
//! documents; the format is chosen by file extension.
//!
//! The document is organized into sections:
//! - `[general]`: plotter area, pen heights, feed rates, Y inversion
//! - `[optimizer]`: merge tolerance, 2-opt pass cap, worker count
//! - `[[papers]]`: the paper library
//!
//! Unknown keys anywhere in the document are rejected at load time.

use crate::paper::PaperLibrary;
use penplot_core::{Area, ConfigError, PlotterProfile, Result, DEFAULT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

fn default_z_up() -> f64 {
    PlotterProfile::DEFAULT_Z_UP
}

fn default_z_down() -> f64 {
    PlotterProfile::DEFAULT_Z_DOWN
}

fn default_feed_rate_draw() -> f64 {
    PlotterProfile::DEFAULT_FEED_RATE_DRAW
}

fn default_feed_rate_travel() -> f64 {
    PlotterProfile::DEFAULT_FEED_RATE_TRAVEL
}

fn default_feed_rate_z() -> f64 {
    PlotterProfile::DEFAULT_FEED_RATE_Z
}

/// Plotter area and motion settings
///
/// The area is required whenever the section is present; every other field
/// falls back to its documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralSettings {
    /// Maximum addressable width (mm)
    pub area_width: f64,
    /// Maximum addressable height (mm)
    pub area_height: f64,
    /// Pen-up Z height (mm)
    #[serde(default = "default_z_up")]
    pub z_up: f64,
    /// Pen-down Z height (mm)
    #[serde(default = "default_z_down")]
    pub z_down: f64,
    /// Drawing feed rate (mm/min)
    #[serde(default = "default_feed_rate_draw")]
    pub feed_rate_draw: f64,
    /// Travel feed rate (mm/min)
    #[serde(default = "default_feed_rate_travel")]
    pub feed_rate_travel: f64,
    /// Z-axis feed rate (mm/min)
    #[serde(default = "default_feed_rate_z")]
    pub feed_rate_z: f64,
    /// Whether machine Y runs opposite to drawing Y
    #[serde(default)]
    pub invert_y: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        let profile = PlotterProfile::default();
        Self {
            area_width: profile.area.width,
            area_height: profile.area.height,
            z_up: profile.z_up,
            z_down: profile.z_down,
            feed_rate_draw: profile.feed_rate_draw,
            feed_rate_travel: profile.feed_rate_travel,
            feed_rate_z: profile.feed_rate_z,
            invert_y: profile.invert_y,
        }
    }
}

impl GeneralSettings {
    pub fn area(&self) -> Area {
        Area::new(self.area_width, self.area_height)
    }

    pub fn profile(&self) -> PlotterProfile {
        PlotterProfile {
            area: self.area(),
            z_up: self.z_up,
            z_down: self.z_down,
            feed_rate_draw: self.feed_rate_draw,
            feed_rate_travel: self.feed_rate_travel,
            feed_rate_z: self.feed_rate_z,
            invert_y: self.invert_y,
        }
    }
}

/// Path optimization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerSettings {
    /// Endpoint matching tolerance ε (mm)
    pub tolerance: f64,
    /// Maximum number of 2-opt passes per layer
    pub two_opt_passes: usize,
    /// Optional wall-clock budget for 2-opt per layer (ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_budget_ms: Option<u64>,
    /// Worker count; defaults to the number of available processing units
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            two_opt_passes: 2000,
            time_budget_ms: None,
            workers: None,
        }
    }
}

impl OptimizerSettings {
    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget_ms.map(Duration::from_millis)
    }
}

/// Complete settings document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Plotter area and motion settings
    #[serde(default)]
    pub general: GeneralSettings,
    /// Optimizer settings
    #[serde(default)]
    pub optimizer: OptimizerSettings,
    /// Paper library
    #[serde(default)]
    pub papers: PaperLibrary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            optimizer: OptimizerSettings::default(),
            papers: PaperLibrary::stock(),
        }
    }
}

enum Format {
    Json,
    Toml,
}

fn format_for(path: &Path) -> Result<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        _ => Err(ConfigError::UnsupportedFormat(format!(
            "{} (settings file must be .json or .toml)",
            path.display()
        ))
        .into()),
    }
}

fn invalid(key: &str, reason: &str) -> penplot_core::Error {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

fn positive(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(key, &format!("must be a positive number (got {})", value)))
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a settings document; `path` selects the format and names the
    /// source in error messages.
    pub fn from_str_for(path: &Path, content: &str) -> Result<Self> {
        let parse_err = |reason: String| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        };
        let config: Self = match format_for(path)? {
            Format::Json => {
                serde_json::from_str(content).map_err(|e| parse_err(e.to_string()))?
            }
            Format::Toml => toml::from_str(content).map_err(|e| parse_err(e.to_string()))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config = Self::from_str_for(path, &content)?;
        tracing::debug!(
            "Loaded settings from {} ({} papers)",
            path.display(),
            config.papers.len()
        );
        Ok(config)
    }

    /// Save config to file (JSON or TOML), overwriting the whole document
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        self.validate()?;

        let io_err = |reason: String| ConfigError::Io {
            path: path.display().to_string(),
            reason,
        };
        let content = match format_for(path)? {
            Format::Json => serde_json::to_string_pretty(self).map_err(|e| io_err(e.to_string()))?,
            Format::Toml => toml::to_string_pretty(self).map_err(|e| io_err(e.to_string()))?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_err(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| io_err(e.to_string()))?;
        tracing::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let g = &self.general;
        positive("general.area_width", g.area_width)?;
        positive("general.area_height", g.area_height)?;
        positive("general.feed_rate_draw", g.feed_rate_draw)?;
        positive("general.feed_rate_travel", g.feed_rate_travel)?;
        positive("general.feed_rate_z", g.feed_rate_z)?;

        if !g.z_up.is_finite() || !g.z_down.is_finite() {
            return Err(invalid("general.z_up", "pen heights must be finite"));
        }
        if g.z_up == g.z_down {
            return Err(invalid(
                "general.z_up",
                "pen-up and pen-down heights must differ",
            ));
        }

        positive("optimizer.tolerance", self.optimizer.tolerance)?;
        if self.optimizer.workers == Some(0) {
            return Err(invalid("optimizer.workers", "must be at least 1"));
        }

        self.papers.validate()
    }

    pub fn profile(&self) -> PlotterProfile {
        self.general.profile()
    }

    pub fn area(&self) -> Area {
        self.general.area()
    }
}
