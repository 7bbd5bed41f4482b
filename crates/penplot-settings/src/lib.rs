//! penplot Settings Crate
//!
//! Handles the settings document: plotter area and profile, optimizer
//! parameters and the user-editable paper library.

pub mod config;
pub mod manager;
pub mod paper;

pub use config::{Config, GeneralSettings, OptimizerSettings};
pub use manager::SettingsManager;
pub use paper::{PaperLibrary, PaperSize, ASPECT_RATIO_TOLERANCE};
