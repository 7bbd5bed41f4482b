//! Settings file location and lifecycle

use crate::config::Config;
use penplot_core::{ConfigError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "penplot";
const SETTINGS_FILE: &str = "settings.toml";

/// Resolves where the settings document lives and loads/saves it.
///
/// The default location is `<platform config dir>/penplot/settings.toml`;
/// an explicit path (from `--config`) overrides it.
#[derive(Debug, Clone)]
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    /// Manager for the default settings location.
    pub fn new() -> Result<Self> {
        Ok(Self {
            path: Self::config_file_path()?,
        })
    }

    /// Manager for an explicit settings path, falling back to the default.
    pub fn with_override(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self {
                path: path.to_path_buf(),
            }),
            None => Self::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<platform config dir>/penplot`
    pub fn config_directory() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| ConfigError::NoConfigDirectory.into())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_directory()?.join(SETTINGS_FILE))
    }

    /// Loads the settings document, or the defaults when none exists yet.
    ///
    /// A present but invalid document is an error, never silently replaced.
    pub fn load_or_default(&self) -> Result<Config> {
        if self.path.exists() {
            Config::load_from_file(&self.path)
        } else {
            tracing::debug!(
                "No settings file at {}, using defaults",
                self.path.display()
            );
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        config.save_to_file(&self.path)
    }
}
