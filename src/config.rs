//! Engine configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::{ConfigError, Result};
use crate::math::SURFACE_TOLERANCE;

/// Settings for one build.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Largest parameter difference at which two surfaces are the same.
    pub tolerance: f64,
    /// First number handed out by cell range allocation.
    pub first_cell: u32,
    /// First number handed out by surface interning.
    pub first_surface: u32,
    /// Column at which deck cards are continued on the next line.
    pub line_width: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: SURFACE_TOLERANCE,
            first_cell: 1,
            first_surface: 1,
            line_width: 80,
        }
    }
}

impl EngineConfig {
    /// Parses a configuration from TOML. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this structure.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::Parse(e).into())
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&text)
    }
}
