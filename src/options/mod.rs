//! Centralized runtime options with TOML preset support.
//!
//! All tweakable settings (display, camera, lighting, gamma, effect, asset)
//! are consolidated here and serialize to/from TOML.

mod asset;
mod camera;
mod display;
mod lighting;
mod post_processing;

use std::path::Path;

pub use asset::AssetOptions;
pub use camera::CameraOptions;
pub use display::DisplayOptions;
pub use lighting::LightingOptions;
pub use post_processing::{EffectOptions, GammaOptions, TimeLaw};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::OrbitError;

/// Top-level options container. All sub-structs use `#[serde(default)]` so
/// partial TOML files (e.g. only overriding `[effect]`) work correctly.
#[derive(
    Debug, Clone, Serialize, Deserialize, PartialEq, Default, JsonSchema,
)]
#[serde(default)]
pub struct Options {
    /// Surface and drawable-resolution settings.
    pub display: DisplayOptions,
    /// Camera projection and orbit-control parameters.
    pub camera: CameraOptions,
    /// Scene lights.
    pub lighting: LightingOptions,
    /// Gamma-correction pass.
    pub gamma: GammaOptions,
    /// Custom effect pass and its clock.
    pub effect: EffectOptions,
    /// Startup scene asset.
    #[schemars(skip)]
    pub asset: AssetOptions,
}

impl Options {
    /// Generate JSON Schema describing the UI-exposed options.
    #[must_use]
    pub fn json_schema() -> schemars::Schema {
        schemars::schema_for!(Options)
    }

    /// Parse options from a TOML string. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`OrbitError::OptionsParse`] on malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, OrbitError> {
        toml::from_str(content).map_err(|e| OrbitError::OptionsParse(e.to_string()))
    }

    /// Load options from a TOML file. Missing fields use defaults.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Io`] if the file cannot be read,
    /// [`OrbitError::OptionsParse`] on malformed TOML.
    pub fn load(path: &Path) -> Result<Self, OrbitError> {
        let content = std::fs::read_to_string(path).map_err(OrbitError::Io)?;
        Self::from_toml(&content)
    }

    /// Save options to a TOML file (pretty-printed).
    ///
    /// # Errors
    ///
    /// [`OrbitError::OptionsParse`] if serialization fails,
    /// [`OrbitError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), OrbitError> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| OrbitError::OptionsParse(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(OrbitError::Io)?;
        }
        std::fs::write(path, content).map_err(OrbitError::Io)
    }
}
