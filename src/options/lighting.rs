use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scene lights seeded into the light registry at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Lighting", inline)]
#[serde(default)]
pub struct LightingOptions {
    /// Ambient light color (linear RGB).
    #[schemars(skip)]
    pub ambient_color: [f32; 3],
    /// Ambient light intensity.
    #[schemars(title = "Ambient", range(min = 0.0, max = 2.0), extend("step" = 0.01))]
    pub ambient_intensity: f32,
    /// Directional light color (linear RGB).
    #[schemars(skip)]
    pub key_color: [f32; 3],
    /// Directional light intensity.
    #[schemars(title = "Key Light", range(min = 0.0, max = 5.0), extend("step" = 0.05))]
    pub key_intensity: f32,
    /// Directional light position; the light shines from here toward the
    /// origin.
    #[schemars(skip)]
    pub key_position: [f32; 3],
}

impl Default for LightingOptions {
    fn default() -> Self {
        Self {
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.3,
            key_color: [1.0, 1.0, 1.0],
            key_intensity: 2.5,
            key_position: [0.5, 0.0, 0.866],
        }
    }
}
