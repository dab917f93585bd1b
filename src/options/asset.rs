use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Scene asset to load at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Asset", inline)]
#[serde(default)]
pub struct AssetOptions {
    /// Path (native) or URL (web) of a `.glb`/`.gltf` file. Empty means no
    /// asset; the scene then only holds lights.
    #[schemars(skip)]
    pub source: String,
    /// Uniform scale applied to the loaded subtree.
    #[schemars(title = "Scale", range(min = 0.01, max = 10.0), extend("step" = 0.01))]
    pub scale: f32,
}

impl Default for AssetOptions {
    fn default() -> Self {
        Self {
            source: "room.glb".to_owned(),
            scale: 2.0,
        }
    }
}
