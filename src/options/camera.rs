use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Camera", inline)]
#[serde(default)]
/// Camera projection and orbit-control parameters.
pub struct CameraOptions {
    /// Vertical field of view in degrees.
    #[schemars(title = "Field of View", range(min = 20.0, max = 120.0), extend("step" = 1.0))]
    pub fovy: f32,
    /// Near clipping plane distance.
    #[schemars(skip)]
    pub znear: f32,
    /// Far clipping plane distance.
    #[schemars(skip)]
    pub zfar: f32,
    /// Initial eye position in world space.
    #[schemars(skip)]
    pub position: [f32; 3],
    /// Orbit pivot (look-at target) in world space.
    #[schemars(skip)]
    pub target: [f32; 3],
    /// Carry rotation/pan momentum across frames.
    #[schemars(title = "Damping")]
    pub enable_damping: bool,
    /// Fraction of the pending motion applied (and removed) per frame when
    /// damping is on.
    #[schemars(title = "Damping Factor", range(min = 0.01, max = 1.0), extend("step" = 0.01))]
    pub damping_factor: f32,
    /// Rotation sensitivity multiplier.
    #[schemars(title = "Rotate Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub rotate_speed: f32,
    /// Pan sensitivity multiplier.
    #[schemars(title = "Pan Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub pan_speed: f32,
    /// Zoom sensitivity multiplier.
    #[schemars(title = "Zoom Speed", range(min = 0.1, max = 2.0), extend("step" = 0.05))]
    pub zoom_speed: f32,
    /// Closest allowed eye-to-target distance.
    #[schemars(skip)]
    pub min_distance: f32,
    /// Farthest allowed eye-to-target distance.
    #[schemars(skip)]
    pub max_distance: f32,
}

impl Default for CameraOptions {
    fn default() -> Self {
        Self {
            fovy: 70.0,
            znear: 0.01,
            zfar: 1000.0,
            position: [97.352_41, 42.930_256, 17.705_496],
            target: [-13.491_064, 41.495_094, 15.395_572],
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: 1000.0,
        }
    }
}
