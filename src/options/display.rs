use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Presentation surface and drawable-resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Display", inline)]
#[serde(default)]
pub struct DisplayOptions {
    /// Upper bound on the device pixel ratio used for the drawable size.
    #[schemars(title = "Max Pixel Ratio", range(min = 0.5, max = 4.0), extend("step" = 0.25))]
    pub max_pixel_ratio: f64,
    /// Background clear color (linear RGB).
    #[schemars(skip)]
    pub clear_color: [f32; 3],
    /// MSAA sample count for the scene pass (1 disables anti-aliasing).
    #[schemars(title = "MSAA Samples", range(min = 1, max = 4))]
    pub msaa_samples: u32,
    /// Log a smoothed FPS figure every this many frames (0 = never).
    #[schemars(skip)]
    pub fps_log_interval: u32,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            max_pixel_ratio: 2.0,
            // 0xcccccc decoded from sRGB; the gamma pass re-encodes it
            clear_color: [0.603_827_3; 3],
            msaa_samples: 4,
            fps_log_interval: 600,
        }
    }
}

impl DisplayOptions {
    /// Sample count restricted to values every wgpu backend supports.
    #[must_use]
    pub fn effective_msaa_samples(&self) -> u32 {
        if self.msaa_samples >= 4 {
            4
        } else {
            1
        }
    }
}
