use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// How the effect pass's `time` uniform grows from tick to tick.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum TimeLaw {
    /// The uniform receives the running clock each tick
    /// (`clock += step; uniform += clock`), so it grows quadratically.
    #[default]
    Compounding,
    /// The uniform receives the fixed step each tick
    /// (`uniform += step`), a plain monotonic clock.
    Linear,
}

/// Gamma-correction pass parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Gamma", inline)]
#[serde(default)]
pub struct GammaOptions {
    /// Run the gamma pass.
    #[schemars(title = "Enabled")]
    pub enabled: bool,
    /// Power-law exponent; `0` selects the exact sRGB transfer curve.
    #[schemars(title = "Gamma", range(min = 0.0, max = 3.0), extend("step" = 0.05))]
    pub gamma: f32,
}

impl Default for GammaOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            gamma: 0.0,
        }
    }
}

/// Custom effect pass parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Effect", inline)]
#[serde(default)]
pub struct EffectOptions {
    /// Run the effect pass.
    #[schemars(title = "Enabled")]
    pub enabled: bool,
    /// Clock increment per frame.
    #[schemars(title = "Time Step", range(min = 0.0, max = 0.5), extend("step" = 0.01))]
    pub time_step: f64,
    /// Growth law of the `time` uniform.
    #[schemars(title = "Time Law")]
    pub time_law: TimeLaw,
    /// Blend strength of the effect over the source frame.
    #[schemars(title = "Strength", range(min = 0.0, max = 1.0), extend("step" = 0.01))]
    pub strength: f32,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            time_step: 0.05,
            time_law: TimeLaw::Compounding,
            strength: 1.0,
        }
    }
}
