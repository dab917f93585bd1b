//! Built-in pass descriptors: the scene render, gamma correction, and the
//! time-driven custom effect.

use super::pass::{PassDescriptor, ShaderProgram};
use super::uniforms::{TextureSlot, UniformValue, Uniforms};
use crate::options::{EffectOptions, GammaOptions};

/// Uniform name of the previous pass's frame.
pub const SOURCE_FRAME: &str = "source_frame";
/// Uniform name of the effect time scalar.
pub const TIME: &str = "time";
/// Uniform name of the gamma exponent.
pub const GAMMA: &str = "gamma";
/// Uniform name of the effect strength.
pub const STRENGTH: &str = "strength";

/// Scene rasterization program (lit meshes).
pub const SCENE_PROGRAM: ShaderProgram = ShaderProgram::from_static(
    "scene.wgsl",
    include_str!("../../../assets/shaders/raster/scene.wgsl"),
);

/// Linear-to-display transfer program.
pub const GAMMA_PROGRAM: ShaderProgram = ShaderProgram::from_static(
    "gamma.wgsl",
    include_str!("../../../assets/shaders/screen/gamma.wgsl"),
);

/// Custom time-varying effect program.
pub const EFFECT_PROGRAM: ShaderProgram = ShaderProgram::from_static(
    "effect.wgsl",
    include_str!("../../../assets/shaders/screen/effect.wgsl"),
);

/// Descriptor for the base scene pass. Its uniforms are owned by the scene
/// pass itself (camera and lights), so the mapping is empty.
#[must_use]
pub fn scene_pass() -> PassDescriptor {
    PassDescriptor::new("Scene Pass", SCENE_PROGRAM, Uniforms::new())
}

/// Descriptor for the gamma-correction pass.
///
/// `gamma <= 0` selects the exact sRGB transfer curve; any positive value
/// is used as a plain power-law exponent.
#[must_use]
pub fn gamma_pass(options: &GammaOptions) -> PassDescriptor {
    let mut descriptor = PassDescriptor::new(
        "Gamma Correction Pass",
        GAMMA_PROGRAM,
        Uniforms::new()
            .with(SOURCE_FRAME, UniformValue::Texture(TextureSlot::SourceFrame))
            .with(GAMMA, UniformValue::Float(options.gamma)),
    );
    descriptor.enabled = options.enabled;
    descriptor
}

/// Descriptor for the custom effect pass. `time` starts at zero and is
/// advanced by the frame scheduler.
#[must_use]
pub fn effect_pass(options: &EffectOptions) -> PassDescriptor {
    let mut descriptor = PassDescriptor::new(
        "Custom Effect Pass",
        EFFECT_PROGRAM,
        Uniforms::new()
            .with(SOURCE_FRAME, UniformValue::Texture(TextureSlot::SourceFrame))
            .with(TIME, UniformValue::Float(0.0))
            .with(STRENGTH, UniformValue::Float(options.strength)),
    );
    descriptor.enabled = options.enabled;
    descriptor
}
