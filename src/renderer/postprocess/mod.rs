//! Post-processing chain.
//!
//! Backend-agnostic chain orchestration (pass descriptors, typed uniform
//! mappings, ping-pong buffer hand-off) plus the wgpu full-screen shader
//! pass used for gamma correction and the custom effect.

pub mod chain;
pub mod effect;
pub mod pass;
pub mod programs;
pub mod screen_pass;
#[cfg(test)]
pub(crate) mod testing;
pub mod uniforms;

pub use chain::{PassChain, PassId};
pub use effect::EffectPass;
pub use pass::{
    Backend, Pass, PassContext, PassDescriptor, PassIo, PassKind, PassOutput,
    RenderTarget, ShaderProgram,
};
pub use uniforms::{TextureSlot, UniformError, UniformValue, Uniforms};
