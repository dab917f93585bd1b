//! GPU resource management: device and surface setup, the wgpu chain
//! backend, offscreen textures, and shader composition.

/// The wgpu implementation of the chain backend.
pub mod backend;
/// Growable GPU buffers with automatic reallocation.
pub mod dynamic_buffer;
/// Shared wgpu boilerplate helpers for the chain's pipelines.
pub mod pipeline_helpers;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// WGSL shader composition with `#import` support via naga-oil.
pub mod shader_composer;
/// Offscreen color and depth textures.
pub mod texture;
