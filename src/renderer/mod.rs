//! Rendering: the post-processing chain and the wgpu scene pass that feeds
//! it.

pub mod postprocess;
pub mod scene_pass;
