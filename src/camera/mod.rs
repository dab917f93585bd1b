//! Camera system for 3D scene viewing.
//!
//! Provides a perspective camera, an orbit controller driven by pointer
//! input, and the rig that binds them to the viewport.

/// Orbit controller managing rotation, pan, zoom, and damping.
pub mod controller;
/// Core camera struct and GPU uniform types.
pub mod core;
/// Camera plus controller, kept in sync with the viewport.
pub mod rig;

pub use controller::OrbitController;
pub use core::{Camera, CameraUniform};
pub use rig::CameraRig;
