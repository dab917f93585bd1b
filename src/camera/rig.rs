use glam::Vec3;

use super::controller::OrbitController;
use super::core::Camera;
use crate::input::InputEvent;
use crate::options::CameraOptions;

/// Perspective camera paired with its orbit controller.
///
/// The pipeline owns one rig: it forwards pointer input, calls
/// [`update`](Self::update) once per frame, and pushes viewport changes
/// through [`set_aspect`](Self::set_aspect).
#[derive(Debug, Clone)]
pub struct CameraRig {
    camera: Camera,
    controller: OrbitController,
}

impl CameraRig {
    /// Build the camera at `options.position` looking at `options.target`.
    #[must_use]
    pub fn new(options: &CameraOptions, aspect: f32) -> Self {
        let camera = Camera::new(
            Vec3::from_array(options.position),
            Vec3::from_array(options.target),
            aspect,
            options.fovy,
            options.znear,
            options.zfar,
        );
        Self {
            camera,
            controller: OrbitController::new(options),
        }
    }

    /// The camera as of the last update.
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// The orbit controller.
    #[must_use]
    pub fn controller(&self) -> &OrbitController {
        &self.controller
    }

    /// Set the aspect ratio and recompute the projection immediately.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera.set_aspect(aspect);
    }

    /// Logical height of the input surface, used to scale pointer travel.
    pub fn set_viewport_height(&mut self, height: u32) {
        self.controller.set_viewport_height(height);
    }

    /// Forward one input event to the orbit controller.
    pub fn handle_input(&mut self, event: &InputEvent) -> bool {
        self.controller.handle_input(&self.camera, event)
    }

    /// Advance the orbit controller by one tick.
    pub fn update(&mut self) {
        self.controller.update(&mut self.camera);
    }
}
