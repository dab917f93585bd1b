use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};

use crate::camera::core::Camera;
use crate::input::{InputEvent, MouseButton};
use crate::options::CameraOptions;

/// Keeps the polar angle away from the poles so `look_at` never degenerates.
const POLAR_EPSILON: f32 = 1e-3;
/// Base dolly factor per wheel notch at zoom speed 1.
const ZOOM_BASE: f32 = 0.95;
/// Pending motion below this magnitude is dropped when damping.
const SETTLE_EPSILON: f32 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragState {
    None,
    Rotate,
    Pan,
}

/// Spherical coordinates of the eye around the target, Y up.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Azimuth around +Y, measured from +Z toward +X.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Orbit controller: maps pointer input into eye/target changes around a
/// pivot.
///
/// Input only accumulates pending motion; [`update`](Self::update) applies
/// it to the camera once per frame. With damping enabled, each update
/// applies a fraction of the pending motion and decays the rest, giving
/// inertia after the pointer is released.
#[derive(Debug, Clone)]
pub struct OrbitController {
    target: Vec3,
    spherical_delta: Vec2,
    pan_offset: Vec3,
    scale: f32,

    drag: DragState,
    shift_pressed: bool,
    last_cursor: Option<Vec2>,
    viewport_height: f32,

    enable_damping: bool,
    damping_factor: f32,
    rotate_speed: f32,
    pan_speed: f32,
    zoom_speed: f32,
    min_distance: f32,
    max_distance: f32,
}

impl OrbitController {
    /// Controller pivoting around `options.target`.
    #[must_use]
    pub fn new(options: &CameraOptions) -> Self {
        Self {
            target: Vec3::from_array(options.target),
            spherical_delta: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
            drag: DragState::None,
            shift_pressed: false,
            last_cursor: None,
            viewport_height: 1.0,
            enable_damping: options.enable_damping,
            damping_factor: options.damping_factor.clamp(0.0, 1.0),
            rotate_speed: options.rotate_speed,
            pan_speed: options.pan_speed,
            zoom_speed: options.zoom_speed,
            min_distance: options.min_distance.max(0.0),
            max_distance: options.max_distance.max(options.min_distance),
        }
    }

    /// Current orbit pivot.
    #[must_use]
    pub fn target(&self) -> Vec3 {
        self.target
    }

    /// Move the orbit pivot.
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Height of the input surface in logical pixels; converts pointer
    /// travel into angles.
    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    /// Whether any motion is still pending (input or damping inertia).
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.spherical_delta != Vec2::ZERO
            || self.pan_offset != Vec3::ZERO
            || self.scale != 1.0
    }

    /// Queue a rotation around the vertical axis (radians).
    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.x -= angle;
    }

    /// Queue a rotation toward the top pole (radians).
    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.y -= angle;
    }

    /// Queue a pan of `delta` logical pixels using the camera's current
    /// basis, scaled so the pivot tracks the pointer.
    pub fn pan(&mut self, camera: &Camera, delta: Vec2) {
        let distance = (camera.eye - self.target).length()
            * (camera.fovy.to_radians() / 2.0).tan();
        let per_pixel = 2.0 * distance / self.viewport_height * self.pan_speed;
        self.pan_offset -= camera.right() * (delta.x * per_pixel);
        self.pan_offset += camera.screen_up() * (delta.y * per_pixel);
    }

    /// Queue a dolly toward the target (`steps > 0`) or away from it.
    pub fn dolly(&mut self, steps: f32) {
        let zoom = ZOOM_BASE.powf(self.zoom_speed);
        self.scale *= zoom.powf(steps);
    }

    /// Feed one input event. Returns `true` if the controller consumed it.
    pub fn handle_input(&mut self, camera: &Camera, event: &InputEvent) -> bool {
        match *event {
            InputEvent::MouseButton { button, pressed } => {
                self.drag = match (pressed, button) {
                    (false, _) => DragState::None,
                    (true, MouseButton::Left) if self.shift_pressed => DragState::Pan,
                    (true, MouseButton::Left) => DragState::Rotate,
                    (true, MouseButton::Right | MouseButton::Middle) => DragState::Pan,
                };
                true
            }
            InputEvent::ModifiersChanged { shift } => {
                self.shift_pressed = shift;
                true
            }
            InputEvent::CursorMoved { x, y } => {
                let current = Vec2::new(x, y);
                let delta = self
                    .last_cursor
                    .map_or(Vec2::ZERO, |last| current - last);
                self.last_cursor = Some(current);
                match self.drag {
                    DragState::None => false,
                    DragState::Rotate => {
                        let per_pixel = TAU / self.viewport_height * self.rotate_speed;
                        self.rotate_left(delta.x * per_pixel);
                        self.rotate_up(delta.y * per_pixel);
                        true
                    }
                    DragState::Pan => {
                        self.pan(camera, delta);
                        true
                    }
                }
            }
            InputEvent::Scroll { delta } => {
                self.dolly(delta);
                true
            }
        }
    }

    /// Advance one tick: apply pending motion to `camera` and decay (or
    /// clear) it.
    pub fn update(&mut self, camera: &mut Camera) {
        let mut spherical = Spherical::from_offset(camera.eye - self.target);
        let factor = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };

        spherical.theta += self.spherical_delta.x * factor;
        spherical.phi += self.spherical_delta.y * factor;
        spherical.phi = spherical.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
        spherical.radius =
            (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * factor;

        camera.target = self.target;
        camera.eye = self.target + spherical.to_offset();
        camera.up = Vec3::Y;

        self.scale = 1.0;
        if self.enable_damping {
            self.spherical_delta *= 1.0 - factor;
            self.pan_offset *= 1.0 - factor;
            if self.spherical_delta.length() < SETTLE_EPSILON {
                self.spherical_delta = Vec2::ZERO;
            }
            if self.pan_offset.length() < SETTLE_EPSILON {
                self.pan_offset = Vec3::ZERO;
            }
        } else {
            self.spherical_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(options: &CameraOptions) -> (OrbitController, Camera) {
        let camera = Camera::new(
            Vec3::from_array(options.position),
            Vec3::from_array(options.target),
            1.0,
            options.fovy,
            options.znear,
            options.zfar,
        );
        let mut controls = OrbitController::new(options);
        controls.set_viewport_height(600);
        (controls, camera)
    }

    fn simple_options() -> CameraOptions {
        CameraOptions {
            position: [0.0, 0.0, 10.0],
            target: [0.0, 0.0, 0.0],
            ..CameraOptions::default()
        }
    }

    #[test]
    fn idle_update_keeps_position() {
        let options = CameraOptions::default();
        let (mut controls, mut camera) = setup(&options);
        let eye = camera.eye;
        controls.update(&mut camera);
        assert!((camera.eye - eye).length() < 1e-3);
        assert_eq!(camera.target, Vec3::from_array(options.target));
    }

    #[test]
    fn rotate_preserves_distance() {
        let (mut controls, mut camera) = setup(&simple_options());
        controls.rotate_left(0.5);
        controls.update(&mut camera);
        assert!(((camera.eye - camera.target).length() - 10.0).abs() < 1e-4);
        assert!(camera.eye.x.abs() > 1.0);
        assert!(!controls.is_moving());
    }

    #[test]
    fn polar_angle_is_clamped() {
        let (mut controls, mut camera) = setup(&simple_options());
        controls.rotate_up(10.0);
        controls.update(&mut camera);
        let offset = camera.eye - camera.target;
        assert!(offset.y < 10.0);
        assert!(offset.y > 9.99);
        assert!(offset.x.hypot(offset.z) > 1e-3);
        assert!(camera.build_matrix().is_finite());
    }

    #[test]
    fn polar_angle_is_clamped_at_south_pole() {
        let (mut controls, mut camera) = setup(&simple_options());
        controls.rotate_up(-10.0);
        controls.update(&mut camera);
        let offset = camera.eye - camera.target;
        assert!(offset.y > -10.0);
        assert!(offset.y < -9.99);
        assert!(camera.build_matrix().is_finite());
    }

    #[test]
    fn dolly_is_clamped_to_distance_limits() {
        let options = CameraOptions {
            min_distance: 5.0,
            max_distance: 20.0,
            ..simple_options()
        };
        let (mut controls, mut camera) = setup(&options);
        controls.dolly(100.0);
        controls.update(&mut camera);
        assert!(((camera.eye - camera.target).length() - 5.0).abs() < 1e-4);

        controls.dolly(-1000.0);
        controls.update(&mut camera);
        assert!(((camera.eye - camera.target).length() - 20.0).abs() < 1e-3);
    }

    #[test]
    fn left_drag_rotates_right_drag_pans() {
        let (mut controls, mut camera) = setup(&simple_options());
        let _ = controls.handle_input(&camera, &InputEvent::CursorMoved { x: 100.0, y: 100.0 });
        let _ = controls.handle_input(
            &camera,
            &InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed: true,
            },
        );
        assert!(controls.handle_input(&camera, &InputEvent::CursorMoved { x: 130.0, y: 100.0 }));
        controls.update(&mut camera);
        assert_eq!(camera.target, Vec3::ZERO);
        assert!(camera.eye.x.abs() > 0.1);

        let _ = controls.handle_input(
            &camera,
            &InputEvent::MouseButton {
                button: MouseButton::Left,
                pressed: false,
            },
        );
        assert!(!controls.handle_input(&camera, &InputEvent::CursorMoved { x: 200.0, y: 100.0 }));

        let _ = controls.handle_input(
            &camera,
            &InputEvent::MouseButton {
                button: MouseButton::Right,
                pressed: true,
            },
        );
        let _ = controls.handle_input(&camera, &InputEvent::CursorMoved { x: 240.0, y: 120.0 });
        controls.update(&mut camera);
        assert_ne!(camera.target, Vec3::ZERO);
        assert!(((camera.eye - camera.target).length() - 10.0).abs() < 1e-3);
    }

    #[test]
    fn damping_carries_inertia() {
        let options = CameraOptions {
            enable_damping: true,
            damping_factor: 0.25,
            ..simple_options()
        };
        let (mut controls, mut camera) = setup(&options);
        controls.rotate_left(1.0);
        controls.update(&mut camera);
        let first = camera.eye;
        assert!(controls.is_moving());
        controls.update(&mut camera);
        assert_ne!(camera.eye, first);
        for _ in 0..200 {
            controls.update(&mut camera);
        }
        assert!(!controls.is_moving());
    }
}
