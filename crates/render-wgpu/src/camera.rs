use glam::{Mat4, Vec3};
use sketchflight_render::RenderView;

/// Smallest squared look distance that still defines a direction.
const MIN_LOOK_DISTANCE_SQ: f32 = 1e-10;

/// Perspective camera driven by a `RenderView`.
///
/// The look direction only changes when the new target gives a usable one.
/// A target on top of the eye, a non-finite input or a direction parallel to
/// world up leaves the previous orientation in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    pub eye: Vec3,
    forward: Vec3,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for ViewCamera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 80.0, -85.0),
            forward: Vec3::Z,
            fov_y_degrees: 60.0,
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 10_000.0,
        }
    }
}

impl ViewCamera {
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    /// Point the camera from `eye` at `target`. Returns false when the
    /// orientation was kept because the request was degenerate.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3) -> bool {
        if !eye.is_finite() || !target.is_finite() {
            return false;
        }
        self.eye = eye;
        let dir = target - eye;
        if !dir.is_finite() || dir.length_squared() < MIN_LOOK_DISTANCE_SQ {
            return false;
        }
        let dir = dir.normalize();
        if dir.cross(Vec3::Y).length_squared() < MIN_LOOK_DISTANCE_SQ {
            return false;
        }
        self.forward = dir;
        true
    }

    /// Take projection and placement from a frame view.
    pub fn apply(&mut self, view: &RenderView) -> bool {
        self.fov_y_degrees = view.fov_degrees;
        self.aspect = view.aspect();
        self.near = view.near;
        self.far = view.far;
        self.look_at(view.eye, view.target)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.eye + self.forward, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
