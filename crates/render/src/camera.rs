//! First-person camera with view and projection matrices.

use glam::{Mat4, Vec3};

/// Camera move directions relative to where it looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMovement {
    /// Along the view direction.
    Forward,
    /// Against the view direction.
    Backward,
    /// Along the negative right vector.
    Left,
    /// Along the right vector.
    Right,
}

/// Yaw/pitch camera for 3D scene rendering. Angles are in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Camera position in world space
    pub position: Vec3,
    /// World up vector
    pub world_up: Vec3,
    /// Rotation around the up axis, degrees
    pub yaw: f32,
    /// Elevation, degrees, clamped to ±89
    pub pitch: f32,
    /// Vertical field of view, degrees
    pub fov: f32,
    /// Units per second for [`Camera::move_by`]
    pub speed: f32,
    /// Degrees per unit of mouse delta
    pub sensitivity: f32,
}

/// Largest pitch magnitude in degrees.
pub const MAX_PITCH: f32 = 89.0;
/// Field of view bounds applied by [`Camera::zoom`].
pub const FOV_RANGE: (f32, f32) = (1.0, 45.0);

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}

impl Camera {
    /// Camera at `position` looking down -Z.
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            world_up: Vec3::Y,
            yaw: -90.0,
            pitch: 0.0,
            fov: 45.0,
            speed: 2.5,
            sensitivity: 0.1,
        }
    }

    /// Get the forward direction vector.
    pub fn front(&self) -> Vec3 {
        let (yaw_sin, yaw_cos) = self.yaw.to_radians().sin_cos();
        let (pitch_sin, pitch_cos) = self.pitch.to_radians().sin_cos();
        Vec3::new(yaw_cos * pitch_cos, pitch_sin, yaw_sin * pitch_cos).normalize()
    }

    /// Get the right direction vector.
    pub fn right(&self) -> Vec3 {
        self.front().cross(self.world_up).normalize()
    }

    /// Get the up direction vector.
    pub fn up(&self) -> Vec3 {
        self.right().cross(self.front()).normalize()
    }

    /// Build the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front(), self.up())
    }

    /// Perspective projection with 0..1 clip depth.
    pub fn projection_matrix(&self, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov.to_radians(), aspect, near, far)
    }

    /// Move `speed * delta_seconds` units in `direction`.
    pub fn move_by(&mut self, direction: CameraMovement, delta_seconds: f32) {
        let distance = self.speed * delta_seconds;
        let offset = match direction {
            CameraMovement::Forward => self.front(),
            CameraMovement::Backward => -self.front(),
            CameraMovement::Left => -self.right(),
            CameraMovement::Right => self.right(),
        };
        self.position += offset * distance;
    }

    /// Rotate by mouse deltas. Yaw wraps at 360, pitch is clamped to ±89.
    pub fn rotate(&mut self, yaw_delta: f32, pitch_delta: f32) {
        self.yaw = (self.yaw + yaw_delta * self.sensitivity) % 360.0;
        self.pitch = (self.pitch + pitch_delta * self.sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Narrow or widen the field of view within [`FOV_RANGE`].
    pub fn zoom(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(FOV_RANGE.0, FOV_RANGE.1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_directions() {
        let camera = Camera::default();

        // Default camera should look forward along -Z
        let front = camera.front();
        assert!(front.x.abs() < 1e-5);
        assert!(front.y.abs() < 1e-5);
        assert!((front.z + 1.0).abs() < 1e-5);
        assert!((camera.right() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_camera_rotation() {
        let mut camera = Camera::default();

        camera.rotate(0.0, 10_000.0);
        assert_eq!(camera.pitch, MAX_PITCH);

        camera.rotate(0.0, -20_000.0);
        assert_eq!(camera.pitch, -MAX_PITCH);

        camera.rotate(4_500.0, 0.0);
        assert!(camera.yaw.abs() < 360.0);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut camera = Camera::default();
        camera.zoom(100.0);
        assert_eq!(camera.fov, FOV_RANGE.0);
        camera.zoom(-100.0);
        assert_eq!(camera.fov, FOV_RANGE.1);
    }

    #[test]
    fn test_move_forward() {
        let mut camera = Camera::default();
        camera.move_by(CameraMovement::Forward, 1.0);
        assert!((camera.position - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
        camera.move_by(CameraMovement::Right, 2.0);
        assert!((camera.position.x - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_view_projection_matrix() {
        let camera = Camera::default();
        let vp = camera.projection_matrix(4.0 / 3.0, 0.1, 100.0) * camera.view_matrix();

        // Matrix should be invertible
        assert!(vp.determinant().abs() > 0.0);
    }
}
