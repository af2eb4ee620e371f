use crate::{Mat4, Vec3};

/// Perspective camera looking at a fixed target (right-handed).
///
/// The projection matrix is cached and only rebuilt by [`Camera::set_viewport`].
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    aspect: f32,
    projection: Mat4,
}

impl Camera {
    /// Eye height/distance the demo starts at.
    pub const DEFAULT_EYE: Vec3 = Vec3::new(0.0, 100.0, 140.0);
    /// Distance covered by one `w`/`s` key press.
    pub const DOLLY_STEP: f32 = 5.0;

    pub fn new_perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_rad: f32,
        z_near: f32,
        z_far: f32,
        aspect: f32,
    ) -> Self {
        let mut camera = Self {
            eye,
            target,
            up,
            fov_y_rad,
            z_near,
            z_far,
            aspect,
            projection: Mat4::IDENTITY,
        };
        camera.rebuild_projection();
        camera
    }

    #[inline]
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    /// Cached projection (wgpu depth range, z in [0,1]).
    #[inline]
    pub fn proj(&self) -> Mat4 {
        self.projection
    }

    #[inline]
    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Recompute the projection for a new framebuffer size.
    /// A zero height is treated as 1.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let height = height.max(1);
        self.aspect = width as f32 / height as f32;
        self.rebuild_projection();
    }

    /// Move the eye along Y and keep Z coupled to it.
    /// Returns `false` when the move would put the eye on the target.
    pub fn dolly(&mut self, step: f32) -> bool {
        let y = self.eye.y + step;
        let moved = Vec3::new(self.eye.x, y, y);
        if moved.distance_squared(self.target) < f32::EPSILON {
            return false;
        }
        self.eye = moved;
        true
    }

    fn rebuild_projection(&mut self) {
        self.projection = Mat4::perspective_rh(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        );
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(
            Self::DEFAULT_EYE,
            Vec3::ZERO,
            Vec3::Y,
            45f32.to_radians(),
            0.01,
            1000.0,
            1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_height_viewport_is_clamped() {
        let mut cam = Camera::default();
        cam.set_viewport(640, 0);
        assert_eq!(cam.aspect(), 640.0);
        assert!(cam.proj().to_cols_array().iter().all(|f| f.is_finite()));
    }

    #[test]
    fn projection_only_changes_on_resize() {
        let mut cam = Camera::default();
        let before = cam.proj();
        cam.dolly(Camera::DOLLY_STEP);
        assert_eq!(cam.proj(), before);

        cam.set_viewport(1600, 900);
        assert_ne!(cam.proj(), before);
        assert!((cam.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn dolly_couples_z_to_y() {
        let mut cam = Camera::default();
        assert!(cam.dolly(-Camera::DOLLY_STEP));
        assert_eq!(cam.eye, Vec3::new(0.0, 95.0, 95.0));
        assert!(cam.dolly(Camera::DOLLY_STEP));
        assert_eq!(cam.eye, Vec3::new(0.0, 100.0, 100.0));
    }

    #[test]
    fn dolly_refuses_to_reach_target() {
        let mut cam = Camera::default();
        cam.eye = Vec3::new(0.0, 5.0, 5.0);
        assert!(!cam.dolly(-Camera::DOLLY_STEP));
        assert_eq!(cam.eye, Vec3::new(0.0, 5.0, 5.0));
    }
}
