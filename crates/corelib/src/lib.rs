//! Core types: math re-exports, errors, camera, orbit controller, scene state.

pub use glam::{Mat4, Vec2, Vec3, vec2, vec3};

pub mod camera;
pub mod error;
pub mod orbit;
pub mod scene;
pub mod toggles;

pub use error::{CoreError, CoreResult, SHADER_MISSING_EXIT_CODE};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_pv_is_finite() {
        let cam = camera::Camera::new_perspective(
            vec3(0.0, 100.0, 140.0),
            vec3(0.0, 0.0, 0.0),
            Vec3::Y,
            45f32.to_radians(),
            0.01,
            1000.0,
            16.0 / 9.0,
        );
        let pv = cam.proj() * cam.view();
        let a = pv.to_cols_array();
        assert!(a.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn missing_shader_has_distinct_exit_code() {
        let err = CoreError::ShaderSource {
            path: "water.vert.wgsl".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(err.exit_code(), SHADER_MISSING_EXIT_CODE);

        let err = CoreError::ShaderLink("location 1 not written".into());
        assert_eq!(err.exit_code(), 1);
    }
}
