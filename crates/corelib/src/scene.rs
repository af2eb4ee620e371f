//! Toolkit-independent application state and the per-frame update.
//!
//! The platform layer feeds commands and cursor events in and asks for a
//! [`FrameState`] once per tick; the renderer consumes that snapshot.

use crate::camera::Camera;
use crate::orbit::{OrbitController, object_space_eye};
use crate::toggles::RenderToggles;
use crate::{Mat4, Vec2, Vec3};

/// Discrete keyboard actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    ToggleWireframe,
    DrawMore,
    DrawLess,
    MoveCloser,
    MoveAway,
}

impl Command {
    /// Map a typed character to a command.
    pub fn from_char(text: &str) -> Option<Self> {
        match text {
            "d" | "D" => Some(Command::ToggleWireframe),
            "+" => Some(Command::DrawMore),
            "-" => Some(Command::DrawLess),
            "w" | "W" => Some(Command::MoveCloser),
            "s" | "S" => Some(Command::MoveAway),
            "\u{1b}" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Everything the renderer needs to draw one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameState {
    pub mvp: Mat4,
    pub camera_pos: Vec3,
    pub time: f32,
    pub wireframe: bool,
    pub draw_count: u32,
}

#[derive(Clone, Debug)]
pub struct Scene {
    pub camera: Camera,
    pub orbit: OrbitController,
    pub toggles: RenderToggles,
}

impl Scene {
    pub fn new(index_count: u32, width: u32, height: u32) -> Self {
        let mut camera = Camera::default();
        camera.set_viewport(width, height);
        Self {
            camera,
            orbit: OrbitController::new(),
            toggles: RenderToggles::new(index_count),
        }
    }

    /// Apply a keyboard command. Returns `false` when the app should quit.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::ToggleWireframe => {
                let on = self.toggles.toggle_wireframe();
                log::info!("wireframe {}", if on { "on" } else { "off" });
            }
            Command::DrawMore => {
                let n = self.toggles.draw_more();
                log::info!("drawNumber {n}");
            }
            Command::DrawLess => {
                let n = self.toggles.draw_less();
                log::info!("drawNumber {n}");
            }
            Command::MoveCloser => self.dolly(-Camera::DOLLY_STEP),
            Command::MoveAway => self.dolly(Camera::DOLLY_STEP),
        }
        true
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport(width, height);
    }

    /// Consume pending input and build this frame's transforms.
    pub fn frame(&mut self, screen: Vec2, time: f32) -> FrameState {
        self.orbit.update(screen);
        let model_view = self.orbit.model_view(self.camera.view());
        FrameState {
            mvp: self.camera.proj() * model_view,
            camera_pos: object_space_eye(model_view),
            time,
            wireframe: self.toggles.wireframe,
            draw_count: self.toggles.draw_count(),
        }
    }

    fn dolly(&mut self, step: f32) {
        if self.camera.dolly(step) {
            log::debug!("eye moved to {:?}", self.camera.eye);
        } else {
            log::warn!("eye would reach the target, ignoring move");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mapping() {
        assert_eq!(Command::from_char("D"), Some(Command::ToggleWireframe));
        assert_eq!(Command::from_char("+"), Some(Command::DrawMore));
        assert_eq!(Command::from_char("-"), Some(Command::DrawLess));
        assert_eq!(Command::from_char("w"), Some(Command::MoveCloser));
        assert_eq!(Command::from_char("S"), Some(Command::MoveAway));
        assert_eq!(Command::from_char("x"), None);
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut scene = Scene::new(96, 512, 512);
        assert!(scene.apply(Command::DrawLess));
        assert_eq!(scene.toggles.draw_count(), 93);
        assert!(!scene.apply(Command::Quit));
    }

    #[test]
    fn draw_keys_ignore_log_level() {
        log::set_max_level(log::LevelFilter::Warn);
        let mut scene = Scene::new(96, 512, 512);
        scene.apply(Command::DrawLess);
        scene.apply(Command::DrawLess);
        assert_eq!(scene.toggles.draw_count(), 90);
        scene.apply(Command::DrawMore);
        assert_eq!(scene.toggles.draw_count(), 93);
    }

    #[test]
    fn frame_reflects_toggles_and_eye() {
        let mut scene = Scene::new(96, 512, 512);
        scene.apply(Command::ToggleWireframe);
        let frame = scene.frame(Vec2::new(1920.0, 1080.0), 2.5);

        assert!(frame.wireframe);
        assert_eq!(frame.draw_count, 96);
        assert_eq!(frame.time, 2.5);
        assert!(frame.camera_pos.abs_diff_eq(Camera::DEFAULT_EYE, 1e-2));
        assert!(frame.mvp.to_cols_array().iter().all(|f| f.is_finite()));
    }

    #[test]
    fn move_keys_shift_the_eye() {
        let mut scene = Scene::new(96, 512, 512);
        scene.apply(Command::MoveCloser);
        assert_eq!(scene.camera.eye, Vec3::new(0.0, 95.0, 95.0));
        scene.apply(Command::MoveAway);
        assert_eq!(scene.camera.eye, Vec3::new(0.0, 100.0, 100.0));
    }

    #[test]
    fn origin_projects_to_screen_center() {
        let mut scene = Scene::new(96, 800, 600);
        let frame = scene.frame(Vec2::new(800.0, 600.0), 0.0);
        let clip = frame.mvp * Vec3::ZERO.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
