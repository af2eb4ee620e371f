//! Mouse-drag orbit controller.
//!
//! Cursor events only record positions; the accumulated delta is consumed
//! once per frame in [`OrbitController::update`], so several motion events
//! between two frames collapse into the latest cursor position.

use crate::{Mat4, Vec2, Vec3};

/// Degrees of rotation for a drag across the whole screen.
pub const ORBIT_SENSITIVITY: f32 = 1000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct OrbitController {
    state: DragState,
    last: Vec2,
    current: Vec2,
    /// x = yaw (horizontal drag), y = pitch (vertical drag), in degrees.
    angles: Vec2,
}

impl OrbitController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn state(&self) -> DragState {
        self.state
    }

    #[inline]
    pub fn angles(&self) -> Vec2 {
        self.angles
    }

    /// Left button pressed at `pos`.
    pub fn press(&mut self, pos: Vec2) {
        self.state = DragState::Dragging;
        self.last = pos;
        self.current = pos;
    }

    /// Left button released at `pos`.
    pub fn release(&mut self, pos: Vec2) {
        self.state = DragState::Idle;
        self.last = pos;
        self.current = pos;
    }

    /// Cursor moved. Ignored unless dragging.
    pub fn motion(&mut self, pos: Vec2) {
        if self.state == DragState::Dragging {
            self.current = pos;
        }
    }

    /// Consume the pending drag delta, scaled by the screen size.
    pub fn update(&mut self, screen: Vec2) {
        if self.state == DragState::Idle {
            self.last = self.current;
            return;
        }
        let screen = screen.max(Vec2::ONE);
        let delta = self.current - self.last;
        self.angles += ORBIT_SENSITIVITY * delta / screen;
        self.last = self.current;
    }

    /// `rotX(-pitch) * rotY(-yaw)`, applied after the look-at view.
    pub fn rotation(&self) -> Mat4 {
        Mat4::from_rotation_x(-self.angles.y.to_radians())
            * Mat4::from_rotation_y(-self.angles.x.to_radians())
    }

    /// Model-view for a camera looking from `view`.
    pub fn model_view(&self, view: Mat4) -> Mat4 {
        view * self.rotation()
    }
}

/// Camera position in object space: translation of the inverse model-view.
pub fn object_space_eye(model_view: Mat4) -> Vec3 {
    model_view.inverse().w_axis.truncate()
}
