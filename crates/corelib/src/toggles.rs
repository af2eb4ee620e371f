//! Render toggles changed by discrete key presses.

/// Indices per triangle; the draw count always moves by this much.
pub const TRIANGLE_STEP: u32 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderToggles {
    pub wireframe: bool,
    draw_count: u32,
    index_count: u32,
}

impl RenderToggles {
    /// Starts solid, drawing every index.
    pub fn new(index_count: u32) -> Self {
        let index_count = index_count - index_count % TRIANGLE_STEP;
        Self {
            wireframe: false,
            draw_count: index_count,
            index_count,
        }
    }

    #[inline]
    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn toggle_wireframe(&mut self) -> bool {
        self.wireframe = !self.wireframe;
        self.wireframe
    }

    /// Submit one more triangle, up to the full index count.
    pub fn draw_more(&mut self) -> u32 {
        self.draw_count = (self.draw_count + TRIANGLE_STEP).min(self.index_count);
        self.draw_count
    }

    /// Submit one triangle less, never dropping below a single triangle.
    pub fn draw_less(&mut self) -> u32 {
        let floor = TRIANGLE_STEP.min(self.index_count);
        self.draw_count = self.draw_count.saturating_sub(TRIANGLE_STEP).max(floor);
        self.draw_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_everything_drawn() {
        let t = RenderToggles::new(9600);
        assert_eq!(t.draw_count(), 9600);
        assert!(!t.wireframe);
    }

    #[test]
    fn draw_count_stays_a_positive_multiple_of_three() {
        let mut t = RenderToggles::new(9);
        for _ in 0..10 {
            let n = t.draw_less();
            assert!(n > 0 && n % 3 == 0);
        }
        assert_eq!(t.draw_count(), 3);

        for _ in 0..10 {
            let n = t.draw_more();
            assert!(n <= 9 && n % 3 == 0);
        }
        assert_eq!(t.draw_count(), 9);
    }

    #[test]
    fn misaligned_index_count_is_truncated() {
        let t = RenderToggles::new(10);
        assert_eq!(t.index_count(), 9);
    }

    #[test]
    fn empty_mesh_draws_nothing() {
        let mut t = RenderToggles::new(0);
        assert_eq!(t.draw_less(), 0);
        assert_eq!(t.draw_more(), 0);
    }

    #[test]
    fn wireframe_flips() {
        let mut t = RenderToggles::new(3);
        assert!(t.toggle_wireframe());
        assert!(!t.toggle_wireframe());
    }
}
