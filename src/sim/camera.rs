//! Camera follow in projected (screen) space

use glam::Vec2;

use crate::consts::CAMERA_SMOOTHING;
use crate::per_frame_factor;

/// Screen-space translation applied to every projected point
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
}

impl Camera {
    /// Jump straight to `target` (match start)
    pub fn snap(&mut self, target: Vec2) {
        self.offset = target;
    }

    /// Ease toward `target`. At the reference frame rate this closes
    /// `CAMERA_SMOOTHING` of the remaining gap per frame; other frame rates get
    /// the same convergence per second.
    pub fn follow(&mut self, target: Vec2, dt: f32) {
        let keep = per_frame_factor(1.0 - CAMERA_SMOOTHING, dt);
        self.offset = target + (self.offset - target) * keep;
    }
}
