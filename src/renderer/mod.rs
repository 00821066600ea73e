//! Rendering
//!
//! The scene and radar builders turn a `GameState` into plain triangle lists on
//! the CPU; `pipeline` uploads and draws them with wgpu.

pub mod pipeline;
pub mod radar;
pub mod scene;
pub mod shapes;
pub mod vertex;

pub use pipeline::{CAPTURE_FORMAT, CaptureError, Renderer, Snapshot, headless_adapter};
pub use vertex::Vertex;

use crate::settings::Settings;
use crate::sim::GameState;

/// Vertex lists for one displayed frame
#[derive(Debug, Clone, Default)]
pub struct FrameGeometry {
    pub scene: Vec<Vertex>,
    /// Radar triangles and the radar edge length in pixels, when enabled
    pub radar: Option<(Vec<Vertex>, f32)>,
}

impl FrameGeometry {
    pub fn build(state: &GameState, settings: &Settings) -> Self {
        let radar = settings
            .radar
            .then(|| (radar::build(state, settings.radar_size), settings.radar_size));
        Self {
            scene: scene::build(state, settings),
            radar,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.scene.len() + self.radar.as_ref().map_or(0, |(v, _)| v.len())
    }

    /// Draw into `target`, a view of `size` pixels in the renderer's format
    pub fn draw(&self, renderer: &Renderer, target: &wgpu::TextureView, size: (u32, u32)) {
        let radar = self
            .radar
            .as_ref()
            .map(|(v, radar_size)| (v.as_slice(), *radar_size));
        renderer.render_to(target, size, &self.scene, radar);
    }
}
