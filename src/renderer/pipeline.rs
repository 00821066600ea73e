//! WebGPU render pipeline
//!
//! One alpha-blended triangle pipeline. Each frame uploads the main view and the
//! radar into a single vertex buffer and draws them in two viewport passes. The
//! host hands in whatever texture view it presents (a surface frame or an
//! offscreen texture); `capture` reads a frame back for snapshots.

use std::fmt;

use glam::Vec2;
use wgpu::util::DeviceExt;

use super::FrameGeometry;
use super::vertex::Vertex;
use crate::palette;

pub const SHADER_SOURCE: &str = include_str!("shader.wgsl");

/// Colour format for offscreen frames
pub const CAPTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Gap between the radar and the window corner, in pixels
const RADAR_MARGIN: f32 = 16.0;

/// Map pixel coordinates centred on a `size` viewport (y down) into NDC
pub fn to_ndc(vertices: &[Vertex], size: Vec2) -> Vec<Vertex> {
    let half = size * 0.5;
    vertices
        .iter()
        .map(|v| {
            let p = v.pos();
            Vertex::new(p.x / half.x, -p.y / half.y, v.color)
        })
        .collect()
}

/// Pixel rectangle (x, y, w, h) of the radar viewport in the window's top-right corner
pub fn radar_viewport(window: (u32, u32), radar_size: f32) -> Option<(f32, f32, f32, f32)> {
    let (w, h) = (window.0 as f32, window.1 as f32);
    let size = radar_size.min(w - 2.0 * RADAR_MARGIN).min(h - 2.0 * RADAR_MARGIN);
    if size <= 0.0 {
        return None;
    }
    Some((w - size - RADAR_MARGIN, RADAR_MARGIN, size, size))
}

/// Background clear colour as 8-bit RGBA
pub fn clear_rgba8() -> [u8; 4] {
    palette::BACKGROUND.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

/// Adapter for rendering without a window. Prefers the software fallback so
/// CI machines without a GPU still get one; `None` when nothing is available.
pub async fn headless_adapter() -> Option<wgpu::Adapter> {
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    for force_fallback_adapter in [true, false] {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::LowPower,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await;
        if let Ok(adapter) = adapter {
            log::info!("Using adapter: {:?}", adapter.get_info().name);
            return Some(adapter);
        }
    }
    None
}

/// Reading a frame back failed
#[derive(Debug)]
pub enum CaptureError {
    /// The renderer targets a format other than `CAPTURE_FORMAT`
    Format(wgpu::TextureFormat),
    EmptyTarget,
    Poll(wgpu::PollError),
    Map(wgpu::BufferAsyncError),
    Disconnected,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::Format(format) => write!(f, "cannot capture {format:?} frames"),
            CaptureError::EmptyTarget => write!(f, "capture target has no pixels"),
            CaptureError::Poll(e) => write!(f, "device poll failed: {e}"),
            CaptureError::Map(e) => write!(f, "readback map failed: {e}"),
            CaptureError::Disconnected => write!(f, "readback callback never ran"),
        }
    }
}

impl std::error::Error for CaptureError {}

/// A frame read back from the GPU: tightly packed RGBA8 rows, top row first
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Snapshot {
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let p = self.pixels.get(i..i + 4)?;
        Some([p[0], p[1], p[2], p[3]])
    }

    /// Pixels that differ from the clear colour
    pub fn lit_pixels(&self) -> usize {
        let clear = clear_rgba8();
        self.pixels
            .chunks_exact(4)
            .filter(|p| p.iter().zip(clear).any(|(a, b)| a.abs_diff(b) > 2))
            .count()
    }
}

/// Device, queue and the triangle pipeline for one colour format
pub struct Renderer {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pipeline: wgpu::RenderPipeline,
    format: wgpu::TextureFormat,
}

impl Renderer {
    pub async fn new(
        adapter: &wgpu::Adapter,
        format: wgpu::TextureFormat,
    ) -> Result<Self, wgpu::RequestDeviceError> {
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("neon-siege-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("render_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        Ok(Self {
            device,
            queue,
            pipeline,
            format,
        })
    }

    /// Draw the main view into `target` (`size` pixels), then the radar (if
    /// given) in its corner viewport, and submit.
    pub fn render_to(
        &self,
        target: &wgpu::TextureView,
        size: (u32, u32),
        scene: &[Vertex],
        radar: Option<(&[Vertex], f32)>,
    ) {
        if size.0 == 0 || size.1 == 0 {
            return;
        }
        let window = Vec2::new(size.0 as f32, size.1 as f32);
        let mut vertices = to_ndc(scene, window);
        let scene_count = vertices.len() as u32;

        let radar_pass = radar.and_then(|(radar_vertices, radar_size)| {
            let viewport = radar_viewport(size, radar_size)?;
            let start = vertices.len() as u32;
            vertices.extend(to_ndc(radar_vertices, Vec2::splat(viewport.2)));
            Some((viewport, start..vertices.len() as u32))
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("render_encoder"),
            });

        // Buffer lives for this frame only
        let vertex_buffer = (!vertices.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("vertex_buffer"),
                    contents: bytemuck::cast_slice(&vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                })
        });

        {
            let [r, g, b, a] = palette::BACKGROUND.map(f64::from);
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            if let Some(buffer) = &vertex_buffer {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_vertex_buffer(0, buffer.slice(..));
                render_pass.draw(0..scene_count, 0..1);

                if let Some(((x, y, w, h), range)) = radar_pass {
                    render_pass.set_viewport(x, y, w, h, 0.0, 1.0);
                    render_pass.draw(range, 0..1);
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
    }

    /// Render `geometry` into an offscreen texture and read it back
    pub fn capture(
        &self,
        geometry: &FrameGeometry,
        width: u32,
        height: u32,
    ) -> Result<Snapshot, CaptureError> {
        if self.format != CAPTURE_FORMAT {
            return Err(CaptureError::Format(self.format));
        }
        if width == 0 || height == 0 {
            return Err(CaptureError::EmptyTarget);
        }

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("capture_texture"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CAPTURE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        geometry.draw(self, &view, (width, height));

        // Copies need rows padded to the alignment
        let row_bytes = width * 4;
        let padded_row = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("capture_buffer"),
            size: padded_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("capture_encoder"),
            });
        encoder.copy_texture_to_buffer(
            texture.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &buffer,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device
            .poll(wgpu::PollType::wait_indefinitely())
            .map_err(CaptureError::Poll)?;
        rx.recv()
            .map_err(|_| CaptureError::Disconnected)?
            .map_err(CaptureError::Map)?;

        let pixels = {
            let data = slice.get_mapped_range();
            data.chunks(padded_row as usize)
                .flat_map(|row| row[..row_bytes as usize].iter().copied())
                .collect()
        };
        buffer.unmap();

        Ok(Snapshot {
            width,
            height,
            pixels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::shapes;

    #[test]
    fn test_shader_validates() {
        let module = naga::front::wgsl::parse_str(SHADER_SOURCE).expect("shader parses");
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .expect("shader validates");
        assert!(module.entry_points.iter().any(|e| e.name == "vs_main"));
        assert!(module.entry_points.iter().any(|e| e.name == "fs_main"));
    }

    #[test]
    fn test_ndc_mapping() {
        let v = [Vertex::new(400.0, -300.0, [1.0; 4]), Vertex::new(0.0, 150.0, [1.0; 4])];
        let ndc = to_ndc(&v, Vec2::new(800.0, 600.0));
        assert_eq!(ndc[0].position, [1.0, 1.0]);
        assert_eq!(ndc[1].position, [0.0, -0.5]);
    }

    #[test]
    fn test_radar_viewport_in_top_right() {
        let (x, y, w, h) = radar_viewport((1280, 720), 160.0).expect("fits");
        assert_eq!((w, h), (160.0, 160.0));
        assert_eq!(x, 1280.0 - 160.0 - RADAR_MARGIN);
        assert_eq!(y, RADAR_MARGIN);
        assert!(radar_viewport((20, 20), 160.0).is_none());
    }

    #[test]
    fn test_snapshot_pixel_lookup() {
        let clear = clear_rgba8();
        let mut pixels = clear.repeat(4);
        pixels[12..16].copy_from_slice(&[255, 255, 255, 255]);
        let snap = Snapshot {
            width: 2,
            height: 2,
            pixels,
        };
        assert_eq!(snap.pixel(0, 0), Some(clear));
        assert_eq!(snap.pixel(1, 1), Some([255; 4]));
        assert_eq!(snap.pixel(2, 0), None);
        assert_eq!(snap.lit_pixels(), 1);
    }

    fn close(a: [u8; 4], b: [u8; 4]) -> bool {
        a.iter().zip(b).all(|(x, y)| x.abs_diff(y) <= 2)
    }

    #[tokio::test]
    async fn test_offscreen_frame_draws_scene_and_radar_viewport() {
        let Some(adapter) = headless_adapter().await else {
            eprintln!("no wgpu adapter available; skipping offscreen render");
            return;
        };
        let renderer = Renderer::new(&adapter, CAPTURE_FORMAT)
            .await
            .expect("device");

        // Scene: 40 px square at the window centre. Radar: a fill far larger
        // than its viewport, so anything outside the corner proves clipping.
        let geometry = FrameGeometry {
            scene: shapes::rect(Vec2::splat(-20.0), Vec2::splat(40.0), palette::DANGER),
            radar: Some((
                shapes::rect(Vec2::splat(-400.0), Vec2::splat(800.0), palette::WHITE),
                160.0,
            )),
        };
        let snap = renderer.capture(&geometry, 400, 240).expect("capture");
        let rgba = |c: [f32; 4]| c.map(|v| (v * 255.0).round() as u8);

        // Window centre
        assert!(close(snap.pixel(200, 120).expect("in bounds"), rgba(palette::DANGER)));
        // Radar viewport spans x 224..384, y 16..176
        assert!(close(snap.pixel(304, 96).expect("in bounds"), [255; 4]));
        assert!(close(snap.pixel(228, 20).expect("in bounds"), [255; 4]));
        // Just outside it
        assert!(close(snap.pixel(220, 60).expect("in bounds"), clear_rgba8()));
        assert!(close(snap.pixel(304, 200).expect("in bounds"), clear_rgba8()));
        assert!(close(snap.pixel(10, 10).expect("in bounds"), clear_rgba8()));

        assert_eq!(snap.lit_pixels(), 40 * 40 + 160 * 160);
    }

    #[tokio::test]
    async fn test_capture_rejects_empty_target() {
        let Some(adapter) = headless_adapter().await else {
            return;
        };
        let renderer = Renderer::new(&adapter, CAPTURE_FORMAT)
            .await
            .expect("device");
        let result = renderer.capture(&FrameGeometry::default(), 0, 64);
        assert!(matches!(result, Err(CaptureError::EmptyTarget)));
    }
}
