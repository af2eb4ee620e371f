//! Renderer: wgpu init + depth + animated water grid.
//! wgpu = 26.x, winit = 0.30.x

pub mod program;
pub mod textures;

use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::Context;
use asset::{CubeMapData, MeshData, MeshVertex, ShaderPair, TextureData};
use bytemuck::{Pod, Zeroable};
use corelib::scene::FrameState;
use wgpu::{
    util::DeviceExt,
    BindGroup, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandEncoderDescriptor, CompareFunction, DepthBiasState, DepthStencilState, Device,
    DeviceDescriptor, Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits,
    LoadOp, Operations, PipelineLayout, PipelineLayoutDescriptor, PolygonMode, PowerPreference,
    PresentMode, Queue, RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline,
    RenderPipelineDescriptor, ShaderModule, ShaderModuleDescriptor, ShaderSource, ShaderStages,
    StoreOp, Surface, SurfaceConfiguration, SurfaceError, Texture, TextureDescriptor,
    TextureDimension, TextureFormat, TextureUsages, TextureView, TextureViewDescriptor,
    VertexAttribute, VertexBufferLayout, VertexFormat, VertexState, VertexStepMode,
};
use winit::{dpi::PhysicalSize, window::Window};

use crate::program::ShaderProgram;
use crate::textures::WaterTextures;

/// Vertex: position + texture coordinate, interleaved.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub uv: [f32; 2],
}

impl From<&MeshVertex> for Vertex {
    fn from(v: &MeshVertex) -> Self {
        Self {
            pos: v.position,
            uv: v.uv,
        }
    }
}

/// Mirrors `struct Uniforms` in both water shaders (std140-compatible).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct WaterUniforms {
    /// `ModelViewProjectionMatrix`, column-major.
    pub mvp: [[f32; 4]; 4],
    /// `vCameraPos`
    pub camera_pos: [f32; 3],
    pub time: f32,
    pub wireframe: u32,
    _pad: [u32; 3],
}

impl WaterUniforms {
    pub fn from_frame(frame: &FrameState) -> Self {
        Self {
            mvp: frame.mvp.to_cols_array_2d(),
            camera_pos: frame.camera_pos.to_array(),
            time: frame.time,
            wireframe: frame.wireframe as u32,
            _pad: [0; 3],
        }
    }
}

/// CPU-side inputs the GPU state is built from. Copied into GPU memory.
pub struct RenderSetup<'a> {
    pub backends: wgpu::Backends,
    pub shaders: &'a ShaderPair,
    pub mesh: &'a MeshData,
    pub bump_map: &'a TextureData,
    pub skybox: &'a CubeMapData,
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.3,
    g: 0.4,
    b: 0.6,
    a: 1.0,
};

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Program: solid draws depth-tested and culled, wireframe neither
    solid_pipeline: RenderPipeline,
    wire_pipeline: RenderPipeline,

    // Geometry
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,

    // Uniforms + textures
    uniform_buf: Buffer,
    uniform_bg: BindGroup,
    textures: WaterTextures,

    // Depth
    depth_tex: Texture,
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window> and upload all static data.
    pub async fn new(window: Arc<Window>, setup: RenderSetup<'_>) -> anyhow::Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Program first: a bad shader should fail before touching the GPU.
        let program = ShaderProgram::build(setup.shaders)?;

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends: setup.backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let line_mode = adapter.features().contains(Features::POLYGON_MODE_LINE);
        if !line_mode {
            log::warn!("POLYGON_MODE_LINE unsupported; wireframe draws filled triangles");
        }

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Ripple Device"),
                required_features: if line_mode {
                    Features::POLYGON_MODE_LINE
                } else {
                    Features::empty()
                },
                required_limits: Limits::downlevel_webgl2_defaults()
                    .using_resolution(adapter.limits()),
                memory_hints: Default::default(),
                trace: Default::default(),
            })
            .await
            .context("request_device failed")?;

        let caps = surface.get_capabilities(&adapter);
        let surface_format =
            pick_surface_format(&caps.formats).context("surface reports no formats")?;
        log::info!("Surface format: {:?}", surface_format);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let (depth_tex, depth_view) = create_depth(&device, &surface_config);

        // ==== Shaders ====
        let vs_module = create_module(&device, &program.vertex);
        let fs_module = create_module(&device, &program.fragment);

        // ==== Uniforms BGL/BG ====
        let uniform_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Uniforms BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX | ShaderStages::FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<WaterUniforms>() as u64),
                },
                count: None,
            }],
        });
        let uniform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Uniforms UBO"),
            contents: bytemuck::bytes_of(&WaterUniforms::zeroed()),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let uniform_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniforms BG"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            }],
        });

        // ==== Textures (sampler units fixed once) ====
        let textures = WaterTextures::new(&device, &queue, setup.bump_map, setup.skybox);

        // ==== Pipelines ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Water PipelineLayout"),
            bind_group_layouts: &[&uniform_bgl, &textures.layout],
            push_constant_ranges: &[],
        });
        let attributes = vertex_attributes(&program);
        let stages = PipelineStages {
            layout: &pipeline_layout,
            vs: &vs_module,
            vs_entry: &program.vertex.entry_point,
            fs: &fs_module,
            fs_entry: &program.fragment.entry_point,
            attributes: &attributes,
            format: surface_format,
        };
        let solid_pipeline = create_pipeline(&device, &stages, DrawMode::Solid);
        let wire_pipeline = create_pipeline(
            &device,
            &stages,
            if line_mode {
                DrawMode::Wireframe
            } else {
                DrawMode::WireframeFallback
            },
        );

        // ==== Geometry: water grid ====
        let vertices: Vec<Vertex> = setup.mesh.vertices.iter().map(Vertex::from).collect();
        let max_buffer = device.limits().max_buffer_size;
        let vb_bytes = std::mem::size_of_val(vertices.as_slice()) as u64;
        let ib_bytes = std::mem::size_of_val(setup.mesh.indices.as_slice()) as u64;
        anyhow::ensure!(
            vb_bytes.max(ib_bytes) <= max_buffer,
            "grid needs {} byte buffers, device allows {}",
            vb_bytes.max(ib_bytes),
            max_buffer
        );
        let vertex_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid VB"),
            contents: bytemuck::cast_slice(&vertices),
            usage: BufferUsages::VERTEX,
        });
        let index_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Grid IB"),
            contents: bytemuck::cast_slice(&setup.mesh.indices),
            usage: BufferUsages::INDEX,
        });
        log::info!(
            "Grid uploaded: {} vertices, {} indices",
            vertices.len(),
            setup.mesh.indices.len()
        );

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            solid_pipeline,
            wire_pipeline,
            vertex_buf,
            index_buf,
            index_count: setup.mesh.index_count(),
            uniform_buf,
            uniform_bg,
            textures,
            depth_tex,
            depth_view,
            width,
            height,
        })
    }

    /// Resize: reconfigure surface & recreate depth buffer.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_tex.destroy();
        (self.depth_tex, self.depth_view) = create_depth(&self.device, &self.surface_config);
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Render one frame: upload uniforms + clear + draw grid + present.
    pub fn render(&mut self, frame: &FrameState) -> Result<(), SurfaceError> {
        self.queue.write_buffer(
            &self.uniform_buf,
            0,
            bytemuck::bytes_of(&WaterUniforms::from_frame(frame)),
        );

        let output = self.surface.get_current_texture()?;
        let view = output.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(CLEAR_COLOR),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            let pipeline = if frame.wireframe {
                &self.wire_pipeline
            } else {
                &self.solid_pipeline
            };
            rpass.set_pipeline(pipeline);
            rpass.set_bind_group(0, &self.uniform_bg, &[]);
            rpass.set_bind_group(1, &self.textures.bind_group, &[]);
            rpass.set_vertex_buffer(0, self.vertex_buf.slice(..));
            rpass.set_index_buffer(self.index_buf.slice(..), wgpu::IndexFormat::Uint32);
            rpass.draw_indexed(0..frame.draw_count.min(self.index_count), 0, 0..1);
        }

        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

impl Drop for GpuState {
    fn drop(&mut self) {
        self.vertex_buf.destroy();
        self.index_buf.destroy();
        self.uniform_buf.destroy();
        self.textures.destroy();
        self.depth_tex.destroy();
        log::info!("GPU resources released");
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DrawMode {
    Solid,
    Wireframe,
    /// No line rasterization on this adapter: same state, filled.
    WireframeFallback,
}

struct PipelineStages<'a> {
    layout: &'a PipelineLayout,
    vs: &'a ShaderModule,
    vs_entry: &'a str,
    fs: &'a ShaderModule,
    fs_entry: &'a str,
    attributes: &'a [VertexAttribute],
    format: TextureFormat,
}

fn create_module(device: &Device, stage: &program::CompiledStage) -> ShaderModule {
    device.create_shader_module(ShaderModuleDescriptor {
        label: stage.text.path.to_str(),
        source: ShaderSource::Wgsl(stage.text.source.as_str().into()),
    })
}

/// Attribute layout from the reflected `vPosition`/`vTexCoord` locations.
fn vertex_attributes(program: &ShaderProgram) -> [VertexAttribute; 2] {
    [
        VertexAttribute {
            format: VertexFormat::Float32x3,
            offset: std::mem::offset_of!(Vertex, pos) as u64,
            shader_location: program.position_location,
        },
        VertexAttribute {
            format: VertexFormat::Float32x2,
            offset: std::mem::offset_of!(Vertex, uv) as u64,
            shader_location: program.texcoord_location,
        },
    ]
}

fn create_pipeline(device: &Device, stages: &PipelineStages<'_>, mode: DrawMode) -> RenderPipeline {
    let solid = mode == DrawMode::Solid;
    let primitive = wgpu::PrimitiveState {
        front_face: wgpu::FrontFace::Ccw,
        cull_mode: solid.then_some(wgpu::Face::Back),
        polygon_mode: if mode == DrawMode::Wireframe {
            PolygonMode::Line
        } else {
            PolygonMode::Fill
        },
        ..Default::default()
    };
    let depth_stencil = DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: solid,
        depth_compare: if solid {
            CompareFunction::LessEqual
        } else {
            CompareFunction::Always
        },
        stencil: wgpu::StencilState::default(),
        bias: DepthBiasState::default(),
    };

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(if solid { "Water Pipeline" } else { "Water Wire Pipeline" }),
        layout: Some(stages.layout),
        vertex: VertexState {
            module: stages.vs,
            entry_point: Some(stages.vs_entry),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: VertexStepMode::Vertex,
                attributes: stages.attributes,
            }],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(FragmentState {
            module: stages.fs,
            entry_point: Some(stages.fs_entry),
            targets: &[Some(ColorTargetState {
                format: stages.format,
                blend: Some(BlendState::REPLACE),
                write_mask: ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive,
        depth_stencil: Some(depth_stencil),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

/// Colors are written as-is, so prefer a non-sRGB (UNORM) target.
fn pick_surface_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first().copied())
}

/// Create a depth texture + view matching the surface config.
fn create_depth(device: &Device, sc: &SurfaceConfiguration) -> (Texture, TextureView) {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    let view = tex.create_view(&TextureViewDescriptor::default());
    (tex, view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::{Mat4, Vec3};

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        // mat4 (64) + vec3 (12) + f32 (4) + u32 (4), rounded up to 16
        assert_eq!(std::mem::size_of::<WaterUniforms>(), 96);
        assert_eq!(std::mem::offset_of!(WaterUniforms, camera_pos), 64);
        assert_eq!(std::mem::offset_of!(WaterUniforms, time), 76);
        assert_eq!(std::mem::offset_of!(WaterUniforms, wireframe), 80);
    }

    #[test]
    fn vertex_is_interleaved() {
        assert_eq!(std::mem::size_of::<Vertex>(), 20);
        let v = Vertex::from(&MeshVertex::new([1.0, 2.0, 3.0], [0.25, 0.75]));
        assert_eq!(bytemuck::cast_slice::<Vertex, f32>(&[v]), &[1.0, 2.0, 3.0, 0.25, 0.75]);
    }

    #[test]
    fn surface_format_prefers_unorm() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(pick_surface_format(&formats), Some(TextureFormat::Bgra8Unorm));
        assert_eq!(
            pick_surface_format(&[TextureFormat::Rgba8UnormSrgb]),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(pick_surface_format(&[]), None);
    }

    #[test]
    fn uniforms_from_frame() {
        let frame = FrameState {
            mvp: Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)),
            camera_pos: Vec3::new(0.0, 100.0, 140.0),
            time: 1.5,
            wireframe: true,
            draw_count: 6,
        };
        let u = WaterUniforms::from_frame(&frame);
        assert_eq!(u.mvp[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.camera_pos, [0.0, 100.0, 140.0]);
        assert_eq!(u.time, 1.5);
        assert_eq!(u.wireframe, 1);
    }
}
