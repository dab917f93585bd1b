//! The first pass of the chain: rasterizes every visible mesh with the
//! scene's lights into the chain's offscreen buffer.
//!
//! Geometry is flattened into world space on the CPU and re-uploaded only
//! when the scene revision changes; the camera uniform is written every
//! frame.

use glam::{Mat3, Vec3};
use rustc_hash::FxHashMap;

use super::postprocess::{Pass, PassContext, PassDescriptor, PassIo, PassOutput};
use crate::camera::CameraUniform;
use crate::error::OrbitError;
use crate::gpu::backend::{GpuFrame, WgpuBackend};
use crate::gpu::dynamic_buffer::GrowableBuffer;
use crate::gpu::pipeline_helpers::{color_attachment, uniform_buffer};
use crate::gpu::texture::{create_depth_view, ColorTarget, DEPTH_FORMAT};
use crate::scene::{Light, Scene};

/// Directional lights the shader evaluates; extras are dropped with a
/// warning.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

/// Vertex layout of the scene program.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// World-space unit normal.
    pub normal: [f32; 3],
    /// Linear RGBA base color.
    pub color: [f32; 4],
}

impl SceneVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x4];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// One directional light as the shader sees it.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalLightUniform {
    /// `rgb` = color × intensity.
    pub color: [f32; 4],
    /// `xyz` = unit vector toward the light.
    pub direction: [f32; 4],
}

/// Lights uniform block (`Lights` in the scene program).
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightsUniform {
    /// Summed ambient irradiance in `rgb`.
    pub ambient: [f32; 4],
    /// Directional lights; only the first `count[0]` are read.
    pub directional: [DirectionalLightUniform; MAX_DIRECTIONAL_LIGHTS],
    /// `x` = number of directional lights in use.
    pub count: [u32; 4],
}

impl LightsUniform {
    /// Pack the scene's visible lights. Ambient lights add up; directional
    /// lights keep registration order.
    #[must_use]
    pub fn from_scene(scene: &Scene) -> Self {
        let mut uniform = Self::default();
        let mut count = 0;
        for light in scene.visible_lights() {
            match *light {
                Light::Ambient { color, intensity } => {
                    for (acc, c) in uniform.ambient.iter_mut().zip(color) {
                        *acc += c * intensity;
                    }
                }
                Light::Directional {
                    color,
                    intensity,
                    position,
                } => {
                    if count == MAX_DIRECTIONAL_LIGHTS {
                        log::warn!(
                            "more than {MAX_DIRECTIONAL_LIGHTS} directional lights, extra ignored"
                        );
                        continue;
                    }
                    let rgb = Vec3::from_array(color) * intensity;
                    uniform.directional[count] = DirectionalLightUniform {
                        color: rgb.extend(1.0).to_array(),
                        direction: position.normalize_or(Vec3::Y).extend(0.0).to_array(),
                    };
                    count += 1;
                }
            }
        }
        uniform.count[0] = count as u32;
        uniform
    }
}

/// Flatten every visible mesh into one world-space vertex/index list.
/// Triangles referencing missing vertices are dropped.
#[must_use]
pub fn flatten_geometry(scene: &Scene) -> (Vec<SceneVertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    for world in scene.world_meshes() {
        let mesh = world.mesh;
        let normal_matrix = Mat3::from_mat4(world.transform).inverse().transpose();
        let base = vertices.len() as u32;
        vertices.extend(mesh.positions.iter().zip(&mesh.normals).map(|(p, n)| {
            SceneVertex {
                position: world.transform.transform_point3(Vec3::from_array(*p)).to_array(),
                normal: (normal_matrix * Vec3::from_array(*n))
                    .normalize_or(Vec3::Y)
                    .to_array(),
                color: mesh.color,
            }
        }));
        let len = mesh.positions.len() as u32;
        indices.extend(
            mesh.indices
                .chunks_exact(3)
                .filter(|tri| tri.iter().all(|&i| i < len))
                .flatten()
                .map(|&i| base + i),
        );
    }
    (vertices, indices)
}

/// wgpu pass drawing the scene graph.
pub struct ScenePass {
    label: String,
    shader: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    camera_buffer: wgpu::Buffer,
    lights_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    vertices: GrowableBuffer<SceneVertex>,
    indices: GrowableBuffer<u32>,
    /// Scene revision the GPU buffers reflect.
    uploaded_revision: Option<u64>,
    sample_count: u32,
    size: (u32, u32),
    depth_view: wgpu::TextureView,
    /// Multisampled color buffer resolved into the pass output.
    msaa_target: Option<ColorTarget>,
}

impl ScenePass {
    /// Compose the scene program and allocate the camera and lights
    /// uniforms.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Shader`] if the program fails to compose.
    pub fn new(backend: &WgpuBackend, descriptor: &PassDescriptor) -> Result<Self, OrbitError> {
        let device = backend.device();
        let label = descriptor.label.clone();
        let shader = backend.compose(&format!("{label} Shader"), &descriptor.program)?;

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} Bind Group Layout")),
            entries: &[
                uniform_buffer(0, wgpu::ShaderStages::VERTEX_FRAGMENT),
                uniform_buffer(1, wgpu::ShaderStages::FRAGMENT),
            ],
        });
        let camera_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Camera Uniform"),
            size: size_of::<CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let lights_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lights Uniform"),
            size: size_of::<LightsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} Bind Group")),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: lights_buffer.as_entire_binding(),
                },
            ],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{label} Pipeline Layout")),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let sample_count = backend.msaa_samples();
        let mut pass = Self {
            shader,
            pipeline_layout,
            pipelines: FxHashMap::default(),
            camera_buffer,
            lights_buffer,
            bind_group,
            vertices: GrowableBuffer::with_capacity(
                device,
                "Scene Vertices",
                0,
                wgpu::BufferUsages::VERTEX,
            ),
            indices: GrowableBuffer::with_capacity(
                device,
                "Scene Indices",
                0,
                wgpu::BufferUsages::INDEX,
            ),
            uploaded_revision: None,
            sample_count,
            size: (1, 1),
            depth_view: create_depth_view(device, (1, 1), sample_count),
            msaa_target: None,
            label,
        };
        let _ = pass.pipeline(device, backend.intermediate_format());
        Ok(pass)
    }

    fn pipeline(
        &mut self,
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
    ) -> &wgpu::RenderPipeline {
        let Self {
            pipelines,
            label,
            shader,
            pipeline_layout,
            sample_count,
            ..
        } = self;
        pipelines.entry(format).or_insert_with(|| {
            log::debug!("{label}: building pipeline for {format:?} ({sample_count}x)");
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(&format!("{label} Pipeline ({format:?})")),
                layout: Some(&*pipeline_layout),
                vertex: wgpu::VertexState {
                    module: shader,
                    entry_point: Some("vs_main"),
                    buffers: &[SceneVertex::layout()],
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: shader,
                    entry_point: Some("fs_main"),
                    targets: &[Some(wgpu::ColorTargetState {
                        format,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    cull_mode: None,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: DEPTH_FORMAT,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::Less,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                multisample: wgpu::MultisampleState {
                    count: *sample_count,
                    ..Default::default()
                },
                multiview: None,
                cache: None,
            })
        })
    }

    /// Re-upload geometry and lights if the scene changed since the last
    /// upload.
    fn sync_scene(&mut self, backend: &WgpuBackend, scene: &Scene) {
        if self.uploaded_revision == Some(scene.revision()) {
            return;
        }
        let (device, queue) = (backend.device(), backend.queue());
        let (vertices, indices) = flatten_geometry(scene);
        log::debug!(
            "{}: uploading {} vertices, {} triangles (revision {})",
            self.label,
            vertices.len(),
            indices.len() / 3,
            scene.revision()
        );
        let _ = self.vertices.write(device, queue, &vertices);
        let _ = self.indices.write(device, queue, &indices);
        queue.write_buffer(
            &self.lights_buffer,
            0,
            bytemuck::bytes_of(&LightsUniform::from_scene(scene)),
        );
        self.uploaded_revision = Some(scene.revision());
    }
}

impl Pass<WgpuBackend> for ScenePass {
    fn set_size(&mut self, backend: &WgpuBackend, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        self.depth_view = create_depth_view(backend.device(), self.size, self.sample_count);
        self.msaa_target = None;
    }

    fn render(
        &mut self,
        backend: &WgpuBackend,
        frame: &mut GpuFrame,
        ctx: &PassContext<'_>,
        _descriptor: &PassDescriptor,
        io: PassIo<'_, ColorTarget>,
    ) {
        let device = backend.device();
        self.sync_scene(backend, ctx.scene);
        let mut camera = CameraUniform::new();
        camera.update_view_proj(ctx.camera);
        backend
            .queue()
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera));

        let (output, format) = match io.output {
            PassOutput::Target(target) => (&target.view, target.format),
            PassOutput::Screen => (&frame.view, frame.format),
        };
        if self.sample_count > 1
            && !self
                .msaa_target
                .as_ref()
                .is_some_and(|t| t.matches(self.size, format, self.sample_count))
        {
            self.msaa_target = Some(ColorTarget::new(
                device,
                "Scene MSAA Color",
                self.size,
                format,
                self.sample_count,
            ));
        }
        let _ = self.pipeline(device, format);
        let Some(pipeline) = self.pipelines.get(&format) else {
            return;
        };

        let [r, g, b] = ctx.scene.clear_color();
        let clear = wgpu::Color {
            r: f64::from(r),
            g: f64::from(g),
            b: f64::from(b),
            a: 1.0,
        };
        let attachment = match &self.msaa_target {
            Some(msaa) if self.sample_count > 1 => {
                color_attachment(&msaa.view, Some(output), Some(clear))
            }
            _ => color_attachment(output, None, Some(clear)),
        };

        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&self.label),
            color_attachments: &[Some(attachment)],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        if self.indices.is_empty() {
            return;
        }
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &self.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertices.buffer().slice(..));
        render_pass.set_index_buffer(self.indices.buffer().slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..self.indices.count() as u32, 0, 0..1);
    }
}
