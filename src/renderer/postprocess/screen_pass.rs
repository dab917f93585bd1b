//! Full-screen shader pass: samples the previous pass's frame and writes a
//! transformed copy. Drives both the gamma correction and the custom
//! effect; the program and its uniform mapping come from the descriptor.

use rustc_hash::FxHashMap;

use super::pass::{Pass, PassContext, PassDescriptor, PassIo, PassOutput};
use crate::error::OrbitError;
use crate::gpu::backend::{GpuFrame, WgpuBackend};
use crate::gpu::pipeline_helpers::{
    color_attachment, create_screen_space_pipeline, linear_sampler, screen_pass_layout,
};
use crate::gpu::texture::ColorTarget;

/// wgpu pass running a descriptor's full-screen program.
pub struct ScreenShaderPass {
    label: String,
    shader: wgpu::ShaderModule,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_buffer: Option<wgpu::Buffer>,
    /// Pipelines per output format: intermediate buffers and the swapchain
    /// may differ.
    pipelines: FxHashMap<wgpu::TextureFormat, wgpu::RenderPipeline>,
    /// Sampled when the pass runs first in the chain.
    fallback_input: ColorTarget,
}

impl ScreenShaderPass {
    /// Compose the descriptor's program and allocate its uniform block.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Shader`] if the program fails to compose.
    pub fn new(backend: &WgpuBackend, descriptor: &PassDescriptor) -> Result<Self, OrbitError> {
        let device = backend.device();
        let label = descriptor.label.clone();
        let shader = backend.compose(&format!("{label} Shader"), &descriptor.program)?;

        let params = descriptor.uniforms.to_std140_bytes();
        let has_params = descriptor.uniforms.iter().any(|(_, v)| !v.is_texture());
        let params_buffer = has_params.then(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("{label} Params")),
                size: params.len() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        });

        let fallback_input = ColorTarget::new(
            device,
            &format!("{label} Empty Input"),
            (1, 1),
            backend.intermediate_format(),
            1,
        );

        let mut pass = Self {
            bind_group_layout: screen_pass_layout(device, &label, has_params),
            sampler: linear_sampler(device, &format!("{label} Sampler")),
            shader,
            params_buffer,
            pipelines: FxHashMap::default(),
            fallback_input,
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
            bind_group_layout,
            ..
        } = self;
        pipelines.entry(format).or_insert_with(|| {
            log::debug!("{label}: building pipeline for {format:?}");
            create_screen_space_pipeline(device, label, shader, format, &[&*bind_group_layout])
        })
    }
}

impl Pass<WgpuBackend> for ScreenShaderPass {
    fn set_size(&mut self, _backend: &WgpuBackend, _width: u32, _height: u32) {
        // Reads and writes chain-owned buffers only; the bind group is
        // rebuilt per render, so there is nothing resolution-dependent here.
    }

    fn render(
        &mut self,
        backend: &WgpuBackend,
        frame: &mut GpuFrame,
        _ctx: &PassContext<'_>,
        descriptor: &PassDescriptor,
        io: PassIo<'_, ColorTarget>,
    ) {
        let device = backend.device();
        if let Some(buffer) = &self.params_buffer {
            backend
                .queue()
                .write_buffer(buffer, 0, &descriptor.uniforms.to_std140_bytes());
        }

        let input = io.input.unwrap_or(&self.fallback_input);
        let mut entries = vec![
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&input.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&self.sampler),
            },
        ];
        if let Some(buffer) = &self.params_buffer {
            entries.push(wgpu::BindGroupEntry {
                binding: 2,
                resource: buffer.as_entire_binding(),
            });
        }
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", self.label)),
            layout: &self.bind_group_layout,
            entries: &entries,
        });

        let (view, format) = match io.output {
            PassOutput::Target(target) => (&target.view, target.format),
            PassOutput::Screen => (&frame.view, frame.format),
        };
        let label = self.label.clone();
        let pipeline = self.pipeline(device, format);

        let mut render_pass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(&label),
            color_attachments: &[Some(color_attachment(view, None, Some(wgpu::Color::BLACK)))],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        render_pass.set_pipeline(pipeline);
        render_pass.set_bind_group(0, &bind_group, &[]);
        render_pass.draw(0..3, 0..1);
    }
}
