//! The wgpu implementation of the chain's [`Backend`].

use std::cell::RefCell;

use super::render_context::RenderContext;
use super::shader_composer::ShaderComposer;
use super::texture::ColorTarget;
use crate::error::{FrameError, OrbitError};
use crate::options::DisplayOptions;
use crate::renderer::postprocess::screen_pass::ScreenShaderPass;
use crate::renderer::postprocess::{Backend, Pass, PassDescriptor, PassKind, ShaderProgram};
use crate::renderer::scene_pass::ScenePass;

/// One frame being recorded: the command encoder plus the acquired
/// swapchain texture.
pub struct GpuFrame {
    /// Encoder every pass records into.
    pub encoder: wgpu::CommandEncoder,
    /// View of the swapchain texture (terminal pass target).
    pub view: wgpu::TextureView,
    /// Format of the swapchain texture.
    pub format: wgpu::TextureFormat,
    surface_texture: wgpu::SurfaceTexture,
}

/// wgpu device, surface and shader composer shared by every pass.
pub struct WgpuBackend {
    context: RenderContext,
    composer: RefCell<ShaderComposer>,
    msaa_samples: u32,
}

impl WgpuBackend {
    /// Wrap an initialized render context.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Shader`] if the shared shader modules fail to load.
    pub fn new(context: RenderContext, display: &DisplayOptions) -> Result<Self, OrbitError> {
        let msaa_samples = context.msaa_samples(display.effective_msaa_samples());
        Ok(Self {
            context,
            composer: RefCell::new(ShaderComposer::new()?),
            msaa_samples,
        })
    }

    /// The underlying render context.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// The wgpu device.
    #[must_use]
    pub fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    /// The wgpu queue.
    #[must_use]
    pub fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }

    /// Sample count used by the scene pass.
    #[must_use]
    pub fn msaa_samples(&self) -> u32 {
        self.msaa_samples
    }

    /// Format of the chain's offscreen buffers.
    #[must_use]
    pub fn intermediate_format(&self) -> wgpu::TextureFormat {
        self.context.intermediate_format()
    }

    /// Compose a pass program into a shader module.
    ///
    /// # Errors
    ///
    /// [`OrbitError::Shader`] if composition fails.
    pub fn compose(
        &self,
        label: &str,
        program: &ShaderProgram,
    ) -> Result<wgpu::ShaderModule, OrbitError> {
        self.composer
            .borrow_mut()
            .compose(&self.context.device, label, program)
    }
}

impl Backend for WgpuBackend {
    type Target = ColorTarget;
    type Frame = GpuFrame;

    fn create_target(&self, label: &str, width: u32, height: u32) -> ColorTarget {
        ColorTarget::new(
            &self.context.device,
            label,
            (width, height),
            self.context.intermediate_format(),
            1,
        )
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.context.resize(width, height);
    }

    fn begin_frame(&mut self) -> Result<GpuFrame, FrameError> {
        let surface_texture = match self.context.get_next_frame() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.context.reconfigure();
                return Err(FrameError::SurfaceReconfigured);
            }
            Err(wgpu::SurfaceError::Timeout) => return Err(FrameError::Timeout),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                return Err(FrameError::OutOfMemory)
            }
            Err(other) => return Err(FrameError::Other(other.to_string())),
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuFrame {
            encoder: self.context.create_encoder(),
            view,
            format: self.context.format(),
            surface_texture,
        })
    }

    fn end_frame(&mut self, frame: GpuFrame) {
        let GpuFrame {
            encoder,
            surface_texture,
            ..
        } = frame;
        self.context.submit(encoder);
        surface_texture.present();
    }

    fn create_pass(
        &self,
        kind: PassKind,
        descriptor: &PassDescriptor,
    ) -> Result<Box<dyn Pass<Self>>, OrbitError> {
        let pass: Box<dyn Pass<Self>> = match kind {
            PassKind::Scene => Box::new(ScenePass::new(self, descriptor)?),
            PassKind::Shader => Box::new(ScreenShaderPass::new(self, descriptor)?),
        };
        Ok(pass)
    }
}
