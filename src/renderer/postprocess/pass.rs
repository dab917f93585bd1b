//! The pass contract: descriptors, the [`Pass`] trait each stage implements
//! and the [`Backend`] trait that creates targets and runs frames.

use std::borrow::Cow;

use super::uniforms::Uniforms;
use crate::camera::core::Camera;
use crate::error::{FrameError, OrbitError};
use crate::scene::Scene;

/// An offscreen buffer a pass can render into or sample from.
pub trait RenderTarget {
    /// Current resolution in device pixels.
    fn size(&self) -> (u32, u32);
}

/// Rendering backend the chain runs on.
///
/// The wgpu implementation lives in [`crate::gpu::backend`]; tests use a
/// recording double. A backend owns the presentation surface, hands out one
/// `Frame` per tick, and builds the concrete pass implementations.
pub trait Backend: Sized {
    /// Offscreen buffer type.
    type Target: RenderTarget;
    /// Per-frame recording state (command encoder plus screen target).
    type Frame;

    /// Allocate an offscreen buffer.
    fn create_target(&self, label: &str, width: u32, height: u32) -> Self::Target;

    /// Resize the presentation surface to the drawable size.
    fn resize_surface(&mut self, width: u32, height: u32);

    /// Acquire the next frame.
    ///
    /// # Errors
    ///
    /// [`FrameError`] if no frame could be acquired; the caller skips
    /// rendering for this tick.
    fn begin_frame(&mut self) -> Result<Self::Frame, FrameError>;

    /// Submit and present a frame.
    fn end_frame(&mut self, frame: Self::Frame);

    /// Build the pass implementing `kind` for the given descriptor.
    ///
    /// # Errors
    ///
    /// [`OrbitError`] if the pass's program fails to compile.
    fn create_pass(
        &self,
        kind: PassKind,
        descriptor: &PassDescriptor,
    ) -> Result<Box<dyn Pass<Self>>, OrbitError>;
}

/// What a pass does with its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Renders the scene through the camera; ignores its input.
    Scene,
    /// Full-screen shader reading the previous pass's output.
    Shader,
}

/// Opaque shader program artifact: a WGSL module exposing `vs_main` and
/// `fs_main`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    /// Name used for labels and composer diagnostics.
    pub name: Cow<'static, str>,
    /// WGSL source (may contain naga-oil `#import` directives).
    pub source: Cow<'static, str>,
}

impl ShaderProgram {
    /// A program from static WGSL.
    #[must_use]
    pub const fn from_static(name: &'static str, source: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
            source: Cow::Borrowed(source),
        }
    }
}

/// One entry of the chain: program, uniform mapping, enabled flag.
#[derive(Debug, Clone, PartialEq)]
pub struct PassDescriptor {
    /// Human-readable label.
    pub label: String,
    /// Shader program executed by the pass.
    pub program: ShaderProgram,
    /// Uniform mapping written by the host before each render.
    pub uniforms: Uniforms,
    /// Disabled passes are skipped without breaking buffer hand-off.
    pub enabled: bool,
}

impl PassDescriptor {
    /// An enabled descriptor.
    #[must_use]
    pub fn new(label: impl Into<String>, program: ShaderProgram, uniforms: Uniforms) -> Self {
        Self {
            label: label.into(),
            program,
            uniforms,
            enabled: true,
        }
    }
}

/// Where a pass writes.
pub enum PassOutput<'a, T> {
    /// An intermediate buffer consumed by the next pass.
    Target(&'a T),
    /// The visible surface (terminal pass).
    Screen,
}

/// Buffers handed to a pass for one render.
pub struct PassIo<'a, T> {
    /// Output of the previous enabled pass (`None` for the first one).
    pub input: Option<&'a T>,
    /// Destination of this pass.
    pub output: PassOutput<'a, T>,
}

/// Scene and camera shared by every pass of one render.
pub struct PassContext<'a> {
    /// Scene being rendered.
    pub scene: &'a Scene,
    /// Camera the scene is viewed through.
    pub camera: &'a Camera,
}

/// Uniform interface for chain passes.
pub trait Pass<B: Backend> {
    /// Recreate resolution-dependent resources. Called for every pass,
    /// enabled or not, whenever the chain size changes.
    fn set_size(&mut self, backend: &B, width: u32, height: u32);

    /// Encode this pass into the frame.
    fn render(
        &mut self,
        backend: &B,
        frame: &mut B::Frame,
        ctx: &PassContext<'_>,
        descriptor: &PassDescriptor,
        io: PassIo<'_, B::Target>,
    );
}
