//! Offscreen color and depth textures.

use crate::renderer::postprocess::RenderTarget;

/// Depth format used by the scene pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A color texture and its default view.
///
/// Single-sampled targets are created with
/// `RENDER_ATTACHMENT | TEXTURE_BINDING` usage so a later pass can sample
/// them; multisampled ones are render attachments only and must be
/// resolved.
pub struct ColorTarget {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
    /// Texel format.
    pub format: wgpu::TextureFormat,
    width: u32,
    height: u32,
    sample_count: u32,
}

impl ColorTarget {
    /// Create a color target (dimensions clamped to at least 1).
    #[must_use]
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        (width, height): (u32, u32),
        format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let usage = if sample_count > 1 {
            wgpu::TextureUsages::RENDER_ATTACHMENT
        } else {
            wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            format,
            width,
            height,
            sample_count,
        }
    }

    /// MSAA sample count.
    #[must_use]
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    /// Whether this target can stand in for one of the given shape.
    #[must_use]
    pub fn matches(&self, size: (u32, u32), format: wgpu::TextureFormat, sample_count: u32) -> bool {
        self.size() == size && self.format == format && self.sample_count == sample_count
    }
}

impl RenderTarget for ColorTarget {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Create a depth attachment view matching a color target's shape.
#[must_use]
pub fn create_depth_view(
    device: &wgpu::Device,
    (width, height): (u32, u32),
    sample_count: u32,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Scene Depth"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
