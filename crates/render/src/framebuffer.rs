use crate::gpu::{DepthFormat, DepthTargetId, GpuDevice, GpuError, TextureId};

/// Off-screen depth-only target whose depth can be sampled later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthFramebuffer {
    target: DepthTargetId,
    texture: TextureId,
    width: u32,
    height: u32,
    format: DepthFormat,
}

impl DepthFramebuffer {
    /// Create a `width` x `height` depth target.
    ///
    /// Fails with [`GpuError::FramebufferIncomplete`] for zero or oversized dimensions.
    pub fn new(
        gpu: &mut dyn GpuDevice,
        width: u32,
        height: u32,
        format: DepthFormat,
    ) -> Result<Self, GpuError> {
        let (target, texture) = gpu.create_depth_target(width, height, format)?;
        tracing::info!(width, height, ?format, "depth framebuffer ready");
        Ok(Self {
            target,
            texture,
            width,
            height,
            format,
        })
    }

    /// Render target handle.
    pub fn target(&self) -> DepthTargetId {
        self.target
    }

    /// Sampled depth texture.
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Depth precision.
    pub fn format(&self) -> DepthFormat {
        self.format
    }
}
