//! The GPU primitive surface the render passes drive.
//!
//! State is bound immediate-mode style: a viewport, a render target, a program
//! and texture units are set, then `draw` consumes whatever is current. Two
//! devices implement it: [`crate::WgpuDevice`] on real hardware and
//! [`crate::RecordingDevice`] for tests and headless capture.

use std::path::PathBuf;

use bitflags::bitflags;
use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use wgpu::naga;

/// Compiled shader program handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ProgramId(pub u32);

/// Vertex buffer handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BufferId(pub u32);

/// Sampled texture handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TextureId(pub u32);

/// Depth-only render target handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DepthTargetId(pub u32);

/// Where draws land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RenderTarget {
    /// The window surface plus its scene depth buffer.
    Default,
    /// An off-screen depth target.
    Depth(DepthTargetId),
}

bitflags! {
    /// Buffers affected by [`GpuDevice::clear`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct ClearFlags: u8 {
        /// Clear the color attachment.
        const COLOR = 0b01;
        /// Clear the depth attachment.
        const DEPTH = 0b10;
    }
}

/// A value for a named shader uniform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum UniformValue {
    /// Signed integer (texture unit indices, light kinds).
    Int(i32),
    /// Scalar.
    Float(f32),
    /// Three-component vector.
    Vec3(Vec3),
    /// Column-major 4x4 matrix.
    Mat4(Mat4),
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        Self::Vec3(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        Self::Mat4(value)
    }
}

/// How a program shades, which fixes its uniform layout and bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingMode {
    /// Position-only program writing depth from the light's point of view.
    DepthOnly,
    /// Lit, textured program that samples the shadow map.
    Material,
}

/// One attribute of an interleaved `f32` vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    /// Number of `f32` components.
    pub components: u32,
    /// Offset in floats from the start of the vertex.
    pub offset: u32,
}

/// Interleaved `f32` vertex layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexLayout {
    /// Floats per vertex.
    pub stride: u32,
    /// Attributes in location order.
    pub attributes: &'static [VertexAttribute],
}

const POSITION_NORMAL_UV: [VertexAttribute; 3] = [
    VertexAttribute {
        location: 0,
        components: 3,
        offset: 0,
    },
    VertexAttribute {
        location: 1,
        components: 3,
        offset: 3,
    },
    VertexAttribute {
        location: 2,
        components: 2,
        offset: 6,
    },
];

impl VertexLayout {
    /// `position(3) normal(3) uv(2)`, the layout of every mesh in the scene.
    pub const fn position_normal_uv() -> Self {
        Self {
            stride: 8,
            attributes: &POSITION_NORMAL_UV,
        }
    }
}

/// Depth target precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepthFormat {
    /// 16-bit normalized depth.
    Depth16,
    /// 32-bit float depth.
    #[default]
    Depth32,
}

impl DepthFormat {
    /// Matching wgpu texture format.
    pub fn texture_format(self) -> wgpu::TextureFormat {
        match self {
            DepthFormat::Depth16 => wgpu::TextureFormat::Depth16Unorm,
            DepthFormat::Depth32 => wgpu::TextureFormat::Depth32Float,
        }
    }
}

/// Program creation request.
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    /// Name used in logs and errors.
    pub name: &'a str,
    /// WGSL source with `vs_main` and, for material programs, `fs_main`.
    pub source: &'a str,
    /// Shading mode.
    pub mode: ShadingMode,
}

/// RGBA8 texture creation request.
#[derive(Debug, Clone, Copy)]
pub struct TextureDesc<'a> {
    /// Debug label.
    pub label: &'a str,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed RGBA8 pixels, `width * height * 4` bytes.
    pub pixels: &'a [u8],
}

/// Errors raised while creating GPU resources or presenting.
#[derive(Debug, Error)]
pub enum GpuError {
    /// WGSL source failed to parse.
    #[error("shader `{name}` failed to compile:\n{log}")]
    ShaderCompile {
        /// Program name.
        name: String,
        /// Compiler diagnostics.
        log: String,
    },
    /// WGSL parsed but the program could not be validated or linked into a pipeline.
    #[error("shader `{name}` failed to link:\n{log}")]
    ShaderLink {
        /// Program name.
        name: String,
        /// Validator diagnostics.
        log: String,
    },
    /// Shader source could not be read.
    #[error("failed to read shader source {path}: {source}")]
    ShaderSource {
        /// Source path.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// Image could not be opened or decoded.
    #[error("failed to decode image {path}: {source}")]
    ImageDecode {
        /// Image path.
        path: PathBuf,
        /// Underlying decode error.
        source: image::ImageError,
    },
    /// A depth render target could not be created.
    #[error("framebuffer incomplete: {reason}")]
    FramebufferIncomplete {
        /// Why the target was rejected.
        reason: String,
    },
    /// Vertex data length is not a multiple of the layout stride.
    #[error("vertex data of {len} floats is not a multiple of stride {stride}")]
    InvalidVertexData {
        /// Float count supplied.
        len: usize,
        /// Floats per vertex.
        stride: u32,
    },
    /// Texture pixels do not match the declared size.
    #[error("texture `{label}` expects {expected} bytes, got {found}")]
    InvalidTextureData {
        /// Texture label.
        label: String,
        /// Bytes implied by width and height.
        expected: usize,
        /// Bytes supplied.
        found: usize,
    },
    /// The backend only understands the standard mesh layout.
    #[error("unsupported vertex layout with stride {stride}")]
    UnsupportedLayout {
        /// Floats per vertex in the rejected layout.
        stride: u32,
    },
    /// Acquiring or presenting the swapchain image failed.
    #[error(transparent)]
    Surface(#[from] wgpu::SurfaceError),
    /// The window surface could not be created.
    #[error("failed to create window surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    /// No adapter can present to the window surface.
    #[error("no suitable GPU adapter found")]
    AdapterUnavailable,
    /// The adapter refused to open a device.
    #[error("failed to open GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
}

/// Immediate-mode GPU operations used by the render passes.
pub trait GpuDevice {
    /// Set the viewport for subsequent draws.
    fn set_viewport(&mut self, width: u32, height: u32);
    /// Redirect subsequent clears and draws.
    fn bind_render_target(&mut self, target: RenderTarget);
    /// Clear the selected buffers of the bound target.
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]);
    /// Enable depth testing (less-than) and depth writes.
    fn enable_depth_test(&mut self);
    /// Make `program` current for subsequent draws.
    fn use_program(&mut self, program: ProgramId);
    /// Set a named uniform of `program`. Names the program does not declare are ignored.
    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue);
    /// Attach a texture to a sampling unit.
    fn bind_texture(&mut self, unit: u32, texture: TextureId);
    /// Draw `vertex_count` vertices from `buffer` as a triangle list.
    fn draw(&mut self, buffer: BufferId, vertex_count: u32);
    /// Finish the frame and show it.
    fn present(&mut self) -> Result<(), GpuError>;

    /// Compile and link a program.
    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, GpuError>;
    /// Upload interleaved vertex data.
    fn create_vertex_buffer(
        &mut self,
        data: &[f32],
        layout: VertexLayout,
    ) -> Result<BufferId, GpuError>;
    /// Free a vertex buffer.
    fn destroy_vertex_buffer(&mut self, buffer: BufferId);
    /// Upload an RGBA8 texture.
    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId, GpuError>;
    /// Create a depth-only target plus the texture it can be sampled through.
    fn create_depth_target(
        &mut self,
        width: u32,
        height: u32,
        format: DepthFormat,
    ) -> Result<(DepthTargetId, TextureId), GpuError>;

    /// Resize the default target.
    fn resize(&mut self, width: u32, height: u32);
    /// Current default target size.
    fn surface_size(&self) -> (u32, u32);
}

/// Entry points every program of a mode must export.
pub(crate) fn required_entry_points(mode: ShadingMode) -> &'static [(&'static str, naga::ShaderStage)] {
    match mode {
        ShadingMode::DepthOnly => &[("vs_main", naga::ShaderStage::Vertex)],
        ShadingMode::Material => &[
            ("vs_main", naga::ShaderStage::Vertex),
            ("fs_main", naga::ShaderStage::Fragment),
        ],
    }
}

/// Parse and validate WGSL the way both devices do before accepting a program.
///
/// Parse failures are compile errors; validation failures and missing entry
/// points are link errors.
pub fn validate_wgsl(name: &str, source: &str, mode: ShadingMode) -> Result<naga::Module, GpuError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|err| GpuError::ShaderCompile {
        name: name.to_string(),
        log: err.emit_to_string(source),
    })?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|err| GpuError::ShaderLink {
            name: name.to_string(),
            log: err.emit_to_string(source),
        })?;

    for (entry, stage) in required_entry_points(mode) {
        let found = module
            .entry_points
            .iter()
            .any(|ep| ep.name == *entry && ep.stage == *stage);
        if !found {
            return Err(GpuError::ShaderLink {
                name: name.to_string(),
                log: format!("missing {stage:?} entry point `{entry}`"),
            });
        }
    }

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_is_compile_failure() {
        let err = validate_wgsl("broken", "fn vs_main( {", ShadingMode::DepthOnly).unwrap_err();
        assert!(matches!(err, GpuError::ShaderCompile { ref name, .. } if name == "broken"));
    }

    #[test]
    fn missing_fragment_entry_is_link_failure() {
        let source = "@vertex fn vs_main() -> @builtin(position) vec4<f32> { return vec4<f32>(0.0); }";
        validate_wgsl("depth", source, ShadingMode::DepthOnly).unwrap();
        let err = validate_wgsl("material", source, ShadingMode::Material).unwrap_err();
        assert!(matches!(err, GpuError::ShaderLink { .. }));
    }

    #[test]
    fn standard_layout_is_eight_floats() {
        let layout = VertexLayout::position_normal_uv();
        assert_eq!(layout.stride, 8);
        let total: u32 = layout.attributes.iter().map(|a| a.components).sum();
        assert_eq!(total, layout.stride);
    }

    #[test]
    fn clear_flags_combine() {
        let flags = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert!(flags.contains(ClearFlags::DEPTH));
        assert!(!ClearFlags::DEPTH.contains(ClearFlags::COLOR));
    }
}
