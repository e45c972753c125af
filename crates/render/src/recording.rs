//! A [`GpuDevice`] that records calls instead of touching hardware.

use std::collections::HashMap;

use serde::Serialize;

use crate::gpu::{
    validate_wgsl, BufferId, ClearFlags, DepthFormat, DepthTargetId, GpuDevice, GpuError,
    ProgramDesc, ProgramId, RenderTarget, ShadingMode, TextureDesc, TextureId, UniformValue,
    VertexLayout,
};
use crate::uniforms::{UniformBlock, UniformLayout};

/// Largest texture edge accepted unless overridden.
pub const DEFAULT_MAX_TEXTURE_DIMENSION: u32 = 8192;

/// One recorded device call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GpuCommand {
    /// [`GpuDevice::set_viewport`]
    SetViewport {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// [`GpuDevice::bind_render_target`]
    BindRenderTarget {
        /// Bound target.
        target: RenderTarget,
    },
    /// [`GpuDevice::clear`]
    Clear {
        /// Cleared buffers.
        flags: ClearFlags,
        /// Clear color.
        color: [f32; 4],
    },
    /// [`GpuDevice::enable_depth_test`]
    EnableDepthTest,
    /// [`GpuDevice::use_program`]
    UseProgram {
        /// Program made current.
        program: ProgramId,
    },
    /// [`GpuDevice::set_uniform`]
    SetUniform {
        /// Target program.
        program: ProgramId,
        /// Uniform name.
        name: String,
        /// Uploaded value.
        value: UniformValue,
        /// False when the program does not declare the name.
        applied: bool,
    },
    /// [`GpuDevice::bind_texture`]
    BindTexture {
        /// Sampling unit.
        unit: u32,
        /// Bound texture.
        texture: TextureId,
    },
    /// [`GpuDevice::draw`]
    Draw {
        /// Program current at draw time.
        program: Option<ProgramId>,
        /// Source buffer.
        buffer: BufferId,
        /// Vertices drawn.
        vertex_count: u32,
    },
    /// [`GpuDevice::present`]
    Present {
        /// Index of the presented frame.
        frame: u64,
    },
    /// [`GpuDevice::create_program`]
    CreateProgram {
        /// New handle.
        program: ProgramId,
        /// Program name.
        name: String,
        /// Shading mode.
        mode: ShadingMode,
    },
    /// [`GpuDevice::create_vertex_buffer`]
    CreateVertexBuffer {
        /// New handle.
        buffer: BufferId,
        /// Vertex count.
        vertices: u32,
    },
    /// [`GpuDevice::destroy_vertex_buffer`]
    DestroyVertexBuffer {
        /// Freed handle.
        buffer: BufferId,
    },
    /// [`GpuDevice::create_texture`]
    CreateTexture {
        /// New handle.
        texture: TextureId,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// [`GpuDevice::create_depth_target`]
    CreateDepthTarget {
        /// New target handle.
        target: DepthTargetId,
        /// Texture the target samples through.
        texture: TextureId,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Depth precision.
        format: DepthFormat,
    },
    /// [`GpuDevice::resize`]
    Resize {
        /// New width.
        width: u32,
        /// New height.
        height: u32,
    },
}

struct RecordedProgram {
    mode: ShadingMode,
    block: UniformBlock,
    values: HashMap<String, UniformValue>,
}

/// Records every call as a [`GpuCommand`] and tracks uniform state per program.
///
/// Shader sources are validated exactly like the wgpu backend, so compile and
/// link failures surface here too.
pub struct RecordingDevice {
    commands: Vec<GpuCommand>,
    programs: HashMap<ProgramId, RecordedProgram>,
    buffers: HashMap<BufferId, u32>,
    textures: u32,
    depth_targets: u32,
    next_program: u32,
    next_buffer: u32,
    current_program: Option<ProgramId>,
    frames: u64,
    size: (u32, u32),
    max_texture_dimension: u32,
}

impl Default for RecordingDevice {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl RecordingDevice {
    /// Create a recorder with a default target of `width` x `height`.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            commands: Vec::new(),
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: 0,
            depth_targets: 0,
            next_program: 0,
            next_buffer: 0,
            current_program: None,
            frames: 0,
            size: (width, height),
            max_texture_dimension: DEFAULT_MAX_TEXTURE_DIMENSION,
        }
    }

    /// Override the largest accepted texture edge.
    pub fn with_max_texture_dimension(mut self, max: u32) -> Self {
        self.max_texture_dimension = max;
        self
    }

    /// Every call recorded so far.
    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    /// Drain the recorded calls.
    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Last value applied to a program's uniform.
    pub fn uniform(&self, program: ProgramId, name: &str) -> Option<UniformValue> {
        self.programs
            .get(&program)
            .and_then(|p| p.values.get(name).copied())
    }

    /// Raw uniform block bytes of a program.
    pub fn uniform_bytes(&self, program: ProgramId) -> Option<&[u8]> {
        self.programs.get(&program).map(|p| p.block.bytes())
    }

    /// Shading mode a program was created with.
    pub fn program_mode(&self, program: ProgramId) -> Option<ShadingMode> {
        self.programs.get(&program).map(|p| p.mode)
    }

    /// Frames presented so far.
    pub fn frames_presented(&self) -> u64 {
        self.frames
    }

    /// Vertex buffers currently alive.
    pub fn live_buffers(&self) -> usize {
        self.buffers.len()
    }

    fn check_texture_size(&self, width: u32, height: u32) -> Result<(), GpuError> {
        if width == 0 || height == 0 {
            return Err(GpuError::FramebufferIncomplete {
                reason: format!("zero-sized attachment {width}x{height}"),
            });
        }
        if width > self.max_texture_dimension || height > self.max_texture_dimension {
            return Err(GpuError::FramebufferIncomplete {
                reason: format!(
                    "attachment {width}x{height} exceeds device limit {}",
                    self.max_texture_dimension
                ),
            });
        }
        Ok(())
    }
}

impl GpuDevice for RecordingDevice {
    fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(GpuCommand::SetViewport { width, height });
    }

    fn bind_render_target(&mut self, target: RenderTarget) {
        self.commands.push(GpuCommand::BindRenderTarget { target });
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]) {
        self.commands.push(GpuCommand::Clear { flags, color });
    }

    fn enable_depth_test(&mut self) {
        self.commands.push(GpuCommand::EnableDepthTest);
    }

    fn use_program(&mut self, program: ProgramId) {
        self.current_program = Some(program);
        self.commands.push(GpuCommand::UseProgram { program });
    }

    fn set_uniform(&mut self, program: ProgramId, name: &str, value: UniformValue) {
        let applied = match self.programs.get_mut(&program) {
            Some(recorded) => {
                let applied = recorded.block.set(name, value);
                if applied {
                    recorded.values.insert(name.to_string(), value);
                }
                applied
            }
            None => {
                tracing::warn!(?program, name, "uniform set on unknown program");
                false
            }
        };
        self.commands.push(GpuCommand::SetUniform {
            program,
            name: name.to_string(),
            value,
            applied,
        });
    }

    fn bind_texture(&mut self, unit: u32, texture: TextureId) {
        self.commands.push(GpuCommand::BindTexture { unit, texture });
    }

    fn draw(&mut self, buffer: BufferId, vertex_count: u32) {
        match self.buffers.get(&buffer) {
            Some(&available) if vertex_count > available => {
                tracing::warn!(?buffer, vertex_count, available, "draw exceeds buffer");
            }
            None => tracing::warn!(?buffer, "draw from unknown buffer"),
            _ => {}
        }
        self.commands.push(GpuCommand::Draw {
            program: self.current_program,
            buffer,
            vertex_count,
        });
    }

    fn present(&mut self) -> Result<(), GpuError> {
        self.commands.push(GpuCommand::Present { frame: self.frames });
        self.frames += 1;
        Ok(())
    }

    fn create_program(&mut self, desc: &ProgramDesc<'_>) -> Result<ProgramId, GpuError> {
        validate_wgsl(desc.name, desc.source, desc.mode)?;
        let program = ProgramId(self.next_program);
        self.next_program += 1;
        self.programs.insert(
            program,
            RecordedProgram {
                mode: desc.mode,
                block: UniformBlock::new(UniformLayout::for_mode(desc.mode)),
                values: HashMap::new(),
            },
        );
        self.commands.push(GpuCommand::CreateProgram {
            program,
            name: desc.name.to_string(),
            mode: desc.mode,
        });
        Ok(program)
    }

    fn create_vertex_buffer(
        &mut self,
        data: &[f32],
        layout: VertexLayout,
    ) -> Result<BufferId, GpuError> {
        let stride = layout.stride as usize;
        if stride == 0 || data.len() % stride != 0 {
            return Err(GpuError::InvalidVertexData {
                len: data.len(),
                stride: layout.stride,
            });
        }
        let buffer = BufferId(self.next_buffer);
        self.next_buffer += 1;
        let vertices = (data.len() / stride) as u32;
        self.buffers.insert(buffer, vertices);
        self.commands
            .push(GpuCommand::CreateVertexBuffer { buffer, vertices });
        Ok(buffer)
    }

    fn destroy_vertex_buffer(&mut self, buffer: BufferId) {
        if self.buffers.remove(&buffer).is_none() {
            tracing::warn!(?buffer, "destroying unknown vertex buffer");
        }
        self.commands.push(GpuCommand::DestroyVertexBuffer { buffer });
    }

    fn create_texture(&mut self, desc: &TextureDesc<'_>) -> Result<TextureId, GpuError> {
        let expected = desc.width as usize * desc.height as usize * 4;
        if desc.pixels.len() != expected {
            return Err(GpuError::InvalidTextureData {
                label: desc.label.to_string(),
                expected,
                found: desc.pixels.len(),
            });
        }
        let texture = TextureId(self.textures);
        self.textures += 1;
        self.commands.push(GpuCommand::CreateTexture {
            texture,
            width: desc.width,
            height: desc.height,
        });
        Ok(texture)
    }

    fn create_depth_target(
        &mut self,
        width: u32,
        height: u32,
        format: DepthFormat,
    ) -> Result<(DepthTargetId, TextureId), GpuError> {
        self.check_texture_size(width, height)?;
        let target = DepthTargetId(self.depth_targets);
        self.depth_targets += 1;
        let texture = TextureId(self.textures);
        self.textures += 1;
        self.commands.push(GpuCommand::CreateDepthTarget {
            target,
            texture,
            width,
            height,
            format,
        });
        Ok((target, texture))
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.commands.push(GpuCommand::Resize { width, height });
    }

    fn surface_size(&self) -> (u32, u32) {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shader::DEPTH_SHADER_SOURCE;
    use glam::Mat4;

    fn depth_program(gpu: &mut RecordingDevice) -> ProgramId {
        gpu.create_program(&ProgramDesc {
            name: "depth",
            source: DEPTH_SHADER_SOURCE,
            mode: ShadingMode::DepthOnly,
        })
        .unwrap()
    }

    #[test]
    fn tracks_applied_uniforms_only() {
        let mut gpu = RecordingDevice::default();
        let program = depth_program(&mut gpu);
        gpu.set_uniform(program, "model", Mat4::IDENTITY.into());
        gpu.set_uniform(program, "view_pos", glam::Vec3::ONE.into());

        assert_eq!(gpu.uniform(program, "model"), Some(UniformValue::Mat4(Mat4::IDENTITY)));
        assert_eq!(gpu.uniform(program, "view_pos"), None);
        assert!(matches!(
            gpu.commands().last(),
            Some(GpuCommand::SetUniform { applied: false, .. })
        ));
    }

    #[test]
    fn depth_target_limits() {
        let mut gpu = RecordingDevice::default().with_max_texture_dimension(1024);
        assert!(gpu.create_depth_target(1024, 1024, DepthFormat::Depth32).is_ok());
        assert!(matches!(
            gpu.create_depth_target(2048, 1024, DepthFormat::Depth16),
            Err(GpuError::FramebufferIncomplete { .. })
        ));
        assert!(matches!(
            gpu.create_depth_target(0, 16, DepthFormat::Depth32),
            Err(GpuError::FramebufferIncomplete { .. })
        ));
    }

    #[test]
    fn vertex_buffer_lifecycle() {
        let mut gpu = RecordingDevice::default();
        let layout = VertexLayout::position_normal_uv();
        assert!(matches!(
            gpu.create_vertex_buffer(&[0.0; 7], layout),
            Err(GpuError::InvalidVertexData { len: 7, stride: 8 })
        ));
        let buffer = gpu.create_vertex_buffer(&[0.0; 48], layout).unwrap();
        assert_eq!(gpu.live_buffers(), 1);
        gpu.destroy_vertex_buffer(buffer);
        assert_eq!(gpu.live_buffers(), 0);
    }

    #[test]
    fn commands_serialize_as_tagged_json() {
        let mut gpu = RecordingDevice::default();
        gpu.clear(ClearFlags::DEPTH, [0.0; 4]);
        gpu.present().unwrap();
        let json = serde_json::to_string(&gpu.take_commands()).unwrap();
        assert!(json.contains(r#""op":"clear""#));
        assert!(json.contains(r#""op":"present""#));
        assert!(gpu.commands().is_empty());
        assert_eq!(gpu.frames_presented(), 1);
    }
}
