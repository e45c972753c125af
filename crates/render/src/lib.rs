#![warn(missing_docs)]
//! Shadow-mapped rendering of voxel terrain and simple props.
//!
//! Passes drive a [`GpuDevice`]; [`WgpuDevice`] renders to a window and
//! [`RecordingDevice`] captures the same calls for tests and headless runs.

mod camera;
mod context;
mod frame;
mod framebuffer;
mod gpu;
mod light;
mod mesh;
mod model;
mod passes;
pub mod primitives;
mod recording;
mod scene;
mod shader;
mod texture;
mod uniforms;
mod wgpu_backend;

pub use camera::{Camera, CameraMovement, FOV_RANGE, MAX_PITCH};
pub use context::{RenderContext, DIFFUSE_UNIT, SHADOW_UNIT, SPECULAR_UNIT};
pub use frame::{FrameDriver, FrameStats};
pub use framebuffer::DepthFramebuffer;
pub use gpu::{
    validate_wgsl, BufferId, ClearFlags, DepthFormat, DepthTargetId, GpuDevice, GpuError,
    ProgramDesc, ProgramId, RenderTarget, ShadingMode, TextureDesc, TextureId, UniformValue,
    VertexAttribute, VertexLayout,
};
pub use light::{Attenuation, DirectionalLight, Light, SpotLight};
pub use mesh::DrawableMesh;
pub use model::{Material, Model, Transform};
pub use passes::{DepthMapPass, DrawObjectsPass, PassState, ShadowSettings};
pub use recording::{GpuCommand, RecordingDevice, DEFAULT_MAX_TEXTURE_DIMENSION};
pub use scene::Scene;
pub use shader::{Shader, DEPTH_SHADER_SOURCE, MATERIAL_SHADER_SOURCE};
pub use texture::{noise_image, NoiseTextureParams, Texture};
pub use uniforms::{UniformBlock, UniformField, UniformKind, UniformLayout};
pub use wgpu_backend::WgpuDevice;
