//! Shader programs and typed uniform setters.

use std::fs;
use std::path::Path;

use glam::{Mat4, Vec3};

use crate::gpu::{GpuDevice, GpuError, ProgramDesc, ProgramId, ShadingMode, UniformValue};
use crate::light::{DirectionalLight, Light, SpotLight};

/// Built-in depth-only program source.
pub const DEPTH_SHADER_SOURCE: &str = include_str!("shaders/depth.wgsl");
/// Built-in lit material program source.
pub const MATERIAL_SHADER_SOURCE: &str = include_str!("shaders/material.wgsl");

const LIGHT_DIRECTIONAL: i32 = 0;
const LIGHT_SPOT: i32 = 1;

/// A compiled program together with its shading capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shader {
    program: ProgramId,
    name: String,
    mode: ShadingMode,
}

impl Shader {
    /// Compile `source` on the device.
    pub fn load(
        gpu: &mut dyn GpuDevice,
        name: &str,
        source: &str,
        mode: ShadingMode,
    ) -> Result<Self, GpuError> {
        let program = gpu.create_program(&ProgramDesc { name, source, mode })?;
        tracing::info!(name, ?mode, "shader program ready");
        Ok(Self {
            program,
            name: name.to_string(),
            mode,
        })
    }

    /// Read WGSL from disk and compile it.
    pub fn from_file(
        gpu: &mut dyn GpuDevice,
        path: &Path,
        mode: ShadingMode,
    ) -> Result<Self, GpuError> {
        let source = fs::read_to_string(path).map_err(|source| GpuError::ShaderSource {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("shader");
        Self::load(gpu, name, &source, mode)
    }

    /// The built-in depth-only program.
    pub fn depth(gpu: &mut dyn GpuDevice) -> Result<Self, GpuError> {
        Self::load(gpu, "depth", DEPTH_SHADER_SOURCE, ShadingMode::DepthOnly)
    }

    /// The built-in lit material program.
    pub fn material(gpu: &mut dyn GpuDevice) -> Result<Self, GpuError> {
        Self::load(gpu, "material", MATERIAL_SHADER_SOURCE, ShadingMode::Material)
    }

    /// Device handle.
    pub fn program(&self) -> ProgramId {
        self.program
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shading capability.
    pub fn mode(&self) -> ShadingMode {
        self.mode
    }

    /// True when the program accepts camera, light and material uniforms.
    pub fn is_material(&self) -> bool {
        self.mode == ShadingMode::Material
    }

    /// Make this program current.
    pub fn use_program(&self, gpu: &mut dyn GpuDevice) {
        gpu.use_program(self.program);
    }

    /// Set a named uniform.
    pub fn set_uniform(&self, gpu: &mut dyn GpuDevice, name: &str, value: impl Into<UniformValue>) {
        gpu.set_uniform(self.program, name, value.into());
    }

    /// Upload a matrix uniform.
    pub fn set_mat4(&self, gpu: &mut dyn GpuDevice, name: &str, value: Mat4) {
        self.set_uniform(gpu, name, value);
    }

    /// Upload a vector uniform.
    pub fn set_vec3(&self, gpu: &mut dyn GpuDevice, name: &str, value: Vec3) {
        self.set_uniform(gpu, name, value);
    }

    /// Upload the `light.*` members for a directional light.
    pub fn set_directional_light(&self, gpu: &mut dyn GpuDevice, light: &DirectionalLight) {
        self.set_uniform(gpu, "light.kind", LIGHT_DIRECTIONAL);
        self.set_uniform(gpu, "light.direction", light.direction);
        self.set_uniform(gpu, "light.ambient", light.ambient);
        self.set_uniform(gpu, "light.diffuse", light.diffuse);
        self.set_uniform(gpu, "light.specular", light.specular);
    }

    /// Upload the `light.*` members for a spot light.
    pub fn set_spot_light(&self, gpu: &mut dyn GpuDevice, light: &SpotLight) {
        self.set_uniform(gpu, "light.kind", LIGHT_SPOT);
        self.set_uniform(gpu, "light.position", light.position);
        self.set_uniform(gpu, "light.direction", light.direction);
        self.set_uniform(gpu, "light.ambient", light.ambient);
        self.set_uniform(gpu, "light.diffuse", light.diffuse);
        self.set_uniform(gpu, "light.specular", light.specular);
        self.set_uniform(gpu, "light.cut_off", light.cut_off_cos);
        self.set_uniform(gpu, "light.outer_cut_off", light.outer_cut_off_cos);
        self.set_uniform(gpu, "light.constant", light.attenuation.constant);
        self.set_uniform(gpu, "light.linear", light.attenuation.linear);
        self.set_uniform(gpu, "light.quadratic", light.attenuation.quadratic);
    }

    /// Upload whichever light is active.
    pub fn set_light(&self, gpu: &mut dyn GpuDevice, light: &Light) {
        match light {
            Light::Directional(dir) => self.set_directional_light(gpu, dir),
            Light::Spot(spot) => self.set_spot_light(gpu, spot),
        }
    }
}
