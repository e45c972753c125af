//! Drawable scene objects.

use std::rc::Rc;

use glam::{Mat4, Quat, Vec3};

use crate::context::RenderContext;
use crate::gpu::GpuDevice;
use crate::mesh::DrawableMesh;
use crate::shader::Shader;
use crate::texture::Texture;

/// Placement of a model in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// World-space offset.
    pub translation: Vec3,
    /// Axis of `rotation_angle`. Need not be normalized.
    pub rotation_axis: Vec3,
    /// Rotation around `rotation_axis`, degrees.
    pub rotation_angle: f32,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation_axis: Vec3::new(0.0, 0.1, 0.0),
            rotation_angle: 0.0,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Transform that only translates.
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// `translate * rotate * scale`.
    pub fn matrix(&self) -> Mat4 {
        let axis = self.rotation_axis.normalize_or_zero();
        let rotation = if axis == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_axis_angle(axis, self.rotation_angle.to_radians())
        };
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.translation)
    }
}

/// Surface properties sampled by material programs.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Diffuse color map.
    pub diffuse: Option<Texture>,
    /// Specular intensity map.
    pub specular: Option<Texture>,
    /// Phong exponent.
    pub shininess: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: None,
            specular: None,
            shininess: 32.0,
        }
    }
}

/// A mesh drawn with a shader, an optional material and a transform.
#[derive(Debug, Clone)]
pub struct Model {
    /// Geometry, shared between models.
    pub mesh: Rc<DrawableMesh>,
    /// Program used in the objects pass.
    pub shader: Rc<Shader>,
    /// Material, required for lit shading.
    pub material: Option<Rc<Material>>,
    /// World placement.
    pub transform: Transform,
}

impl Model {
    /// Model at the origin without a material.
    pub fn new(mesh: Rc<DrawableMesh>, shader: Rc<Shader>) -> Self {
        Self {
            mesh,
            shader,
            material: None,
            transform: Transform::default(),
        }
    }

    /// Attach a material.
    pub fn with_material(mut self, material: Rc<Material>) -> Self {
        self.material = Some(material);
        self
    }

    /// Replace the transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// World matrix of this model.
    pub fn model_matrix(&self) -> Mat4 {
        self.transform.matrix()
    }

    /// True when the objects pass uploads camera, light and material state.
    pub fn is_lit(&self) -> bool {
        self.shader.is_material() && self.material.is_some()
    }

    /// Draw with the model's own shader using the frame's shared state.
    pub fn draw_in_context(&self, gpu: &mut dyn GpuDevice, ctx: &RenderContext<'_>) {
        let shader = &self.shader;
        shader.use_program(gpu);
        shader.set_mat4(gpu, "model", self.model_matrix());

        if let (true, Some(material)) = (shader.is_material(), self.material.as_deref()) {
            shader.set_mat4(gpu, "view", ctx.view);
            shader.set_mat4(gpu, "projection", ctx.projection);
            shader.set_mat4(gpu, "light_space_matrix", ctx.light_view_projection);
            shader.set_vec3(gpu, "view_pos", ctx.view_pos);
            shader.set_light(gpu, ctx.light);
            shader.set_uniform(gpu, "material.shininess", material.shininess);
            shader.set_uniform(gpu, "material.diffuse", ctx.diffuse_unit as i32);
            shader.set_uniform(gpu, "material.specular", ctx.specular_unit as i32);
            shader.set_uniform(gpu, "shadow_map", ctx.shadow_unit as i32);

            if let Some(diffuse) = &material.diffuse {
                gpu.bind_texture(ctx.diffuse_unit, diffuse.id());
            }
            if let Some(specular) = &material.specular {
                gpu.bind_texture(ctx.specular_unit, specular.id());
            }
            gpu.bind_texture(ctx.shadow_unit, ctx.shadow_texture);
        }

        tracing::trace!(
            shader = shader.name(),
            vertices = self.mesh.vertex_count(),
            lit = self.is_lit(),
            "draw model"
        );
        self.mesh.draw(gpu);
    }

    /// Position-only draw with `depth_shader` in place of the model's shader.
    ///
    /// The caller has already made `depth_shader` current.
    pub fn draw_depth(&self, gpu: &mut dyn GpuDevice, depth_shader: &Shader) {
        depth_shader.set_mat4(gpu, "model", self.model_matrix());
        self.mesh.draw(gpu);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_applies_scale_then_rotation_then_translation() {
        let transform = Transform {
            translation: Vec3::new(10.0, 0.0, 0.0),
            rotation_axis: Vec3::new(0.0, 0.1, 0.0),
            rotation_angle: 90.0,
            scale: Vec3::splat(2.0),
        };
        let p = transform.matrix().transform_point3(Vec3::X);
        assert!((p - Vec3::new(10.0, 0.0, -2.0)).length() < 1e-5);
    }

    #[test]
    fn zero_axis_means_no_rotation() {
        let transform = Transform {
            rotation_axis: Vec3::ZERO,
            rotation_angle: 45.0,
            ..Default::default()
        };
        assert_eq!(transform.matrix(), Mat4::IDENTITY);
    }
}
