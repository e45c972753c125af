use glam::{Mat4, Vec3};

use crate::gpu::TextureId;
use crate::light::Light;

/// Texture unit of a material's diffuse map.
pub const DIFFUSE_UNIT: u32 = 0;
/// Texture unit of a material's specular map.
pub const SPECULAR_UNIT: u32 = 1;
/// Texture unit of the shadow map.
pub const SHADOW_UNIT: u32 = 2;

/// Per-frame camera, light and texture-unit state shared by every model draw.
///
/// Built once per frame by [`crate::DrawObjectsPass`] and never mutated.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Camera view matrix.
    pub view: Mat4,
    /// Camera projection matrix.
    pub projection: Mat4,
    /// Light-space view-projection from this frame's depth pass.
    pub light_view_projection: Mat4,
    /// Camera position in world space.
    pub view_pos: Vec3,
    /// Active light.
    pub light: &'a Light,
    /// Unit the diffuse map is bound to.
    pub diffuse_unit: u32,
    /// Unit the specular map is bound to.
    pub specular_unit: u32,
    /// Unit the shadow map is bound to.
    pub shadow_unit: u32,
    /// Depth texture written by the depth pass.
    pub shadow_texture: TextureId,
}

impl<'a> RenderContext<'a> {
    /// Context with the standard texture units.
    pub fn new(
        view: Mat4,
        projection: Mat4,
        light_view_projection: Mat4,
        view_pos: Vec3,
        light: &'a Light,
        shadow_texture: TextureId,
    ) -> Self {
        Self {
            view,
            projection,
            light_view_projection,
            view_pos,
            light,
            diffuse_unit: DIFFUSE_UNIT,
            specular_unit: SPECULAR_UNIT,
            shadow_unit: SHADOW_UNIT,
            shadow_texture,
        }
    }
}
