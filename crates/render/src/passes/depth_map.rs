use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::PassState;
use crate::framebuffer::DepthFramebuffer;
use crate::gpu::{ClearFlags, DepthFormat, GpuDevice, GpuError, RenderTarget, TextureId};
use crate::light::Light;
use crate::model::Model;
use crate::shader::Shader;

/// Shadow map size and light frustum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Edge length of the square depth target.
    pub resolution: u32,
    /// Depth precision.
    pub format: DepthFormat,
    /// Half width and height of the orthographic light frustum.
    pub half_extent: f32,
    /// Near plane of the light frustum.
    pub near: f32,
    /// Far plane of the light frustum.
    pub far: f32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            resolution: 2048,
            format: DepthFormat::Depth32,
            half_extent: 20.0,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl ShadowSettings {
    /// Orthographic light projection with 0..1 depth.
    pub fn projection(&self) -> Mat4 {
        let e = self.half_extent;
        Mat4::orthographic_rh(-e, e, -e, e, self.near, self.far)
    }
}

/// Renders scene depth from the light into the shadow map.
#[derive(Debug)]
pub struct DepthMapPass {
    shader: Shader,
    framebuffer: DepthFramebuffer,
    settings: ShadowSettings,
    light_view_projection: Mat4,
    state: PassState,
}

impl DepthMapPass {
    /// Create the pass and its depth target.
    pub fn new(
        gpu: &mut dyn GpuDevice,
        shader: Shader,
        settings: ShadowSettings,
    ) -> Result<Self, GpuError> {
        let framebuffer =
            DepthFramebuffer::new(gpu, settings.resolution, settings.resolution, settings.format)?;
        Ok(Self {
            shader,
            framebuffer,
            settings,
            light_view_projection: Mat4::IDENTITY,
            state: PassState::Idle,
        })
    }

    /// Light view matrix looking from the light's eye at its target.
    pub fn light_view(light: &Light) -> Mat4 {
        let direction = light.direction().normalize_or_zero();
        let up = if direction.y.abs() > 0.99 { Vec3::Z } else { Vec3::Y };
        Mat4::look_at_rh(light.shadow_eye(), light.shadow_target(), up)
    }

    /// Render every model's depth from `light`. Returns the number of draws issued.
    pub fn draw(&mut self, gpu: &mut dyn GpuDevice, light: &Light, models: &[Model]) -> usize {
        self.state = PassState::Rendering;

        gpu.set_viewport(self.framebuffer.width(), self.framebuffer.height());
        gpu.bind_render_target(RenderTarget::Depth(self.framebuffer.target()));
        gpu.clear(ClearFlags::DEPTH, [0.0; 4]);
        gpu.enable_depth_test();

        self.light_view_projection = self.settings.projection() * Self::light_view(light);

        self.shader.use_program(gpu);
        self.shader
            .set_mat4(gpu, "light_space_matrix", self.light_view_projection);

        let mut draws = 0;
        for model in models {
            model.draw_depth(gpu, &self.shader);
            if model.mesh.vertex_count() > 0 {
                draws += 1;
            }
        }

        gpu.bind_render_target(RenderTarget::Default);
        tracing::debug!(models = models.len(), draws, "depth pass complete");
        self.state = PassState::Idle;
        draws
    }

    /// Light-space view-projection of the last draw, identity before the first.
    pub fn light_view_projection(&self) -> Mat4 {
        self.light_view_projection
    }

    /// Shadow map written by this pass.
    pub fn depth_texture(&self) -> TextureId {
        self.framebuffer.texture()
    }

    /// Depth target.
    pub fn framebuffer(&self) -> &DepthFramebuffer {
        &self.framebuffer
    }

    /// Frustum settings.
    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// Current state.
    pub fn state(&self) -> PassState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::light::{DirectionalLight, SpotLight};

    #[test]
    fn vertical_light_uses_z_up() {
        let light = Light::Directional(DirectionalLight {
            direction: Vec3::NEG_Y,
            ..Default::default()
        });
        let view = DepthMapPass::light_view(&light);
        assert!(view.is_finite());
        assert!(view.determinant().abs() > 1e-3);
    }

    #[test]
    fn spot_light_views_from_its_position() {
        let light = Light::Spot(SpotLight::new(
            Vec3::new(0.0, 10.0, 5.0),
            Vec3::new(0.0, -1.0, -1.0),
            0.9,
            0.8,
        ));
        let view = DepthMapPass::light_view(&light);
        let eye_in_view = view.transform_point3(Vec3::new(0.0, 10.0, 5.0));
        assert!(eye_in_view.length() < 1e-4);
    }

    #[test]
    fn shadow_settings_deserialize_with_defaults() {
        let settings: ShadowSettings = serde_json::from_str(r#"{"resolution":512}"#).unwrap();
        assert_eq!(settings.resolution, 512);
        assert_eq!(settings.half_extent, 20.0);
        assert_eq!(settings.format, DepthFormat::Depth32);
    }
}
