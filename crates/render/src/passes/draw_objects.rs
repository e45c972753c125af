use super::{DepthMapPass, PassState};
use crate::camera::Camera;
use crate::context::RenderContext;
use crate::gpu::{ClearFlags, GpuDevice, RenderTarget};
use crate::light::Light;
use crate::model::Model;

/// Renders the scene from the camera with shadows from the depth pass.
#[derive(Debug, Clone)]
pub struct DrawObjectsPass {
    width: u32,
    height: u32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Background color.
    pub clear_color: [f32; 4],
    state: PassState,
}

impl DrawObjectsPass {
    /// Pass drawing into a `width` x `height` viewport.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            near: 0.1,
            far: 100.0,
            clear_color: [0.2, 0.3, 0.3, 1.0],
            state: PassState::Idle,
        }
    }

    /// Viewport width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }

    /// Draw every model. Must run after `depth_pass.draw` in the same frame.
    /// Returns the number of draws issued.
    pub fn draw(
        &mut self,
        gpu: &mut dyn GpuDevice,
        camera: &Camera,
        light: &Light,
        depth_pass: &DepthMapPass,
        models: &[Model],
    ) -> usize {
        self.state = PassState::Preparing;

        gpu.set_viewport(self.width, self.height);
        gpu.bind_render_target(RenderTarget::Default);
        gpu.clear(ClearFlags::COLOR | ClearFlags::DEPTH, self.clear_color);
        gpu.enable_depth_test();

        let ctx = RenderContext::new(
            camera.view_matrix(),
            camera.projection_matrix(self.aspect_ratio(), self.near, self.far),
            depth_pass.light_view_projection(),
            camera.position,
            light,
            depth_pass.depth_texture(),
        );

        self.state = PassState::Drawing;
        let mut draws = 0;
        for model in models {
            model.draw_in_context(gpu, &ctx);
            if model.mesh.vertex_count() > 0 {
                draws += 1;
            }
        }

        tracing::debug!(models = models.len(), draws, "objects pass complete");
        self.state = PassState::Idle;
        draws
    }

    /// Track a new viewport size.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Viewport size.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Current state.
    pub fn state(&self) -> PassState {
        self.state
    }
}
