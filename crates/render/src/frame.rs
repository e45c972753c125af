//! Per-frame orchestration of the shadow and objects passes.

use serde::Serialize;

use crate::gpu::{GpuDevice, GpuError};
use crate::passes::{DepthMapPass, DrawObjectsPass};
use crate::scene::Scene;

/// Summary of one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameStats {
    /// Zero-based index of this frame.
    pub frame: u64,
    /// Draws issued by the depth pass.
    pub depth_draws: usize,
    /// Draws issued by the objects pass.
    pub object_draws: usize,
}

impl FrameStats {
    /// Draws issued across both passes.
    pub fn draw_calls(&self) -> usize {
        self.depth_draws + self.object_draws
    }
}

/// Runs the depth pass, then the objects pass, then presents.
#[derive(Debug)]
pub struct FrameDriver {
    depth_pass: DepthMapPass,
    objects_pass: DrawObjectsPass,
    frames: u64,
}

impl FrameDriver {
    /// Driver owning both passes.
    pub fn new(depth_pass: DepthMapPass, objects_pass: DrawObjectsPass) -> Self {
        Self {
            depth_pass,
            objects_pass,
            frames: 0,
        }
    }

    /// Render and present one frame of `scene`.
    pub fn render(&mut self, gpu: &mut dyn GpuDevice, scene: &Scene) -> Result<FrameStats, GpuError> {
        let depth_draws = self.depth_pass.draw(gpu, &scene.light, &scene.models);
        let object_draws = self.objects_pass.draw(
            gpu,
            &scene.camera,
            &scene.light,
            &self.depth_pass,
            &scene.models,
        );
        gpu.present()?;

        let stats = FrameStats {
            frame: self.frames,
            depth_draws,
            object_draws,
        };
        self.frames += 1;
        tracing::trace!(?stats, "frame rendered");
        Ok(stats)
    }

    /// Resize the default target and the objects pass viewport.
    pub fn resize(&mut self, gpu: &mut dyn GpuDevice, width: u32, height: u32) {
        if width == 0 || height == 0 {
            tracing::debug!(width, height, "ignoring zero-sized resize");
            return;
        }
        gpu.resize(width, height);
        self.objects_pass.resize(width, height);
    }

    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// The shadow pass.
    pub fn depth_pass(&self) -> &DepthMapPass {
        &self.depth_pass
    }

    /// The camera pass.
    pub fn objects_pass(&self) -> &DrawObjectsPass {
        &self.objects_pass
    }

    /// Mutable camera pass, for clear color and clip planes.
    pub fn objects_pass_mut(&mut self) -> &mut DrawObjectsPass {
        &mut self.objects_pass
    }
}
