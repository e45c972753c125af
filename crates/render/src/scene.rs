use crate::camera::Camera;
use crate::light::Light;
use crate::model::Model;

/// Everything a frame draws.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    /// Active light.
    pub light: Light,
    /// Viewer.
    pub camera: Camera,
    /// Drawn in order by both passes.
    pub models: Vec<Model>,
}

impl Scene {
    /// Empty scene with the given light and camera.
    pub fn new(light: Light, camera: Camera) -> Self {
        Self {
            light,
            camera,
            models: Vec::new(),
        }
    }

    /// Append a model.
    pub fn add(&mut self, model: Model) {
        self.models.push(model);
    }
}
