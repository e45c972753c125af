use anyhow::Result;
use glam::Vec3;
use landscape_render::{Light, ShadowSettings};
use landscape_terrain::GenerationParams;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "config/landscape.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LandscapeConfig {
    pub window: WindowSettings,
    pub terrain: TerrainSettings,
    pub shadow: ShadowSettings,
    pub camera: CameraSettings,
    pub light: Light,
    pub textures: TextureSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WindowSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "Landscape Engine".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TerrainSettings {
    pub generation: GenerationParams,
    /// Tiling period of the reference Perlin field; 0 disables wrapping.
    pub repeat: u32,
    /// Seeded fields to average instead of the reference field. Empty uses the reference field.
    pub seeds: Vec<u32>,
    pub voxel_size: f32,
    pub uv_scale: f32,
    /// World position of voxel (0, 0, 0).
    pub offset: Vec3,
    /// Also place a ground plane and a cube.
    pub props: bool,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            generation: GenerationParams::default(),
            repeat: 0,
            seeds: Vec::new(),
            voxel_size: 1.0,
            uv_scale: 1.0,
            offset: Vec3::new(-16.0, -8.0, -16.0),
            props: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraSettings {
    pub position: Vec3,
    /// Degrees.
    pub yaw: f32,
    /// Degrees.
    pub pitch: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub speed: f32,
    pub sensitivity: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 12.0, 40.0),
            yaw: -90.0,
            pitch: -20.0,
            fov: 45.0,
            speed: 10.0,
            sensitivity: 0.1,
            near: 0.1,
            far: 100.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TextureSettings {
    /// Diffuse image; a noise texture is generated when unset.
    pub diffuse: Option<PathBuf>,
    /// Specular image; solid gray when unset.
    pub specular: Option<PathBuf>,
    pub noise_size: u32,
    pub noise_frequency: f64,
    pub shininess: f32,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            diffuse: None,
            specular: None,
            noise_size: 256,
            noise_frequency: 8.0,
            shininess: 32.0,
        }
    }
}

impl LandscapeConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        Self::load_from_path(Path::new(DEFAULT_CONFIG_PATH))
    }

    /// Load configuration from an explicit path, falling back to defaults on errors.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<LandscapeConfig>(&contents) {
                Ok(cfg) => cfg,
                Err(err) => {
                    warn!("Failed to parse {}: {err}. Using defaults", path.display());
                    LandscapeConfig::default()
                }
            },
            Err(err) => {
                if path != Path::new(DEFAULT_CONFIG_PATH)
                    || err.kind() != std::io::ErrorKind::NotFound
                {
                    warn!("Failed to read {}: {err}. Using defaults", path.display());
                } else {
                    warn!(
                        "Landscape config not found at {}. Using defaults",
                        path.display()
                    );
                }
                LandscapeConfig::default()
            }
        }
    }

    /// Save configuration to an explicit path.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let toml = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        Ok(())
    }
}
