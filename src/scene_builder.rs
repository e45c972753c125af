//! Builds the startup scene on any GPU device.

use std::rc::Rc;

use anyhow::{Context, Result};
use glam::Vec3;
use landscape_render::{
    primitives, Camera, DepthMapPass, DrawObjectsPass, DrawableMesh, FrameDriver, GpuDevice,
    Material, Model, NoiseTextureParams, Scene, Shader, Texture, Transform,
};
use landscape_terrain::{
    CompositeNoise, OctaveNoise, Perlin, SeededPerlin, SurfaceMesher, TerrainMesh, VoxelVolume,
};
use landscape_testkit::TerrainMeshMetric;

use crate::config::{CameraSettings, LandscapeConfig, TerrainSettings, TextureSettings};

pub struct BuiltScene {
    pub scene: Scene,
    pub driver: FrameDriver,
    pub terrain: TerrainMeshMetric,
}

/// Noise field selected by the terrain settings.
pub fn terrain_noise(settings: &TerrainSettings) -> Box<dyn OctaveNoise> {
    match settings.seeds.as_slice() {
        [] => Box::new(Perlin::new(settings.repeat)),
        [seed] => Box::new(SeededPerlin::new(*seed)),
        seeds => Box::new(
            seeds
                .iter()
                .fold(CompositeNoise::new(), |noise, &seed| {
                    noise.with(SeededPerlin::new(seed))
                }),
        ),
    }
}

/// Generate and mesh the terrain. The voxel volume is dropped once meshed.
pub fn generate_terrain(settings: &TerrainSettings) -> Result<(TerrainMesh, TerrainMeshMetric)> {
    let noise = terrain_noise(settings);
    let volume = VoxelVolume::generate(noise.as_ref(), &settings.generation)
        .context("Failed to generate terrain volume")?;
    let mesh = SurfaceMesher::new(settings.voxel_size, settings.uv_scale).mesh(&volume);

    let extent = volume.extent();
    let metric = TerrainMeshMetric {
        extent: [extent.x, extent.y, extent.z],
        solid_voxels: volume.solid_count(),
        faces: mesh.face_count,
        triangles: mesh.triangle_count(),
        hash: mesh.hash.to_hex(),
    };
    tracing::info!(
        extent = %extent,
        solid = metric.solid_voxels,
        faces = metric.faces,
        hash = %metric.hash,
        "terrain generated"
    );
    Ok((mesh, metric))
}

pub fn camera_from_settings(settings: &CameraSettings) -> Camera {
    let mut camera = Camera::new(settings.position);
    camera.yaw = settings.yaw;
    camera.pitch = settings.pitch;
    camera.fov = settings.fov;
    camera.speed = settings.speed;
    camera.sensitivity = settings.sensitivity;
    camera
}

fn load_material(
    gpu: &mut dyn GpuDevice,
    settings: &TextureSettings,
    terrain: &TerrainSettings,
) -> Result<Material> {
    let diffuse = match &settings.diffuse {
        Some(path) => Texture::from_file(gpu, path).inspect_err(|err| {
            tracing::error!(%err, path = %path.display(), "failed to load diffuse texture");
        })?,
        None => Texture::from_noise(
            gpu,
            "terrain noise",
            terrain_noise(terrain).as_ref(),
            NoiseTextureParams {
                size: settings.noise_size,
                frequency: settings.noise_frequency,
                ..Default::default()
            },
        )?,
    };
    let specular = match &settings.specular {
        Some(path) => Texture::from_file(gpu, path).inspect_err(|err| {
            tracing::error!(%err, path = %path.display(), "failed to load specular texture");
        })?,
        None => Texture::solid(gpu, "specular", [128, 128, 128, 255])?,
    };
    Ok(Material {
        diffuse: Some(diffuse),
        specular: Some(specular),
        shininess: settings.shininess,
    })
}

/// Compile shaders, create the shadow target, generate terrain and assemble the scene.
pub fn build(gpu: &mut dyn GpuDevice, config: &LandscapeConfig) -> Result<BuiltScene> {
    let depth_shader = Shader::depth(gpu)
        .inspect_err(|err| tracing::error!(%err, shader = "depth", "shader failed"))
        .context("Failed to build depth shader")?;
    let material_shader = Rc::new(
        Shader::material(gpu)
            .inspect_err(|err| tracing::error!(%err, shader = "material", "shader failed"))
            .context("Failed to build material shader")?,
    );

    let depth_pass = DepthMapPass::new(gpu, depth_shader, config.shadow)
        .inspect_err(|err| {
            tracing::error!(%err, resolution = config.shadow.resolution, "shadow map failed")
        })
        .context("Failed to create shadow map")?;
    let (width, height) = gpu.surface_size();
    let mut objects_pass = DrawObjectsPass::new(width, height);
    objects_pass.near = config.camera.near;
    objects_pass.far = config.camera.far;
    let driver = FrameDriver::new(depth_pass, objects_pass);

    let (terrain_mesh, terrain) = generate_terrain(&config.terrain)?;
    let terrain_mesh = Rc::new(
        DrawableMesh::from_terrain(gpu, terrain_mesh).context("Failed to upload terrain mesh")?,
    );

    let material = Rc::new(
        load_material(gpu, &config.textures, &config.terrain)
            .context("Failed to load terrain material")?,
    );

    let mut scene = Scene::new(config.light.clone(), camera_from_settings(&config.camera));
    scene.add(
        Model::new(terrain_mesh, material_shader.clone())
            .with_material(material.clone())
            .with_transform(Transform::from_translation(config.terrain.offset)),
    );

    if config.terrain.props {
        let ground_y = config.terrain.offset.y - config.terrain.voxel_size * 0.5;
        let plane = Rc::new(primitives::plane(gpu, 40.0, 10.0).context("Failed to upload plane")?);
        scene.add(
            Model::new(plane, material_shader.clone())
                .with_material(material.clone())
                .with_transform(Transform::from_translation(Vec3::new(0.0, ground_y, 0.0))),
        );

        let cube = Rc::new(primitives::cube(gpu).context("Failed to upload cube")?);
        scene.add(
            Model::new(cube, material_shader)
                .with_material(material)
                .with_transform(Transform {
                    translation: Vec3::new(0.0, config.terrain.offset.y + 20.0, 0.0),
                    rotation_angle: 45.0,
                    scale: Vec3::splat(2.0),
                    ..Default::default()
                }),
        );
    }

    tracing::info!(models = scene.models.len(), "scene ready");
    Ok(BuiltScene {
        scene,
        driver,
        terrain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscape_render::RecordingDevice;
    use landscape_terrain::Extent;

    fn small_config() -> LandscapeConfig {
        let mut config = LandscapeConfig::default();
        config.terrain.generation.extent = Extent::new(8, 8, 8);
        config.textures.noise_size = 16;
        config.shadow.resolution = 256;
        config
    }

    #[test]
    fn builds_terrain_and_props() {
        let mut gpu = RecordingDevice::new(640, 480);
        let built = build(&mut gpu, &small_config()).unwrap();
        assert_eq!(built.scene.models.len(), 3);
        assert_eq!(built.terrain.extent, [8, 8, 8]);
        assert_eq!(built.terrain.triangles, built.terrain.faces * 2);
        assert_eq!(built.driver.objects_pass().size(), (640, 480));
    }

    #[test]
    fn seeds_pick_the_noise_field() {
        let mut settings = TerrainSettings::default();
        settings.generation.extent = Extent::new(8, 8, 8);
        settings.generation.threshold = 0.45;
        let (_, reference) = generate_terrain(&settings).unwrap();

        settings.seeds = vec![3];
        let (_, seeded) = generate_terrain(&settings).unwrap();
        let (_, again) = generate_terrain(&settings).unwrap();
        assert_eq!(seeded.hash, again.hash);

        settings.seeds = vec![3, 4];
        let (_, blended) = generate_terrain(&settings).unwrap();
        assert_ne!(reference.hash, blended.hash);
    }

    #[test]
    fn oversized_shadow_map_fails_startup() {
        let mut gpu = RecordingDevice::new(640, 480).with_max_texture_dimension(512);
        let mut config = small_config();
        config.shadow.resolution = 1024;
        let Err(err) = build(&mut gpu, &config) else {
            panic!("expected shadow map creation to fail");
        };
        assert!(format!("{err:#}").contains("shadow map"));
    }
}
