#![warn(missing_docs)]
//! Procedural terrain: noise fields, voxel volumes and visible-face meshing.

mod error;
mod mesher;
mod noise_field;
mod volume;

pub use error::TerrainError;
pub use mesher::{Face, MeshHash, SurfaceMesher, TerrainMesh, FLOATS_PER_VERTEX, VERTICES_PER_FACE};
pub use noise_field::{CompositeNoise, NoiseSource, OctaveNoise, Perlin, SeededPerlin};
pub use volume::{Extent, GenerationParams, Voxel, VoxelVolume, MATERIAL_EMPTY};
