//! Fixed vertex tables for simple props, in the standard 8-float layout.

use landscape_terrain::{Face, SurfaceMesher, FLOATS_PER_VERTEX};

use crate::gpu::{GpuDevice, GpuError, VertexLayout};
use crate::mesh::DrawableMesh;

/// Unit cube centered on the origin, 36 vertices.
pub fn cube_vertices() -> Vec<f32> {
    let mesher = SurfaceMesher::new(1.0, 1.0);
    Face::ALL
        .iter()
        .flat_map(|&face| mesher.face_vertices(face, 0, 0, 0))
        .collect()
}

/// Horizontal square of side `2 * half_extent` at y = 0 facing +Y, 6 vertices.
/// Texture coordinates run from 0 to `uv_scale` across the plane.
pub fn plane_vertices(half_extent: f32, uv_scale: f32) -> Vec<f32> {
    let (e, s) = (half_extent, uv_scale);
    #[rustfmt::skip]
    let verts = vec![
        // position          normal           uv
        -e, 0.0,  e,   0.0, 1.0, 0.0,   0.0, 0.0,
         e, 0.0,  e,   0.0, 1.0, 0.0,   s,   0.0,
         e, 0.0, -e,   0.0, 1.0, 0.0,   s,   s,
         e, 0.0, -e,   0.0, 1.0, 0.0,   s,   s,
        -e, 0.0, -e,   0.0, 1.0, 0.0,   0.0, s,
        -e, 0.0,  e,   0.0, 1.0, 0.0,   0.0, 0.0,
    ];
    debug_assert_eq!(verts.len(), 6 * FLOATS_PER_VERTEX);
    verts
}

/// Upload a unit cube.
pub fn cube(gpu: &mut dyn GpuDevice) -> Result<DrawableMesh, GpuError> {
    DrawableMesh::upload(gpu, &cube_vertices(), VertexLayout::position_normal_uv())
}

/// Upload a ground plane.
pub fn plane(
    gpu: &mut dyn GpuDevice,
    half_extent: f32,
    uv_scale: f32,
) -> Result<DrawableMesh, GpuError> {
    DrawableMesh::upload(
        gpu,
        &plane_vertices(half_extent, uv_scale),
        VertexLayout::position_normal_uv(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use landscape_terrain::{Extent, VoxelVolume};

    fn single_voxel_vertices() -> Vec<f32> {
        let volume = VoxelVolume::filled(Extent::new(1, 1, 1), 1).unwrap();
        SurfaceMesher::new(1.0, 1.0).mesh(&volume).vertices
    }

    #[test]
    fn cube_has_36_vertices_matching_the_mesher() {
        let cube = cube_vertices();
        assert_eq!(cube.len(), 36 * FLOATS_PER_VERTEX);
        assert_eq!(cube, single_voxel_vertices());
    }

    #[test]
    fn plane_faces_up_and_winds_ccw() {
        let verts = plane_vertices(10.0, 4.0);
        for tri in verts.chunks_exact(3 * FLOATS_PER_VERTEX) {
            let p0 = glam::Vec3::from_slice(&tri[0..3]);
            let p1 = glam::Vec3::from_slice(&tri[8..11]);
            let p2 = glam::Vec3::from_slice(&tri[16..19]);
            let n = (p1 - p0).cross(p2 - p0);
            assert!(n.y > 0.0);
        }
        assert!(verts.chunks_exact(FLOATS_PER_VERTEX).all(|v| v[1] == 0.0));
    }
}
