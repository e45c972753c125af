//! Visible-face mesh extraction for voxel volumes.
//!
//! Every solid voxel emits one quad per face that borders empty space or the
//! volume boundary. Quads are written as two independent triangles, six
//! vertices of `position(3) normal(3) uv(2)` each. No faces are merged.

use blake3::Hasher;

use crate::volume::VoxelVolume;

/// Floats per emitted vertex: position, normal, uv.
pub const FLOATS_PER_VERTEX: usize = 8;
/// Vertices per emitted face (two triangles).
pub const VERTICES_PER_FACE: usize = 6;

const FLOATS_PER_FACE: usize = FLOATS_PER_VERTEX * VERTICES_PER_FACE;

/// The six axis-aligned faces of a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    /// -Z
    Back,
    /// +Z
    Front,
    /// -X
    Left,
    /// +X
    Right,
    /// -Y
    Bottom,
    /// +Y
    Top,
}

impl Face {
    /// All faces in emission order.
    pub const ALL: [Face; 6] = [
        Face::Back,
        Face::Front,
        Face::Left,
        Face::Right,
        Face::Bottom,
        Face::Top,
    ];

    /// Outward unit normal.
    pub const fn normal(self) -> [f32; 3] {
        match self {
            Face::Back => [0.0, 0.0, -1.0],
            Face::Front => [0.0, 0.0, 1.0],
            Face::Left => [-1.0, 0.0, 0.0],
            Face::Right => [1.0, 0.0, 0.0],
            Face::Bottom => [0.0, -1.0, 0.0],
            Face::Top => [0.0, 1.0, 0.0],
        }
    }

    /// Grid offset of the neighbor across this face.
    pub const fn offset(self) -> [i64; 3] {
        match self {
            Face::Back => [0, 0, -1],
            Face::Front => [0, 0, 1],
            Face::Left => [-1, 0, 0],
            Face::Right => [1, 0, 0],
            Face::Bottom => [0, -1, 0],
            Face::Top => [0, 1, 0],
        }
    }

    /// In-plane axes `(u, v)` with `u × v` equal to the outward normal, so
    /// corners walked `-u-v → +u-v → +u+v` wind counter-clockwise from outside.
    const fn tangents(self) -> ([f32; 3], [f32; 3]) {
        match self {
            Face::Back => ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Face::Front => ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            Face::Left => ([0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            Face::Right => ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0]),
            Face::Bottom => ([1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            Face::Top => ([1.0, 0.0, 0.0], [0.0, 0.0, -1.0]),
        }
    }
}

/// Corner signs `(su, sv)` for the two triangles of a quad.
const QUAD_CORNERS: [(f32, f32); VERTICES_PER_FACE] = [
    (-1.0, -1.0),
    (1.0, -1.0),
    (1.0, 1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
    (-1.0, -1.0),
];

/// Hash of the vertex buffer for determinism checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHash(pub [u8; 32]);

impl MeshHash {
    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

/// CPU-side mesh produced by [`SurfaceMesher`].
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    /// Flat vertex stream, [`FLOATS_PER_VERTEX`] floats per vertex.
    pub vertices: Vec<f32>,
    /// Number of emitted faces.
    pub face_count: usize,
    /// Stable hash of `vertices`.
    pub hash: MeshHash,
}

impl TerrainMesh {
    /// Number of vertices in the stream.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    /// Number of triangles in the stream.
    pub fn triangle_count(&self) -> usize {
        self.vertex_count() / 3
    }

    /// True when no face was emitted.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Extracts the visible surface of a [`VoxelVolume`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMesher {
    /// Edge length of one voxel in world units.
    pub voxel_size: f32,
    /// Texture coordinate span across one face.
    pub uv_scale: f32,
}

impl Default for SurfaceMesher {
    fn default() -> Self {
        Self {
            voxel_size: 1.0,
            uv_scale: 1.0,
        }
    }
}

impl SurfaceMesher {
    /// Create a mesher.
    pub fn new(voxel_size: f32, uv_scale: f32) -> Self {
        Self {
            voxel_size,
            uv_scale,
        }
    }

    /// Emit one quad for every solid face bordering empty space or the boundary.
    pub fn mesh(&self, volume: &VoxelVolume) -> TerrainMesh {
        let mut vertices = Vec::new();
        let mut face_count = 0;

        for (x, y, z, voxel) in volume.iter() {
            if voxel.is_empty() {
                continue;
            }
            for face in Face::ALL {
                if volume.is_solid_neighbor(x, y, z, face) {
                    continue;
                }
                self.push_face(&mut vertices, face, x, y, z);
                face_count += 1;
            }
        }

        let mut hasher = Hasher::new();
        hasher.update(bytemuck::cast_slice(&vertices));

        tracing::debug!(
            extent = %volume.extent(),
            faces = face_count,
            vertices = vertices.len() / FLOATS_PER_VERTEX,
            "meshed voxel volume"
        );

        TerrainMesh {
            vertices,
            face_count,
            hash: MeshHash(*hasher.finalize().as_bytes()),
        }
    }

    /// Vertices of a single face of the voxel at `(x, y, z)`.
    pub fn face_vertices(&self, face: Face, x: usize, y: usize, z: usize) -> [f32; FLOATS_PER_FACE] {
        let mut out = Vec::with_capacity(FLOATS_PER_FACE);
        self.push_face(&mut out, face, x, y, z);
        let mut face_verts = [0.0; FLOATS_PER_FACE];
        face_verts.copy_from_slice(&out);
        face_verts
    }

    fn push_face(&self, out: &mut Vec<f32>, face: Face, x: usize, y: usize, z: usize) {
        let half = self.voxel_size / 2.0;
        let center = [
            self.voxel_size * x as f32,
            self.voxel_size * y as f32,
            self.voxel_size * z as f32,
        ];
        let normal = face.normal();
        let (u, v) = face.tangents();

        for (su, sv) in QUAD_CORNERS {
            for axis in 0..3 {
                out.push(center[axis] + half * (normal[axis] + su * u[axis] + sv * v[axis]));
            }
            out.extend_from_slice(&normal);
            out.push(if su > 0.0 { self.uv_scale } else { 0.0 });
            out.push(if sv > 0.0 { self.uv_scale } else { 0.0 });
        }
    }
}
