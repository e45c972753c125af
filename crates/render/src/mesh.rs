use landscape_terrain::TerrainMesh;

use crate::gpu::{BufferId, GpuDevice, GpuError, VertexLayout};

/// GPU-side vertex buffer plus its attribute layout.
///
/// Owns the buffer exclusively; call [`DrawableMesh::destroy`] to free it.
#[derive(Debug, PartialEq, Eq)]
pub struct DrawableMesh {
    buffer: BufferId,
    vertex_count: u32,
    layout: VertexLayout,
}

impl DrawableMesh {
    /// Upload interleaved vertices. The CPU copy can be dropped afterwards.
    pub fn upload(
        gpu: &mut dyn GpuDevice,
        vertices: &[f32],
        layout: VertexLayout,
    ) -> Result<Self, GpuError> {
        let buffer = gpu.create_vertex_buffer(vertices, layout)?;
        let vertex_count = (vertices.len() / layout.stride as usize) as u32;
        tracing::debug!(?buffer, vertex_count, "uploaded mesh");
        Ok(Self {
            buffer,
            vertex_count,
            layout,
        })
    }

    /// Upload a generated terrain mesh, consuming its CPU vertices.
    pub fn from_terrain(gpu: &mut dyn GpuDevice, mesh: TerrainMesh) -> Result<Self, GpuError> {
        Self::upload(gpu, &mesh.vertices, VertexLayout::position_normal_uv())
    }

    /// Issue a draw of every vertex with whatever state is currently bound.
    pub fn draw(&self, gpu: &mut dyn GpuDevice) {
        if self.vertex_count == 0 {
            return;
        }
        gpu.draw(self.buffer, self.vertex_count);
    }

    /// Free the GPU buffer.
    pub fn destroy(self, gpu: &mut dyn GpuDevice) {
        gpu.destroy_vertex_buffer(self.buffer);
    }

    /// Buffer handle.
    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Number of vertices drawn.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    /// Attribute layout.
    pub fn layout(&self) -> VertexLayout {
        self.layout
    }
}
