//! Named uniform blocks packed with WGSL uniform-buffer layout rules.

use serde::Serialize;

use crate::gpu::{ShadingMode, UniformValue};

/// Type of a uniform block member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UniformKind {
    /// `i32`
    Int,
    /// `f32`
    Float,
    /// `vec3<f32>`
    Vec3,
    /// `mat4x4<f32>`
    Mat4,
}

impl UniformKind {
    /// WGSL alignment in bytes.
    pub fn align(self) -> usize {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec3 | UniformKind::Mat4 => 16,
        }
    }

    /// Size in bytes.
    pub fn size(self) -> usize {
        match self {
            UniformKind::Int | UniformKind::Float => 4,
            UniformKind::Vec3 => 12,
            UniformKind::Mat4 => 64,
        }
    }
}

impl UniformValue {
    /// Member type this value writes.
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }
}

/// A member of a [`UniformLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformField {
    /// Name used by [`crate::GpuDevice::set_uniform`].
    pub name: &'static str,
    /// Member type.
    pub kind: UniformKind,
    /// Byte offset inside the block.
    pub offset: usize,
}

/// Member names and offsets of one uniform block, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: usize,
}

const DEPTH_FIELDS: &[(&str, UniformKind)] = &[
    ("light_space_matrix", UniformKind::Mat4),
    ("model", UniformKind::Mat4),
];

// Order must match `struct Uniforms` in shaders/material.wgsl.
const MATERIAL_FIELDS: &[(&str, UniformKind)] = &[
    ("model", UniformKind::Mat4),
    ("view", UniformKind::Mat4),
    ("projection", UniformKind::Mat4),
    ("light_space_matrix", UniformKind::Mat4),
    ("view_pos", UniformKind::Vec3),
    ("material.shininess", UniformKind::Float),
    ("light.position", UniformKind::Vec3),
    ("light.kind", UniformKind::Int),
    ("light.direction", UniformKind::Vec3),
    ("light.cut_off", UniformKind::Float),
    ("light.ambient", UniformKind::Vec3),
    ("light.outer_cut_off", UniformKind::Float),
    ("light.diffuse", UniformKind::Vec3),
    ("light.constant", UniformKind::Float),
    ("light.specular", UniformKind::Vec3),
    ("light.linear", UniformKind::Float),
    ("light.quadratic", UniformKind::Float),
    ("material.diffuse", UniformKind::Int),
    ("material.specular", UniformKind::Int),
    ("shadow_map", UniformKind::Int),
];

fn align_to(value: usize, alignment: usize) -> usize {
    value.div_ceil(alignment) * alignment
}

impl UniformLayout {
    /// Lay out members in order with WGSL alignment rules.
    pub fn new(members: &[(&'static str, UniformKind)]) -> Self {
        let mut cursor = 0;
        let fields = members
            .iter()
            .map(|&(name, kind)| {
                let offset = align_to(cursor, kind.align());
                cursor = offset + kind.size();
                UniformField { name, kind, offset }
            })
            .collect();
        Self {
            fields,
            size: align_to(cursor.max(16), 16),
        }
    }

    /// The fixed layout for a shading mode.
    pub fn for_mode(mode: ShadingMode) -> Self {
        match mode {
            ShadingMode::DepthOnly => Self::new(DEPTH_FIELDS),
            ShadingMode::Material => Self::new(MATERIAL_FIELDS),
        }
    }

    /// Look up a member by name.
    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Members in declaration order.
    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    /// Block size in bytes, a multiple of 16.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// CPU copy of a uniform block's bytes.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    /// Zeroed block for `layout`.
    pub fn new(layout: UniformLayout) -> Self {
        let bytes = vec![0; layout.size()];
        Self { layout, bytes }
    }

    /// Layout backing this block.
    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Raw bytes ready for upload.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write a member. Returns `false` when the name is unknown or the type differs,
    /// leaving the block untouched.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        let Some(field) = self.layout.field(name).copied() else {
            tracing::trace!(name, "ignoring uniform not declared by program");
            return false;
        };
        if field.kind != value.kind() {
            tracing::warn!(
                name,
                expected = ?field.kind,
                found = ?value.kind(),
                "uniform type mismatch"
            );
            return false;
        }

        let dst = &mut self.bytes[field.offset..field.offset + field.kind.size()];
        match value {
            UniformValue::Int(v) => dst.copy_from_slice(bytemuck::bytes_of(&v)),
            UniformValue::Float(v) => dst.copy_from_slice(bytemuck::bytes_of(&v)),
            UniformValue::Vec3(v) => dst.copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat4(m) => {
                dst.copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()))
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    #[test]
    fn material_layout_matches_wgsl_offsets() {
        let layout = UniformLayout::for_mode(ShadingMode::Material);
        let offset = |name| layout.field(name).unwrap().offset;
        assert_eq!(offset("model"), 0);
        assert_eq!(offset("light_space_matrix"), 192);
        assert_eq!(offset("view_pos"), 256);
        assert_eq!(offset("material.shininess"), 268);
        assert_eq!(offset("light.position"), 272);
        assert_eq!(offset("light.kind"), 284);
        assert_eq!(offset("light.quadratic"), 352);
        assert_eq!(offset("shadow_map"), 364);
        assert_eq!(layout.size(), 368);
    }

    #[test]
    fn depth_layout_is_two_matrices() {
        let layout = UniformLayout::for_mode(ShadingMode::DepthOnly);
        assert_eq!(layout.size(), 128);
        assert_eq!(layout.field("model").unwrap().offset, 64);
    }

    #[test]
    fn set_writes_bytes_and_ignores_unknown() {
        let mut block = UniformBlock::new(UniformLayout::for_mode(ShadingMode::DepthOnly));
        assert!(block.set("model", Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0)).into()));
        let floats: Vec<f32> = block.bytes()[64..128]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        assert_eq!(&floats[12..15], &[1.0, 2.0, 3.0]);

        assert!(!block.set("view_pos", Vec3::ONE.into()));
        assert!(!block.set("model", 1.0f32.into()));
    }
}
