//! Property-based tests for camera control and uniform packing
//!
//! Validates that for arbitrary input:
//! - Pitch never leaves ±89 degrees and fov stays in its zoom range
//! - The view direction stays unit length
//! - Material uniform members never overlap and respect WGSL alignment

use glam::Vec3;
use landscape_render::{
    Camera, ShadingMode, UniformBlock, UniformLayout, UniformValue, FOV_RANGE, MAX_PITCH,
};
use proptest::prelude::*;

proptest! {
    /// Property: any mouse and scroll sequence keeps the camera within its limits
    #[test]
    fn camera_limits_hold(
        moves in prop::collection::vec((-5000.0f32..5000.0, -5000.0f32..5000.0, -20.0f32..20.0), 1..32),
    ) {
        let mut camera = Camera::new(Vec3::ZERO);
        for (dx, dy, scroll) in moves {
            camera.rotate(dx, dy);
            camera.zoom(scroll);
            prop_assert!(camera.pitch.abs() <= MAX_PITCH);
            prop_assert!(camera.fov >= FOV_RANGE.0 && camera.fov <= FOV_RANGE.1);
            prop_assert!((camera.front().length() - 1.0).abs() < 1e-4);
        }
    }

    /// Property: writing a float member only touches its own four bytes
    #[test]
    fn uniform_writes_stay_in_their_slot(value in -1.0e6f32..1.0e6) {
        let layout = UniformLayout::for_mode(ShadingMode::Material);
        let field = *layout.field("material.shininess").unwrap();
        let mut block = UniformBlock::new(layout);
        prop_assert!(block.set("material.shininess", UniformValue::Float(value)));

        for (i, byte) in block.bytes().iter().enumerate() {
            if !(field.offset..field.offset + 4).contains(&i) {
                prop_assert_eq!(*byte, 0);
            }
        }
        let written = &block.bytes()[field.offset..field.offset + 4];
        prop_assert_eq!(f32::from_le_bytes(written.try_into().unwrap()), value);
    }
}

#[test]
fn material_layout_members_are_aligned_and_disjoint() {
    let layout = UniformLayout::for_mode(ShadingMode::Material);
    let mut end = 0;
    for field in layout.fields() {
        assert_eq!(field.offset % field.kind.align(), 0, "{} misaligned", field.name);
        assert!(field.offset >= end, "{} overlaps its predecessor", field.name);
        end = field.offset + field.kind.size();
    }
    assert!(end <= layout.size());
    assert_eq!(layout.size() % 16, 0);
}
