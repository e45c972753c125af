//! Property-based tests for noise sampling and volume generation
//!
//! Validates that for arbitrary coordinates and parameters:
//! - Samples stay within [0, 1]
//! - Sampling is deterministic
//! - Repeating fields tile with their period
//! - One octave is plain sampling
//! - Volume generation is a pure function of its inputs

use landscape_terrain::{
    Extent, GenerationParams, NoiseSource, OctaveNoise, Perlin, SeededPerlin, VoxelVolume,
};
use proptest::prelude::*;

proptest! {
    /// Property: single samples never leave [0, 1]
    #[test]
    fn perlin_sample_in_unit_range(
        x in -1000.0f64..1000.0,
        y in -1000.0f64..1000.0,
        z in -1000.0f64..1000.0,
    ) {
        let value = Perlin::default().sample(x, y, z);
        prop_assert!((0.0..=1.0).contains(&value), "sample {} out of range", value);
    }

    /// Property: octave sampling stays in [0, 1] for any positive persistence
    #[test]
    fn octave_sample_in_unit_range(
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        z in -100.0f64..100.0,
        octaves in 1u32..8,
        persistence in 0.01f64..2.0,
    ) {
        let value = Perlin::default().octave_sample(x, y, z, octaves, persistence);
        prop_assert!((0.0..=1.0).contains(&value), "octave sample {} out of range", value);
    }

    /// Property: two fields with the same parameters agree everywhere
    #[test]
    fn perlin_is_deterministic(
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        z in -100.0f64..100.0,
        repeat in 0u32..64,
    ) {
        let a = Perlin::new(repeat);
        let b = Perlin::new(repeat);
        prop_assert_eq!(a.sample(x, y, z), b.sample(x, y, z));
    }

    /// Property: shifting any axis by the period leaves the sample unchanged
    ///
    /// Coordinates are multiples of 1/8 so the shift is exact in f64.
    #[test]
    fn repeat_tiles_with_period(
        eighths in prop::array::uniform3(-512i32..512),
        repeat in 1u32..32,
        shift in -4i32..4,
    ) {
        let perlin = Perlin::new(repeat);
        let [x, y, z] = eighths.map(|e| e as f64 / 8.0);
        let offset = f64::from(repeat) * f64::from(shift);
        let base = perlin.sample(x, y, z);
        prop_assert_eq!(base, perlin.sample(x + offset, y, z));
        prop_assert_eq!(base, perlin.sample(x, y + offset, z));
        prop_assert_eq!(base, perlin.sample(x, y, z + offset));
    }

    /// Property: one octave equals a plain sample, whatever the persistence
    #[test]
    fn single_octave_is_plain_sample(
        x in -100.0f64..100.0,
        y in -100.0f64..100.0,
        z in -100.0f64..100.0,
        persistence in 0.01f64..4.0,
    ) {
        let perlin = Perlin::default();
        prop_assert_eq!(perlin.octave_sample(x, y, z, 1, persistence), perlin.sample(x, y, z));
    }

    /// Property: seeded noise is reproducible and in range
    #[test]
    fn seeded_perlin_reproducible(
        seed in any::<u32>(),
        x in -100.0f64..100.0,
        z in -100.0f64..100.0,
    ) {
        let a = SeededPerlin::new(seed).sample(x, 0.5, z);
        let b = SeededPerlin::new(seed).sample(x, 0.5, z);
        prop_assert_eq!(a, b);
        prop_assert!((0.0..=1.0).contains(&a));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: identical inputs generate identical volumes
    #[test]
    fn volume_generation_is_deterministic(
        x in 1usize..10,
        y in 1usize..10,
        z in 1usize..10,
        frequency in 0.5f64..8.0,
        octaves in 1u32..5,
        threshold in 0.0f64..1.0,
    ) {
        let params = GenerationParams {
            extent: Extent::new(x, y, z),
            frequency,
            octaves,
            persistence: 0.5,
            threshold,
            material: 1,
        };
        let a = VoxelVolume::generate(&Perlin::default(), &params).unwrap();
        let b = VoxelVolume::generate(&Perlin::default(), &params).unwrap();
        prop_assert_eq!(a, b);
    }
}

#[test]
fn generation_params_deserialize_with_defaults() {
    let params: GenerationParams =
        serde_json::from_str(r#"{ "octaves": 6, "extent": { "x": 4, "y": 5, "z": 6 } }"#).unwrap();
    assert_eq!(params.octaves, 6);
    assert_eq!(params.extent, Extent::new(4, 5, 6));
    assert_eq!(params.threshold, GenerationParams::default().threshold);
    params.validate().unwrap();
}
