//! Deterministic scalar noise fields for terrain generation.
//!
//! Every source yields values in `[0, 1]`. Sources that can be resampled at
//! several frequencies implement [`OctaveNoise`] and get fractal sampling for
//! free.

use noise::NoiseFn;

/// Ken Perlin's reference permutation.
const PERMUTATION: [u8; 256] = [
    151, 160, 137, 91, 90, 15, 131, 13, 201, 95, 96, 53, 194, 233, 7, 225, 140, 36, 103, 30, 69,
    142, 8, 99, 37, 240, 21, 10, 23, 190, 6, 148, 247, 120, 234, 75, 0, 26, 197, 62, 94, 252, 219,
    203, 117, 35, 11, 32, 57, 177, 33, 88, 237, 149, 56, 87, 174, 20, 125, 136, 171, 168, 68, 175,
    74, 165, 71, 134, 139, 48, 27, 166, 77, 146, 158, 231, 83, 111, 229, 122, 60, 211, 133, 230,
    220, 105, 92, 41, 55, 46, 245, 40, 244, 102, 143, 54, 65, 25, 63, 161, 1, 216, 80, 73, 209, 76,
    132, 187, 208, 89, 18, 169, 200, 196, 135, 130, 116, 188, 159, 86, 164, 100, 109, 198, 173,
    186, 3, 64, 52, 217, 226, 250, 124, 123, 5, 202, 38, 147, 118, 126, 255, 82, 85, 212, 207, 206,
    59, 227, 47, 16, 58, 17, 182, 189, 28, 42, 223, 183, 170, 213, 119, 248, 152, 2, 44, 154, 163,
    70, 221, 153, 101, 155, 167, 43, 172, 9, 129, 22, 39, 253, 19, 98, 108, 110, 79, 113, 224, 232,
    178, 185, 112, 104, 218, 246, 97, 228, 251, 34, 242, 193, 238, 210, 144, 12, 191, 179, 162,
    241, 81, 51, 145, 235, 249, 14, 239, 107, 49, 192, 214, 31, 181, 199, 106, 157, 184, 84, 204,
    176, 115, 121, 50, 45, 127, 4, 150, 254, 138, 236, 205, 93, 222, 114, 67, 29, 24, 72, 243, 141,
    128, 195, 78, 66, 215, 61, 156, 180,
];

/// A scalar field sampled at continuous 3D coordinates.
pub trait NoiseSource {
    /// Sample the field. The result lies in `[0, 1]`.
    fn sample(&self, x: f64, y: f64, z: f64) -> f64;
}

/// Fractal sampling built from repeated [`NoiseSource::sample`] calls.
pub trait OctaveNoise: NoiseSource {
    /// Sum `octaves` samples at frequencies 1, 2, 4, ... with amplitudes
    /// 1, p, p², ... and normalize by the amplitude total.
    ///
    /// Returns `0.0` when `octaves` is zero. With one octave the result is
    /// exactly [`NoiseSource::sample`].
    fn octave_sample(&self, x: f64, y: f64, z: f64, octaves: u32, persistence: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        let mut max_value = 0.0;

        for _ in 0..octaves {
            total += self.sample(x * frequency, y * frequency, z * frequency) * amplitude;
            max_value += amplitude;

            amplitude *= persistence;
            frequency *= 2.0;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        (total / max_value).clamp(0.0, 1.0)
    }
}

/// Classic improved Perlin noise over the reference permutation table.
#[derive(Debug, Clone)]
pub struct Perlin {
    repeat: u32,
    perm: [u8; 512],
}

impl Default for Perlin {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Perlin {
    /// Create a Perlin field. A nonzero `repeat` tiles the field with that
    /// period along every axis; zero disables wrapping.
    pub fn new(repeat: u32) -> Self {
        let mut perm = [0u8; 512];
        for (i, slot) in perm.iter_mut().enumerate() {
            *slot = PERMUTATION[i & 255];
        }
        Self { repeat, perm }
    }

    /// Tiling period, zero when the field does not repeat.
    pub fn repeat(&self) -> u32 {
        self.repeat
    }

    fn wrap(&self, coord: f64) -> f64 {
        if self.repeat > 0 {
            coord.rem_euclid(f64::from(self.repeat))
        } else {
            coord
        }
    }

    fn inc(&self, lattice: i64) -> i64 {
        let next = lattice + 1;
        if self.repeat > 0 {
            next.rem_euclid(i64::from(self.repeat))
        } else {
            next
        }
    }

    fn hash(&self, x: i64, y: i64, z: i64) -> u8 {
        let p = |i: usize| self.perm[i] as usize;
        let idx = |v: i64| (v & 255) as usize;
        self.perm[p(p(idx(x)) + idx(y)) + idx(z)]
    }
}

fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

fn grad(hash: u8, x: f64, y: f64, z: f64) -> f64 {
    match hash & 0xF {
        0x0 => x + y,
        0x1 => -x + y,
        0x2 => x - y,
        0x3 => -x - y,
        0x4 => x + z,
        0x5 => -x + z,
        0x6 => x - z,
        0x7 => -x - z,
        0x8 => y + z,
        0x9 => -y + z,
        0xA => y - z,
        0xB => -y - z,
        0xC => y + x,
        0xD => -y + z,
        0xE => y - x,
        _ => -y - z,
    }
}

impl NoiseSource for Perlin {
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let (x, y, z) = (self.wrap(x), self.wrap(y), self.wrap(z));

        let (x0, y0, z0) = (x.floor(), y.floor(), z.floor());
        let (xf, yf, zf) = (x - x0, y - y0, z - z0);
        let (xi, yi, zi) = (x0 as i64, y0 as i64, z0 as i64);
        let (xn, yn, zn) = (self.inc(xi), self.inc(yi), self.inc(zi));

        let (u, v, w) = (fade(xf), fade(yf), fade(zf));

        let aaa = self.hash(xi, yi, zi);
        let aba = self.hash(xi, yn, zi);
        let aab = self.hash(xi, yi, zn);
        let abb = self.hash(xi, yn, zn);
        let baa = self.hash(xn, yi, zi);
        let bba = self.hash(xn, yn, zi);
        let bab = self.hash(xn, yi, zn);
        let bbb = self.hash(xn, yn, zn);

        let x1 = lerp(grad(aaa, xf, yf, zf), grad(baa, xf - 1.0, yf, zf), u);
        let x2 = lerp(
            grad(aba, xf, yf - 1.0, zf),
            grad(bba, xf - 1.0, yf - 1.0, zf),
            u,
        );
        let y1 = lerp(x1, x2, v);

        let x1 = lerp(
            grad(aab, xf, yf, zf - 1.0),
            grad(bab, xf - 1.0, yf, zf - 1.0),
            u,
        );
        let x2 = lerp(
            grad(abb, xf, yf - 1.0, zf - 1.0),
            grad(bbb, xf - 1.0, yf - 1.0, zf - 1.0),
            u,
        );
        let y2 = lerp(x1, x2, v);

        ((lerp(y1, y2, w) + 1.0) / 2.0).clamp(0.0, 1.0)
    }
}

impl OctaveNoise for Perlin {}

/// Seeded Perlin noise backed by the `noise` crate.
pub struct SeededPerlin {
    perlin: noise::Perlin,
    seed: u32,
}

impl SeededPerlin {
    /// Create a seeded generator.
    pub fn new(seed: u32) -> Self {
        Self {
            perlin: noise::Perlin::new(seed),
            seed,
        }
    }

    /// Seed the generator was built with.
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl NoiseSource for SeededPerlin {
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        // Map from [-1, 1] to [0, 1]
        ((self.perlin.get([x, y, z]) + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

impl OctaveNoise for SeededPerlin {}

/// Averages several sources into one field.
#[derive(Default)]
pub struct CompositeNoise {
    sources: Vec<Box<dyn NoiseSource>>,
}

impl CompositeNoise {
    /// Create an empty composite. It samples as `0.0` until a source is added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a source, builder style.
    pub fn with<S: NoiseSource + 'static>(mut self, source: S) -> Self {
        self.push(source);
        self
    }

    /// Add a source.
    pub fn push<S: NoiseSource + 'static>(&mut self, source: S) {
        self.sources.push(Box::new(source));
    }

    /// Number of averaged sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when no sources have been added.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl NoiseSource for CompositeNoise {
    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        if self.sources.is_empty() {
            return 0.0;
        }
        let total: f64 = self.sources.iter().map(|s| s.sample(x, y, z)).sum();
        total / self.sources.len() as f64
    }
}

impl OctaveNoise for CompositeNoise {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perlin_determinism() {
        let a = Perlin::new(0);
        let b = Perlin::new(0);

        for x in 0..10 {
            for y in 0..10 {
                let (fx, fy) = (x as f64 * 0.37, y as f64 * 0.73);
                assert_eq!(
                    a.sample(fx, fy, 1.5),
                    b.sample(fx, fy, 1.5),
                    "Noise not deterministic at ({}, {})",
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_perlin_lattice_points_are_midpoint() {
        let perlin = Perlin::new(0);
        for x in -4..4 {
            for y in -4..4 {
                let value = perlin.sample(x as f64, y as f64, 3.0);
                assert_eq!(value, 0.5, "lattice point ({}, {}) not 0.5", x, y);
            }
        }
    }

    #[test]
    fn test_perlin_range() {
        let perlin = Perlin::new(0);
        for x in 0..40 {
            for y in 0..40 {
                let val = perlin.sample(x as f64 * 0.13 - 2.0, y as f64 * 0.29, 0.61);
                assert!((0.0..=1.0).contains(&val), "Noise value {} out of range", val);
            }
        }
    }

    #[test]
    fn test_perlin_varies_between_lattice_points() {
        let perlin = Perlin::new(0);
        let mut any_different = false;
        for i in 0..20 {
            let v = perlin.sample(i as f64 * 0.41 + 0.25, 0.33, 0.77);
            if (v - 0.5).abs() > 0.01 {
                any_different = true;
                break;
            }
        }
        assert!(any_different, "Perlin noise should not be flat");
    }

    #[test]
    fn test_repeat_wraps_coordinates() {
        let perlin = Perlin::new(8);
        assert_eq!(perlin.repeat(), 8);
        let base = perlin.sample(1.25, 2.5, 0.75);
        assert_eq!(base, perlin.sample(9.25, 2.5, 0.75));
        assert_eq!(base, perlin.sample(1.25, -5.5, 0.75));
    }

    #[test]
    fn test_octave_zero_is_zero() {
        let perlin = Perlin::default();
        assert_eq!(perlin.octave_sample(0.3, 0.4, 0.5, 0, 0.5), 0.0);
    }

    #[test]
    fn test_single_octave_matches_sample() {
        let perlin = Perlin::default();
        let direct = perlin.sample(0.3, 0.4, 0.5);
        assert_eq!(perlin.octave_sample(0.3, 0.4, 0.5, 1, 0.5), direct);
    }

    #[test]
    fn test_seeded_perlin_determinism() {
        let a = SeededPerlin::new(42);
        let b = SeededPerlin::new(42);
        assert_eq!(a.seed(), 42);
        for i in 0..16 {
            let p = i as f64 * 0.31;
            assert_eq!(a.sample(p, p * 0.5, 1.1), b.sample(p, p * 0.5, 1.1));
            assert!((0.0..=1.0).contains(&a.octave_sample(p, 0.2, 0.9, 4, 0.5)));
        }
    }

    #[test]
    fn test_composite_averages_sources() {
        struct Constant(f64);
        impl NoiseSource for Constant {
            fn sample(&self, _x: f64, _y: f64, _z: f64) -> f64 {
                self.0
            }
        }

        let empty = CompositeNoise::new();
        assert!(empty.is_empty());
        assert_eq!(empty.sample(1.0, 2.0, 3.0), 0.0);

        let composite = CompositeNoise::new().with(Constant(0.2)).with(Constant(0.6));
        assert_eq!(composite.len(), 2);
        assert!((composite.sample(0.0, 0.0, 0.0) - 0.4).abs() < 1e-12);
    }
}
