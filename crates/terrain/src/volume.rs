use std::fmt;

use serde::{Deserialize, Serialize};

use crate::mesher::Face;
use crate::noise_field::OctaveNoise;
use crate::TerrainError;

/// Reserved material id for empty space.
pub const MATERIAL_EMPTY: u32 = 0;

/// One cell of a [`VoxelVolume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Voxel {
    /// Material id, [`MATERIAL_EMPTY`] for air.
    pub material: u32,
    /// Metadata words carried alongside the material. No meaning is attached yet.
    pub reserved: [u64; 2],
}

impl Voxel {
    /// The empty voxel.
    pub const EMPTY: Voxel = Voxel {
        material: MATERIAL_EMPTY,
        reserved: [0; 2],
    };

    /// Solid voxel with the given material.
    pub const fn solid(material: u32) -> Self {
        Self {
            material,
            reserved: [0; 2],
        }
    }

    /// True when the voxel holds no material.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.material == MATERIAL_EMPTY
    }
}

/// Volume dimensions in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent {
    /// Cells along x.
    pub x: usize,
    /// Cells along y.
    pub y: usize,
    /// Cells along z.
    pub z: usize,
}

impl Extent {
    /// Build an extent.
    pub const fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Total cell count.
    pub const fn volume(self) -> usize {
        self.x * self.y * self.z
    }

    /// Reject extents with a zero dimension.
    pub fn validate(self) -> Result<Self, TerrainError> {
        if self.x == 0 || self.y == 0 || self.z == 0 {
            return Err(TerrainError::EmptyExtent {
                x: self.x,
                y: self.y,
                z: self.z,
            });
        }
        Ok(self)
    }

    /// True when `(x, y, z)` addresses a cell.
    pub fn contains(self, x: i64, y: i64, z: i64) -> bool {
        x >= 0
            && y >= 0
            && z >= 0
            && (x as u64) < self.x as u64
            && (y as u64) < self.y as u64
            && (z as u64) < self.z as u64
    }

    /// Flat index of a cell, x varying fastest.
    #[inline]
    pub fn index(self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.x);
        debug_assert!(y < self.y);
        debug_assert!(z < self.z);
        x + self.x * y + self.x * self.y * z
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.x, self.y, self.z)
    }
}

/// Inputs for thresholded noise generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationParams {
    /// Volume size.
    pub extent: Extent,
    /// Noise periods spanned by the whole volume along each axis.
    pub frequency: f64,
    /// Octave count for fractal sampling.
    pub octaves: u32,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
    /// Cells whose noise value exceeds this become solid.
    pub threshold: f64,
    /// Material written into solid cells.
    pub material: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            extent: Extent::new(32, 16, 32),
            frequency: 4.0,
            octaves: 4,
            persistence: 0.5,
            threshold: 0.5,
            material: 1,
        }
    }
}

impl GenerationParams {
    /// Check every field before any sampling happens.
    pub fn validate(&self) -> Result<(), TerrainError> {
        self.extent.validate()?;
        if self.octaves == 0 {
            return Err(TerrainError::InvalidOctaves(self.octaves));
        }
        if !self.persistence.is_finite() || self.persistence <= 0.0 {
            return Err(TerrainError::InvalidPersistence(self.persistence));
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(TerrainError::InvalidThreshold(self.threshold));
        }
        if !self.frequency.is_finite() {
            return Err(TerrainError::InvalidFrequency(self.frequency));
        }
        if self.material == MATERIAL_EMPTY {
            return Err(TerrainError::EmptyMaterial);
        }
        Ok(())
    }
}

/// Dense grid of voxels, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelVolume {
    extent: Extent,
    voxels: Vec<Voxel>,
}

impl VoxelVolume {
    /// A volume where every cell is empty.
    pub fn new_empty(extent: Extent) -> Result<Self, TerrainError> {
        Self::filled(extent, MATERIAL_EMPTY)
    }

    /// A volume where every cell holds `material`.
    pub fn filled(extent: Extent, material: u32) -> Result<Self, TerrainError> {
        let extent = extent.validate()?;
        Ok(Self {
            extent,
            voxels: vec![Voxel::solid(material); extent.volume()],
        })
    }

    /// Populate a volume cell by cell.
    pub fn from_fn<F>(extent: Extent, mut f: F) -> Result<Self, TerrainError>
    where
        F: FnMut(usize, usize, usize) -> Voxel,
    {
        let extent = extent.validate()?;
        let mut voxels = Vec::with_capacity(extent.volume());
        for z in 0..extent.z {
            for y in 0..extent.y {
                for x in 0..extent.x {
                    voxels.push(f(x, y, z));
                }
            }
        }
        Ok(Self { extent, voxels })
    }

    /// Threshold octave noise into a volume.
    ///
    /// Cell `(i, j, k)` samples the field at `(frequency / X) * i` and likewise
    /// for the other axes, so the volume spans `frequency` noise periods.
    pub fn generate<N: OctaveNoise + ?Sized>(
        noise: &N,
        params: &GenerationParams,
    ) -> Result<Self, TerrainError> {
        params.validate()?;
        let extent = params.extent;
        let step = [
            params.frequency / extent.x as f64,
            params.frequency / extent.y as f64,
            params.frequency / extent.z as f64,
        ];

        let volume = Self::from_fn(extent, |x, y, z| {
            let value = noise.octave_sample(
                step[0] * x as f64,
                step[1] * y as f64,
                step[2] * z as f64,
                params.octaves,
                params.persistence,
            );
            if value > params.threshold {
                Voxel::solid(params.material)
            } else {
                Voxel::EMPTY
            }
        })?;

        tracing::debug!(
            extent = %extent,
            solid = volume.solid_count(),
            threshold = params.threshold,
            "generated voxel volume"
        );
        Ok(volume)
    }

    /// Volume dimensions.
    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// Voxel at a cell, `None` outside the volume.
    pub fn get(&self, x: usize, y: usize, z: usize) -> Option<&Voxel> {
        if x < self.extent.x && y < self.extent.y && z < self.extent.z {
            self.voxels.get(self.extent.index(x, y, z))
        } else {
            None
        }
    }

    /// Voxel at a cell.
    ///
    /// # Panics
    /// Panics when the coordinates lie outside the volume.
    pub fn voxel_at(&self, x: usize, y: usize, z: usize) -> &Voxel {
        match self.get(x, y, z) {
            Some(voxel) => voxel,
            None => panic!("voxel ({x}, {y}, {z}) outside volume {}", self.extent),
        }
    }

    /// True when the cell is empty. Coordinates outside the volume count as empty.
    pub fn is_empty_at(&self, x: i64, y: i64, z: i64) -> bool {
        if !self.extent.contains(x, y, z) {
            return true;
        }
        self.voxels[self.extent.index(x as usize, y as usize, z as usize)].is_empty()
    }

    /// True when the neighbor across `face` is inside the volume and solid.
    pub fn is_solid_neighbor(&self, x: usize, y: usize, z: usize, face: Face) -> bool {
        let [dx, dy, dz] = face.offset();
        !self.is_empty_at(x as i64 + dx, y as i64 + dy, z as i64 + dz)
    }

    /// Number of non-empty cells.
    pub fn solid_count(&self) -> usize {
        self.voxels.iter().filter(|v| !v.is_empty()).count()
    }

    /// Iterate `(x, y, z, voxel)` in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, usize, &Voxel)> + '_ {
        let extent = self.extent;
        self.voxels.iter().enumerate().map(move |(i, voxel)| {
            let x = i % extent.x;
            let y = (i / extent.x) % extent.y;
            let z = i / (extent.x * extent.y);
            (x, y, z, voxel)
        })
    }
}
