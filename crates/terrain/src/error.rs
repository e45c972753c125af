use thiserror::Error;

/// Errors raised when terrain generation parameters are unusable.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    /// One or more volume dimensions was zero.
    #[error("volume extent {x}x{y}x{z} has a zero dimension")]
    EmptyExtent {
        /// Requested size along x.
        x: usize,
        /// Requested size along y.
        y: usize,
        /// Requested size along z.
        z: usize,
    },
    /// Octave sampling needs at least one octave.
    #[error("octave count must be at least 1 (got {0})")]
    InvalidOctaves(u32),
    /// Persistence must be a finite, positive amplitude multiplier.
    #[error("persistence must be finite and greater than zero (got {0})")]
    InvalidPersistence(f64),
    /// Threshold outside the noise output range.
    #[error("threshold must lie in [0, 1] (got {0})")]
    InvalidThreshold(f64),
    /// Frequency must be finite.
    #[error("frequency must be finite (got {0})")]
    InvalidFrequency(f64),
    /// Solid voxels need a non-empty material id.
    #[error("solid material id must be nonzero")]
    EmptyMaterial,
}
