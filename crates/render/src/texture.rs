//! Sampled RGBA textures.

use std::path::Path;

use image::{Rgba, RgbaImage};
use landscape_terrain::OctaveNoise;

use crate::gpu::{GpuDevice, GpuError, TextureDesc, TextureId};

/// Parameters for a grayscale noise texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseTextureParams {
    /// Edge length in pixels.
    pub size: u32,
    /// Noise periods across the texture.
    pub frequency: f64,
    /// Octaves summed per texel.
    pub octaves: u32,
    /// Amplitude falloff per octave.
    pub persistence: f64,
}

impl Default for NoiseTextureParams {
    fn default() -> Self {
        Self {
            size: 256,
            frequency: 8.0,
            octaves: 4,
            persistence: 0.5,
        }
    }
}

/// An uploaded texture and its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
}

impl Texture {
    /// Upload an RGBA8 image.
    pub fn from_rgba(
        gpu: &mut dyn GpuDevice,
        label: &str,
        image: &RgbaImage,
    ) -> Result<Self, GpuError> {
        let (width, height) = image.dimensions();
        let id = gpu.create_texture(&TextureDesc {
            label,
            width,
            height,
            pixels: image.as_raw(),
        })?;
        Ok(Self { id, width, height })
    }

    /// Load and upload an image file.
    pub fn from_file(gpu: &mut dyn GpuDevice, path: &Path) -> Result<Self, GpuError> {
        let image = image::open(path)
            .map_err(|source| GpuError::ImageDecode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        tracing::info!(path = %path.display(), width = image.width(), height = image.height(), "loaded texture");
        let label = path.to_string_lossy();
        Self::from_rgba(gpu, &label, &image)
    }

    /// A 1x1 texture of one color.
    pub fn solid(gpu: &mut dyn GpuDevice, label: &str, color: [u8; 4]) -> Result<Self, GpuError> {
        Self::from_rgba(gpu, label, &RgbaImage::from_pixel(1, 1, Rgba(color)))
    }

    /// Sample `noise` into a grayscale texture and upload it.
    pub fn from_noise<N: OctaveNoise + ?Sized>(
        gpu: &mut dyn GpuDevice,
        label: &str,
        noise: &N,
        params: NoiseTextureParams,
    ) -> Result<Self, GpuError> {
        Self::from_rgba(gpu, label, &noise_image(noise, params))
    }

    /// Device handle.
    pub fn id(&self) -> TextureId {
        self.id
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Grayscale image of octave noise on the z = 1 plane. Alpha is opaque.
pub fn noise_image<N: OctaveNoise + ?Sized>(noise: &N, params: NoiseTextureParams) -> RgbaImage {
    let step = if params.size == 0 {
        0.0
    } else {
        params.frequency / f64::from(params.size)
    };
    RgbaImage::from_fn(params.size, params.size, |x, y| {
        let value = noise.octave_sample(
            step * f64::from(x),
            step * f64::from(y),
            1.0,
            params.octaves,
            params.persistence,
        );
        let gray = (255.0 * value).round() as u8;
        Rgba([gray, gray, gray, 255])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingDevice;
    use landscape_terrain::Perlin;

    #[test]
    fn noise_image_is_gray_and_deterministic() {
        let params = NoiseTextureParams {
            size: 32,
            ..Default::default()
        };
        let a = noise_image(&Perlin::default(), params);
        let b = noise_image(&Perlin::default(), params);
        assert_eq!(a, b);
        assert_eq!(a.dimensions(), (32, 32));
        assert!(a.pixels().all(|p| p[0] == p[1] && p[1] == p[2] && p[3] == 255));
        let first = a.get_pixel(0, 0)[0];
        assert!(a.pixels().any(|p| p[0] != first));
    }

    #[test]
    fn solid_texture_is_one_pixel() {
        let mut gpu = RecordingDevice::default();
        let tex = Texture::solid(&mut gpu, "white", [255; 4]).unwrap();
        assert_eq!((tex.width(), tex.height()), (1, 1));
    }

    #[test]
    fn missing_image_is_decode_error() {
        let mut gpu = RecordingDevice::default();
        let err = Texture::from_file(&mut gpu, Path::new("no/such/texture.png")).unwrap_err();
        assert!(matches!(err, GpuError::ImageDecode { .. }));
    }
}
