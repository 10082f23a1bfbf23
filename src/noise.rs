//! Random noise texture sampled by the fragment shader for colour and
//! position jitter.

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

pub const NOISE_SIZE: u32 = 256;
pub const NOISE_CONTRAST: f32 = 10.0;

#[derive(Debug, Error)]
pub enum NoiseError {
    #[error("noise texture must be non-empty, got {width}x{height}")]
    Empty { width: u32, height: u32 },
    #[error("couldn't write noise texture")]
    Image(#[from] image::ImageError),
}

/// BGRA8 pixels, row-major, matching `wgpu::TextureFormat::Bgra8Unorm`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoiseTexture {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

fn contrast(c: f32) -> u8 {
    let c = ((c - 0.5) * NOISE_CONTRAST + 0.5).clamp(0.0, 1.0);
    (c * 255.0).round() as u8
}

impl NoiseTexture {
    pub fn generate(width: u32, height: u32, seed: u64) -> Result<Self, NoiseError> {
        if width == 0 || height == 0 {
            return Err(NoiseError::Empty { width, height });
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut data = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            let [r, g, b]: [f32; 3] = rng.gen();
            data.extend_from_slice(&[contrast(b), contrast(g), contrast(r), u8::MAX]);
        }

        info!(width, height, seed, "generated noise texture");
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn rgba(&self) -> Vec<u8> {
        self.data
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0], px[3]])
            .collect()
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), NoiseError> {
        image::save_buffer_with_format(
            path.as_ref(),
            &self.rgba(),
            self.width,
            self.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )?;
        Ok(())
    }
}
