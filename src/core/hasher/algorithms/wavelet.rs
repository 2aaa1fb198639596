//! Wavelet Hash (wHash) implementation.
//!
//! wHash works by:
//! 1. Resizing the grayscale image to a power-of-two square
//! 2. Running Haar low-pass steps (2x2 averaging) down to hash_size x hash_size
//! 3. Setting a bit for every coefficient above the median
//!
//! Only the LL band is kept at each level, so fine detail and noise drop out
//! before the comparison.

use super::super::resize::resize_to_grayscale;
use super::super::traits::{HashAlgorithm, HashAlgorithmKind};
use super::super::Fingerprint;
use crate::error::HashError;
use image::DynamicImage;

/// Upper bound on the working resolution
const MAX_IMAGE_SCALE: u32 = 256;

/// Wavelet Hash (wHash) implementation
pub struct WaveletHasher {
    /// Width and height of the final LL band; always a power of two
    hash_size: u32,
}

impl WaveletHasher {
    /// Create a new wHash hasher.
    ///
    /// The Haar decomposition halves the image each level, so a hash size
    /// that is not a power of two is rounded up to the next one.
    pub fn new(hash_size: u32) -> Self {
        Self {
            hash_size: hash_size.max(2).next_power_of_two(),
        }
    }

    /// Working resolution: the largest power of two that fits the image,
    /// never smaller than the hash itself
    fn image_scale(&self, width: u32, height: u32) -> u32 {
        let shortest = width.min(height).max(1);
        let fitting = 1u32 << (31 - shortest.leading_zeros());
        fitting.clamp(self.hash_size, MAX_IMAGE_SCALE.max(self.hash_size))
    }
}

/// One Haar analysis step, keeping only the LL band
fn haar_low_pass(values: &[f32], size: usize) -> Vec<f32> {
    let half = size / 2;
    let mut next = Vec::with_capacity(half * half);

    for y in 0..half {
        for x in 0..half {
            let top = 2 * y * size + 2 * x;
            let bottom = top + size;
            next.push((values[top] + values[top + 1] + values[bottom] + values[bottom + 1]) / 4.0);
        }
    }

    next
}

fn median(values: &[f32]) -> f32 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

impl HashAlgorithm for WaveletHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let scale = self.image_scale(image.width(), image.height());
        let gray = resize_to_grayscale(image, scale, scale)?;

        let mut size = scale as usize;
        let mut values: Vec<f32> = gray.pixels().map(|p| p[0] as f32 / 255.0).collect();

        while size > self.hash_size as usize {
            values = haar_low_pass(&values, size);
            size /= 2;
        }

        let threshold = median(&values);
        Ok(Fingerprint::from_bits(values.iter().map(|&v| v > threshold)))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Wavelet
    }
}
