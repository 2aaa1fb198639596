//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Resizing the image to (hash_size+1) x hash_size
//! 2. Converting to grayscale
//! 3. Comparing each pixel to the one to its right
//! 4. If left pixel is brighter, set bit to 1, else 0
//!
//! This captures the relative gradient of brightness changes.

use super::super::resize::resize_to_grayscale;
use super::super::traits::{HashAlgorithm, HashAlgorithmKind};
use super::super::Fingerprint;
use crate::error::HashError;
use image::DynamicImage;

/// Difference Hash (dHash) implementation
pub struct DifferenceHasher {
    /// Size of the hash (width and height of comparison grid)
    hash_size: u32,
}

impl DifferenceHasher {
    /// Create a new dHash hasher
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for DifferenceHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        // One extra column to compute differences
        let gray = resize_to_grayscale(image, self.hash_size + 1, self.hash_size)?;

        let size = self.hash_size;
        let bits = (0..size).flat_map(|y| {
            let gray = &gray;
            (0..size).map(move |x| gray.get_pixel(x, y)[0] > gray.get_pixel(x + 1, y)[0])
        });

        Ok(Fingerprint::from_bits(bits))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Difference
    }
}
