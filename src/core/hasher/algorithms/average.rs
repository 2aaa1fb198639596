//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Resizing the image to hash_size x hash_size
//! 2. Converting to grayscale
//! 3. Computing the average brightness
//! 4. For each pixel: if brighter than average, set bit to 1, else 0
//!
//! This is the fastest hash but less robust to edits.

use super::super::traits::{HashAlgorithm, HashAlgorithmKind};
use super::super::Fingerprint;
use crate::error::HashError;
use image::DynamicImage;

/// Average Hash (aHash) implementation
pub struct AverageHasher {
    /// Size of the hash (width and height)
    hash_size: u32,
}

impl AverageHasher {
    /// Create a new aHash hasher
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for AverageHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let gray = image
            .resize_exact(
                self.hash_size,
                self.hash_size,
                image::imageops::FilterType::Lanczos3,
            )
            .to_luma8();

        let total: u64 = gray.pixels().map(|p| p[0] as u64).sum();
        let count = (self.hash_size * self.hash_size) as u64;
        // Integer pixels compare the same against floor(mean) as against mean
        let average = (total / count) as u8;

        Ok(Fingerprint::from_bits(gray.pixels().map(|p| p[0] > average)))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Average
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_images::{quadrants, solid};
    use super::*;

    #[test]
    fn identical_images_produce_identical_hash() {
        let hasher = AverageHasher::new(8);
        let image = quadrants(100);

        let hash1 = hasher.hash_image(&image).unwrap();
        let hash2 = hasher.hash_image(&image).unwrap();

        assert_eq!(hash1.distance(&hash2), 0);
    }

    #[test]
    fn solid_image_produces_uniform_hash() {
        let hasher = AverageHasher::new(8);
        let hash = hasher.hash_image(&solid(100, 100, [128, 128, 128])).unwrap();

        let all_same = hash.as_bytes().iter().all(|&b| b == 0x00)
            || hash.as_bytes().iter().all(|&b| b == 0xFF);
        assert!(all_same);
    }

    #[test]
    fn quadrants_set_half_the_bits() {
        let hasher = AverageHasher::new(8);
        let hash = hasher.hash_image(&quadrants(64)).unwrap();

        let ones: u32 = hash.as_bytes().iter().map(|b| b.count_ones()).sum();
        assert!((28..=36).contains(&ones), "got {} set bits", ones);
    }

    #[test]
    fn kind_returns_average() {
        assert_eq!(AverageHasher::new(8).kind(), HashAlgorithmKind::Average);
    }
}
