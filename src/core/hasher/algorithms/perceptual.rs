//! Perceptual Hash (pHash) implementation.
//!
//! pHash runs a Discrete Cosine Transform over the downsampled image and
//! keeps the low frequencies, which makes it robust to:
//! - Scaling
//! - Brightness/contrast changes
//! - Compression artifacts
//!
//! The DCT and bit extraction come from the image_hasher crate.

use super::super::traits::{HashAlgorithm, HashAlgorithmKind};
use super::super::Fingerprint;
use crate::error::HashError;
use image::DynamicImage;
use image_hasher::{HashAlg, HasherConfig as ImageHasherConfig};

/// Perceptual Hash (pHash) implementation using DCT
pub struct PerceptualHasher {
    hasher: image_hasher::Hasher,
}

impl PerceptualHasher {
    /// Create a new pHash hasher
    pub fn new(hash_size: u32) -> Self {
        let hasher = ImageHasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Mean)
            .preproc_dct()
            .to_hasher();

        Self { hasher }
    }
}

impl HashAlgorithm for PerceptualHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let hash = self.hasher.hash_image(image);
        Ok(Fingerprint::new(hash.as_bytes().to_vec()))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Perceptual
    }
}
