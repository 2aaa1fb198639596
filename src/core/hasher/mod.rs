//! # Hasher Module
//!
//! Computes perceptual fingerprints for images.
//!
//! ## Supported Algorithms
//! - **aHash (Average Hash)** - Fastest, good for exact duplicates
//! - **pHash (Perceptual Hash)** - DCT-based, robust to edits
//! - **dHash (Difference Hash)** - Best balance of speed and accuracy (default)
//! - **wHash (Wavelet Hash)** - Haar wavelet, robust to scaling
//!
//! ## How It Works
//! 1. Decode the file (zune-jpeg for JPEG, image crate otherwise)
//! 2. Downsample to a small grayscale grid
//! 3. Derive one bit per cell from pixel relationships
//! 4. Compare fingerprints using Hamming distance
//!
//! ## Example
//! ```rust,ignore
//! use image_dedup::core::hasher::{HasherConfig, HashAlgorithmKind};
//!
//! let hasher = HasherConfig::new()
//!     .algorithm(HashAlgorithmKind::Difference)
//!     .hash_size(8)
//!     .build();
//!
//! let fingerprint = hasher.hash_file(&path)?;
//! ```

mod algorithms;
pub mod decode;
mod fingerprint;
pub mod resize;
mod traits;

pub use algorithms::{AverageHasher, DifferenceHasher, PerceptualHasher, WaveletHasher};
pub use fingerprint::Fingerprint;
pub use traits::{HashAlgorithm, HashAlgorithmKind, UnknownAlgorithm};

/// Default hash size: 8x8 = 64 bits
pub const DEFAULT_HASH_SIZE: u32 = 8;

/// Largest accepted grid size (4096-bit fingerprints)
pub const MAX_HASH_SIZE: u32 = 64;

/// Configuration builder for hashers
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Hash size (8, 16, or 32)
    hash_size: u32,
    /// Algorithm to use
    algorithm: HashAlgorithmKind,
}

impl HasherConfig {
    /// Create a new hasher configuration with defaults
    pub fn new() -> Self {
        Self {
            hash_size: DEFAULT_HASH_SIZE,
            algorithm: HashAlgorithmKind::Difference,
        }
    }

    /// Set the hash size (8, 16, or 32)
    ///
    /// Larger sizes are more accurate but slower, and change the fingerprint
    /// width, so thresholds tuned for 64 bits no longer apply.
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size.clamp(2, MAX_HASH_SIZE);
        self
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the hasher
    pub fn build(self) -> Box<dyn HashAlgorithm> {
        match self.algorithm {
            HashAlgorithmKind::Average => Box::new(AverageHasher::new(self.hash_size)),
            HashAlgorithmKind::Perceptual => Box::new(PerceptualHasher::new(self.hash_size)),
            HashAlgorithmKind::Difference => Box::new(DifferenceHasher::new(self.hash_size)),
            HashAlgorithmKind::Wavelet => Box::new(WaveletHasher::new(self.hash_size)),
        }
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}
