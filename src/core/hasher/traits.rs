//! Trait definitions for perceptual hashing.

use super::decode::ImageDecoder;
use super::Fingerprint;
use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Available hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithmKind {
    /// Average Hash (aHash) - Fast, good for exact duplicates
    Average,
    /// Perceptual Hash (pHash) - DCT-based, robust to edits
    Perceptual,
    /// Difference Hash (dHash) - Good balance of speed and accuracy
    Difference,
    /// Wavelet Hash (wHash) - Haar wavelet low band, robust to scaling
    Wavelet,
}

impl HashAlgorithmKind {
    /// All algorithms, in configuration order
    pub const ALL: [HashAlgorithmKind; 4] = [
        HashAlgorithmKind::Average,
        HashAlgorithmKind::Perceptual,
        HashAlgorithmKind::Difference,
        HashAlgorithmKind::Wavelet,
    ];

    /// The short name used in configuration files and reports
    pub fn config_name(&self) -> &'static str {
        match self {
            HashAlgorithmKind::Average => "ahash",
            HashAlgorithmKind::Perceptual => "phash",
            HashAlgorithmKind::Difference => "dhash",
            HashAlgorithmKind::Wavelet => "whash",
        }
    }

    /// Resolve a configured name, falling back to dHash for unknown values.
    ///
    /// An unknown name is not an error: it is logged and the default is used.
    pub fn from_name_or_default(name: &str) -> Self {
        match name.parse() {
            Ok(kind) => kind,
            Err(UnknownAlgorithm(raw)) => {
                tracing::warn!(
                    hash_type = %raw,
                    "Unknown hash type, defaulting to {}",
                    HashAlgorithmKind::Difference.config_name()
                );
                HashAlgorithmKind::Difference
            }
        }
    }

    /// Get a human-readable description of the algorithm
    pub fn description(&self) -> &'static str {
        match self {
            HashAlgorithmKind::Average => {
                "Average Hash (aHash) - Fast comparison based on average brightness"
            }
            HashAlgorithmKind::Perceptual => {
                "Perceptual Hash (pHash) - DCT-based, robust to edits and transformations"
            }
            HashAlgorithmKind::Difference => {
                "Difference Hash (dHash) - Compares brightness gradients between pixels"
            }
            HashAlgorithmKind::Wavelet => {
                "Wavelet Hash (wHash) - Haar wavelet low band compared to its median"
            }
        }
    }
}

impl Default for HashAlgorithmKind {
    fn default() -> Self {
        HashAlgorithmKind::Difference
    }
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Average => write!(f, "aHash"),
            HashAlgorithmKind::Perceptual => write!(f, "pHash"),
            HashAlgorithmKind::Difference => write!(f, "dHash"),
            HashAlgorithmKind::Wavelet => write!(f, "wHash"),
        }
    }
}

/// A hash type name that matched no known algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAlgorithm(pub String);

impl std::fmt::Display for UnknownAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown hash type '{}'", self.0)
    }
}

impl std::error::Error for UnknownAlgorithm {}

impl FromStr for HashAlgorithmKind {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ahash" | "average" => Ok(HashAlgorithmKind::Average),
            "phash" | "perceptual" => Ok(HashAlgorithmKind::Perceptual),
            "dhash" | "difference" => Ok(HashAlgorithmKind::Difference),
            "whash" | "wavelet" => Ok(HashAlgorithmKind::Wavelet),
            _ => Err(UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Trait for hash algorithm implementations
pub trait HashAlgorithm: Send + Sync {
    /// Compute a fingerprint from an already-decoded image
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError>;

    /// Decode a file and fingerprint it.
    ///
    /// - JPEG: zune-jpeg, falling back to the image crate
    /// - Other formats: image crate
    fn hash_file(&self, path: &Path) -> Result<Fingerprint, HashError> {
        let image = ImageDecoder::decode(path)?;
        self.hash_image(&image).map_err(|e| match e {
            HashError::DecodeError { reason, .. } => HashError::DecodeError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Get the algorithm kind
    fn kind(&self) -> HashAlgorithmKind;
}
