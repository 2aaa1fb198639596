//! The fingerprint value produced by every hash algorithm.

use crate::error::CacheError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A fixed-width perceptual fingerprint.
///
/// Bits are packed most-significant first, row by row, so the hex form of
/// an 8x8 hash reads in the same order the pixels were visited.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint {
    bytes: Vec<u8>,
}

impl Fingerprint {
    /// Wrap already-packed hash bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Pack a sequence of bits, most significant bit first.
    ///
    /// A trailing partial byte is zero-padded.
    pub fn from_bits<I>(bits: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut bytes = Vec::new();
        let mut current_byte: u8 = 0;
        let mut bit_position = 0;

        for bit in bits {
            if bit {
                current_byte |= 1 << (7 - bit_position);
            }

            bit_position += 1;

            if bit_position == 8 {
                bytes.push(current_byte);
                current_byte = 0;
                bit_position = 0;
            }
        }

        if bit_position > 0 {
            bytes.push(current_byte);
        }

        Self { bytes }
    }

    /// Parse the lowercase or uppercase hex encoding written by [`Fingerprint::to_hex`]
    pub fn from_hex(hex: &str) -> Result<Self, CacheError> {
        let invalid = |reason: &str| CacheError::InvalidFingerprint {
            value: hex.to_string(),
            reason: reason.to_string(),
        };

        if hex.is_empty() {
            return Err(invalid("empty"));
        }
        if hex.len() % 2 != 0 {
            return Err(invalid("odd number of hex digits"));
        }
        // from_str_radix tolerates a leading '+', so check digits up front
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid("non-hex character"));
        }

        let bytes = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<Result<Vec<u8>, _>>()
            .map_err(|_| invalid("non-hex character"))?;

        Ok(Self { bytes })
    }

    /// Lowercase hex, two characters per byte
    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Hamming distance: the number of differing bits.
    ///
    /// Fingerprints of different widths count every surplus bit as differing.
    pub fn distance(&self, other: &Self) -> u32 {
        let shared: u32 = self
            .bytes
            .iter()
            .zip(other.bytes.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum();
        let surplus = self.bytes.len().abs_diff(other.bytes.len()) as u32 * 8;
        shared + surplus
    }

    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total number of bits
    pub fn bit_count(&self) -> u32 {
        (self.bytes.len() * 8) as u32
    }

    /// Similarity as a percentage (0-100)
    pub fn similarity(&self, other: &Self) -> f64 {
        let max_distance = self.bit_count().max(other.bit_count());
        if max_distance == 0 {
            return 100.0;
        }
        (1.0 - (self.distance(other) as f64 / max_distance as f64)) * 100.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fingerprint::from_hex(s)
    }
}
