//! Trait definitions for comparison strategies.

/// Strategy trait for deciding whether two fingerprints are duplicates
pub trait ComparisonStrategy: Send + Sync {
    /// Determine if two images are duplicates based on Hamming distance
    fn is_duplicate(&self, distance: u32) -> bool;

    /// Get the threshold used
    fn threshold(&self) -> u32;

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Threshold-based comparison: duplicate iff `distance <= threshold`.
///
/// Distance 0 always qualifies, so a threshold of 0 reports exact
/// perceptual matches only.
#[derive(Debug, Clone)]
pub struct ThresholdStrategy {
    /// Maximum distance to consider as duplicate
    threshold: u32,
}

impl ThresholdStrategy {
    /// Create a new threshold strategy
    ///
    /// Recommended thresholds for 64-bit fingerprints:
    /// - 0: Exact perceptual matches only
    /// - 5: Conservative, few false positives
    /// - 8: Balanced (default)
    /// - 10: Permissive, catches more near-duplicates
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Create an exact-only strategy (threshold = 0)
    pub fn exact() -> Self {
        Self::new(0)
    }

    /// Create a balanced strategy (threshold = 8)
    pub fn balanced() -> Self {
        Self::new(8)
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::balanced()
    }
}

impl ComparisonStrategy for ThresholdStrategy {
    fn is_duplicate(&self, distance: u32) -> bool {
        distance <= self.threshold
    }

    fn threshold(&self) -> u32 {
        self.threshold
    }

    fn description(&self) -> String {
        format!(
            "Threshold strategy: images with distance <= {} are considered duplicates",
            self.threshold
        )
    }
}
