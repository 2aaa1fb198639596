//! # Core Module
//!
//! The front-end agnostic duplicate detection engine.
//!
//! ## Modules
//! - `scanner` - Discovers candidate images in directories
//! - `hasher` - Computes perceptual fingerprints
//! - `cache` - Persists fingerprints to avoid recomputation
//! - `comparator` - Finds duplicate pairs by comparing fingerprints
//! - `reporter` - Writes the duplicate report and exports
//! - `actions` - Moves, copies or deletes duplicates
//! - `pipeline` - Orchestrates the full workflow

pub mod actions;
pub mod cache;
pub mod comparator;
pub mod hasher;
pub mod pipeline;
pub mod reporter;
pub mod scanner;

// Re-export commonly used types
pub use actions::{ActionKind, DispositionResult};
pub use comparator::{DuplicatePair, MatchType};
pub use hasher::{Fingerprint, HashAlgorithmKind};
pub use pipeline::{CancellationToken, DedupEngine, EngineConfig, RunResult};
