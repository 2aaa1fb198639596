//! # Image Dedup
//!
//! Finds duplicate and near-duplicate images with perceptual hashing.
//!
//! ## Core Philosophy
//! - **Never rehash what hasn't changed** - fingerprints persist in a hash cache
//! - **Deterministic output** - the same collection always yields the same pairs
//! - **Per-file failures never sink a run** - they are logged and skipped
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Hashing, caching, matching, reporting and file dispositions
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - Error types for every component
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DedupError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
/// Honours `RUST_LOG`, falling back to `info`. Calling it twice is harmless.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
