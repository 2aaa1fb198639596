//! # Pipeline Module
//!
//! Orchestrates the full duplicate detection workflow.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Take the caller's candidate paths
//! 2. **Hash** - Fingerprint files missing from the cache
//! 3. **Prune** - Drop cache entries for files that are gone
//! 4. **Persist** - Atomically save the cache
//! 5. **Match** - Compare every fingerprint pair
//! 6. **Report** - Write the text report
//!
//! Disposing of duplicates is a separate, explicit call on the engine.
//!
//! ## Parallelism
//! Uses rayon for parallel hashing across multiple CPU cores. Results are
//! collected and merged into the cache on the calling thread.

mod cancel;
mod config;
mod executor;

pub use crate::events::PipelinePhase;
pub use cancel::CancellationToken;
pub use config::{EngineConfig, EngineConfigBuilder, EngineSettings, DEFAULT_THRESHOLD};
pub use executor::{DedupEngine, RunResult};
