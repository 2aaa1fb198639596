//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Hash cache events
    Cache(CacheEvent),
    /// Hashing phase events
    Hash(HashEvent),
    /// Comparison phase events
    Compare(CompareEvent),
    /// Move/copy/delete events
    Action(ActionEvent),
    /// Run-level events
    Pipeline(PipelineEvent),
}

/// Events from the hash cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CacheEvent {
    /// Cache loaded (zero entries when rebuilding or missing)
    Loaded { entries: usize },
    /// Stale entries removed
    Pruned { removed: usize },
    /// Cache written to disk
    Saved { entries: usize },
}

/// Events during the hashing phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Hashing has started
    Started {
        total_candidates: usize,
        to_hash: usize,
    },
    /// Progress update during hashing
    Progress(HashProgress),
    /// A file could not be hashed; it is retried on the next run
    Error { path: PathBuf, message: String },
    /// Hashing completed
    Completed {
        hashed: usize,
        cache_hits: usize,
        failed: usize,
    },
}

/// Progress information during hashing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Number of files processed so far (hashed or failed)
    pub completed: usize,
    /// Total number of files that need hashing
    pub total: usize,
    /// File that just finished
    pub current_path: PathBuf,
}

/// Events during the comparison phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Comparison has started
    Started { total_fingerprints: usize },
    /// Progress update during comparison
    Progress(CompareProgress),
    /// Comparison completed
    Completed { total_pairs: usize },
}

/// Progress information during comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Number of comparisons completed
    pub comparisons_completed: usize,
    /// Total number of comparisons needed
    pub total_comparisons: usize,
    /// Number of duplicate pairs found so far
    pub pairs_found: usize,
}

/// Events while moving, copying or deleting duplicates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionEvent {
    /// A batch has started
    Started { operation: String, total: usize },
    /// One file was handled successfully
    Completed {
        path: PathBuf,
        destination: Option<PathBuf>,
    },
    /// A file was already gone
    Skipped { path: PathBuf },
    /// A file failed; the batch continues
    Failed { path: PathBuf, message: String },
    /// The batch finished
    Finished {
        succeeded: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Run-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Run has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Run completed successfully
    Completed { summary: PipelineSummary },
    /// Run was cancelled
    Cancelled,
    /// Run hit a fatal error
    Error { message: String },
}

/// Phases of a run, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Hashing,
    Pruning,
    PersistingCache,
    Matching,
    Reporting,
    Disposing,
}

/// Summary of a completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Candidate files supplied
    pub total_candidates: usize,
    /// Fingerprints available for matching
    pub fingerprints: usize,
    /// Duplicate pairs found
    pub duplicate_pairs: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Hashing => write!(f, "Hashing"),
            PipelinePhase::Pruning => write!(f, "Pruning cache"),
            PipelinePhase::PersistingCache => write!(f, "Saving cache"),
            PipelinePhase::Matching => write!(f, "Matching"),
            PipelinePhase::Reporting => write!(f, "Writing report"),
            PipelinePhase::Disposing => write!(f, "Handling duplicates"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Hash(HashEvent::Progress(HashProgress {
            completed: 10,
            total: 50,
            current_path: PathBuf::from("/photos/a.png"),
        }));

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Hash(HashEvent::Progress(p)) => assert_eq!(p.total, 50),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn phase_display_is_readable() {
        assert_eq!(PipelinePhase::PersistingCache.to_string(), "Saving cache");
        assert_eq!(PipelinePhase::Matching.to_string(), "Matching");
    }
}
