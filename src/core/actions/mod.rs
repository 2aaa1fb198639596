//! # Actions Module
//!
//! Moves, copies or deletes files flagged as duplicates.
//!
//! By convention the first path of a [`DuplicatePair`] is kept and the
//! second is acted upon. Every file is handled on its own: a file that has
//! already disappeared is skipped, any other failure is recorded and the
//! batch carries on.
//!
//! Deletion is permanent. Nothing in this module asks for confirmation, so
//! callers must obtain it before calling [`ActionExecutor::delete`].

mod executor;

pub use executor::ActionExecutor;

use crate::core::comparator::DuplicatePair;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

/// What to do with duplicates after a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Leave files where they are
    #[default]
    None,
    /// Move duplicates into the action directory
    Move,
    /// Copy duplicates into the action directory, keeping the source
    Copy,
}

impl ActionKind {
    /// Name used in configuration
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::None => "none",
            ActionKind::Move => "move",
            ActionKind::Copy => "copy",
        }
    }

    /// Parse a configured name, falling back to `None` for anything unknown
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!(action = %name, "Unknown action type, no files will be touched");
            ActionKind::None
        })
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ActionKind::None),
            "move" => Ok(ActionKind::Move),
            "copy" => Ok(ActionKind::Copy),
            other => Err(format!("unknown action '{}' (expected none, move or copy)", other)),
        }
    }
}

/// One file that could not be handled
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a move, copy or delete batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionResult {
    /// Files an operation was started for
    pub attempted: usize,
    /// Files moved, copied or deleted
    pub succeeded: usize,
    /// Files that were already gone
    pub skipped: usize,
    /// Files that failed
    pub failed: usize,
    /// Details for each failure
    pub failures: Vec<ActionFailure>,
    /// True when the batch stopped early on cancellation
    pub cancelled: bool,
}

impl DispositionResult {
    /// Number of files successfully acted upon
    pub fn count(&self) -> usize {
        self.succeeded
    }
}

/// The files a "delete duplicates" request acts on.
///
/// The second path of each pair, without repeats, in first-seen order.
pub fn duplicates_to_delete(pairs: &[DuplicatePair]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    pairs
        .iter()
        .filter(|pair| seen.insert(&pair.duplicate))
        .map(|pair| pair.duplicate.clone())
        .collect()
}
