//! # Comparator Module
//!
//! Finds duplicate pairs by comparing fingerprints.
//!
//! ## How It Works
//! 1. Take fingerprints in path order
//! 2. Compare every pair `(i, j)` with `i < j` using Hamming distance
//! 3. Keep pairs the comparison strategy accepts
//!
//! The `i < j` walk visits each unordered pair exactly once, so no
//! de-duplication pass is needed and output order is fixed for a given
//! cache.
//!
//! ## Distance Classes (64-bit fingerprints)
//! | Distance | Classification |
//! |----------|---------------|
//! | 0        | Exact match   |
//! | 1-4      | Near-exact    |
//! | 5-10     | Similar       |
//! | 11+      | Loose         |

mod traits;

pub use traits::{ComparisonStrategy, ThresholdStrategy};

use crate::core::cache::HashCache;
use crate::core::hasher::Fingerprint;
use crate::events::{CompareEvent, CompareProgress, Event, EventSender};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Two images judged to be duplicates.
///
/// `original` sorts before `duplicate`; by convention the original is kept
/// and the duplicate is the one acted upon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// The image to keep
    pub original: PathBuf,
    /// The image to move, copy or delete
    pub duplicate: PathBuf,
    /// Hamming distance between the fingerprints
    pub distance: u32,
}

impl DuplicatePair {
    /// Classification of this pair's distance
    pub fn match_type(&self) -> MatchType {
        MatchType::from_distance(self.distance)
    }
}

/// Classification of match types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// Distance = 0, identical perceptual content
    Exact,
    /// Distance 1-4, virtually identical
    NearExact,
    /// Distance 5-10, likely duplicates
    Similar,
    /// Distance 11+, only reported under a permissive threshold
    Loose,
}

impl MatchType {
    /// Classify based on Hamming distance
    pub fn from_distance(distance: u32) -> Self {
        match distance {
            0 => MatchType::Exact,
            1..=4 => MatchType::NearExact,
            5..=10 => MatchType::Similar,
            _ => MatchType::Loose,
        }
    }
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::Exact => write!(f, "Exact Match"),
            MatchType::NearExact => write!(f, "Near-Exact Match"),
            MatchType::Similar => write!(f, "Similar"),
            MatchType::Loose => write!(f, "Loosely Similar"),
        }
    }
}

/// Number of `i < j` comparisons for `n` fingerprints
pub fn comparison_count(n: usize) -> usize {
    n.saturating_sub(1) * n / 2
}

fn log_start(fingerprints: usize, strategy: &dyn ComparisonStrategy) {
    tracing::debug!(
        fingerprints,
        comparisons = comparison_count(fingerprints),
        threshold = strategy.threshold(),
        strategy = %strategy.description(),
        "Comparing fingerprints"
    );
}

/// Compare fingerprint `i` against every later one
fn compare_row(
    entries: &[(&PathBuf, &Fingerprint)],
    i: usize,
    strategy: &dyn ComparisonStrategy,
) -> Vec<DuplicatePair> {
    let (path_a, hash_a) = entries[i];

    entries[i + 1..]
        .iter()
        .filter_map(|(path_b, hash_b)| {
            let distance = hash_a.distance(hash_b);
            strategy.is_duplicate(distance).then(|| DuplicatePair {
                original: path_a.clone(),
                duplicate: (*path_b).clone(),
                distance,
            })
        })
        .collect()
}

/// Find all duplicate pairs, in `(i, j)` order over the path-sorted cache
pub fn find_duplicate_pairs(
    fingerprints: &HashCache,
    strategy: &dyn ComparisonStrategy,
) -> Vec<DuplicatePair> {
    let entries: Vec<_> = fingerprints.iter().collect();

    (0..entries.len())
        .flat_map(|i| compare_row(&entries, i, strategy))
        .collect()
}

/// Parallel version of [`find_duplicate_pairs`] with identical output.
///
/// Rows are compared on the rayon pool and concatenated in row order.
pub fn find_duplicate_pairs_parallel(
    fingerprints: &HashCache,
    strategy: &dyn ComparisonStrategy,
) -> Vec<DuplicatePair> {
    let entries: Vec<_> = fingerprints.iter().collect();
    log_start(entries.len(), strategy);

    let rows: Vec<Vec<DuplicatePair>> = (0..entries.len())
        .into_par_iter()
        .map(|i| compare_row(&entries, i, strategy))
        .collect();

    rows.into_iter().flatten().collect()
}

/// Find all duplicate pairs with progress events
///
/// Emits a progress event roughly every 2% of comparisons (at most every
/// 1000) so the UI can update.
pub fn find_duplicate_pairs_with_events(
    fingerprints: &HashCache,
    strategy: &dyn ComparisonStrategy,
    events: &EventSender,
) -> Vec<DuplicatePair> {
    let entries: Vec<_> = fingerprints.iter().collect();
    let n = entries.len();
    let total_comparisons = comparison_count(n);
    log_start(n, strategy);

    events.send(Event::Compare(CompareEvent::Started {
        total_fingerprints: n,
    }));

    let update_interval = (total_comparisons / 50).clamp(1, 1000);
    let mut pairs = Vec::new();
    let mut comparisons_completed = 0;
    let mut last_progress_update = 0;

    for i in 0..n {
        pairs.extend(compare_row(&entries, i, strategy));
        comparisons_completed += n - i - 1;

        if comparisons_completed - last_progress_update >= update_interval {
            events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                comparisons_completed,
                total_comparisons,
                pairs_found: pairs.len(),
            })));
            last_progress_update = comparisons_completed;
        }
    }

    events.send(Event::Compare(CompareEvent::Completed {
        total_pairs: pairs.len(),
    }));

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;

    fn cache(entries: &[(&str, u8)]) -> HashCache {
        entries
            .iter()
            .map(|(path, byte)| (PathBuf::from(path), Fingerprint::new(vec![*byte])))
            .collect()
    }

    #[test]
    fn match_type_from_distance() {
        assert_eq!(MatchType::from_distance(0), MatchType::Exact);
        assert_eq!(MatchType::from_distance(3), MatchType::NearExact);
        assert_eq!(MatchType::from_distance(7), MatchType::Similar);
        assert_eq!(MatchType::from_distance(15), MatchType::Loose);
    }

    #[test]
    fn empty_and_single_inputs_have_no_pairs() {
        let strategy = ThresholdStrategy::new(10);
        assert!(find_duplicate_pairs(&HashCache::new(), &strategy).is_empty());
        assert!(find_duplicate_pairs(&cache(&[("/only.png", 0xFF)]), &strategy).is_empty());
    }

    #[test]
    fn finds_matches_within_threshold() {
        let strategy = ThresholdStrategy::new(5);
        let fingerprints = cache(&[("/a.jpg", 0xFF), ("/b.jpg", 0xFF), ("/c.jpg", 0x00)]);

        let pairs = find_duplicate_pairs(&fingerprints, &strategy);

        // a-c and b-c are 8 bits apart
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].original, PathBuf::from("/a.jpg"));
        assert_eq!(pairs[0].duplicate, PathBuf::from("/b.jpg"));
        assert_eq!(pairs[0].match_type(), MatchType::Exact);
    }

    #[test]
    fn pairs_follow_sorted_path_order() {
        let strategy = ThresholdStrategy::new(0);
        // Inserted out of order; all identical
        let fingerprints = cache(&[("/c.png", 1), ("/a.png", 1), ("/b.png", 1)]);

        let pairs: Vec<_> = find_duplicate_pairs(&fingerprints, &strategy)
            .into_iter()
            .map(|p| (p.original, p.duplicate))
            .collect();

        assert_eq!(
            pairs,
            vec![
                (PathBuf::from("/a.png"), PathBuf::from("/b.png")),
                (PathBuf::from("/a.png"), PathBuf::from("/c.png")),
                (PathBuf::from("/b.png"), PathBuf::from("/c.png")),
            ]
        );
    }

    #[test]
    fn parallel_matches_sequential() {
        let strategy = ThresholdStrategy::new(3);
        let fingerprints: HashCache = (0..40u8)
            .map(|i| (PathBuf::from(format!("/{:02}.png", i)), Fingerprint::new(vec![i, i / 3])))
            .collect();

        assert_eq!(
            find_duplicate_pairs_parallel(&fingerprints, &strategy),
            find_duplicate_pairs(&fingerprints, &strategy)
        );
    }

    #[test]
    fn with_events_emits_started_and_completed() {
        let (sender, receiver) = EventChannel::new();
        let strategy = ThresholdStrategy::new(10);
        let fingerprints: HashCache = (0..50u8)
            .map(|i| (PathBuf::from(format!("/{}.jpg", i)), Fingerprint::new(vec![i])))
            .collect();

        let pairs = find_duplicate_pairs_with_events(&fingerprints, &strategy, &sender);
        assert_eq!(pairs, find_duplicate_pairs(&fingerprints, &strategy));
        drop(sender);

        let events: Vec<_> = receiver.iter().collect();
        assert!(events.len() >= 3);

        match &events[0] {
            Event::Compare(CompareEvent::Started { total_fingerprints }) => {
                assert_eq!(*total_fingerprints, 50)
            }
            _ => panic!("Expected Started event"),
        }
        match events.last().unwrap() {
            Event::Compare(CompareEvent::Completed { total_pairs }) => {
                assert_eq!(*total_pairs, pairs.len())
            }
            _ => panic!("Expected Completed event"),
        }
    }

    #[test]
    fn comparison_count_is_n_choose_2() {
        assert_eq!(comparison_count(0), 0);
        assert_eq!(comparison_count(1), 0);
        assert_eq!(comparison_count(4), 6);
    }
}
