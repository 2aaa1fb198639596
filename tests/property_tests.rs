use image_dedup::core::cache::{CacheStore, HashCache, TextFileStore};
use image_dedup::core::comparator::{
    find_duplicate_pairs, find_duplicate_pairs_parallel, ThresholdStrategy,
};
use image_dedup::core::hasher::Fingerprint;
use proptest::prelude::*;
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

fn cache_from(fingerprints: &[u64]) -> HashCache {
    fingerprints
        .iter()
        .enumerate()
        .map(|(i, value)| {
            (
                PathBuf::from(format!("/img/{:03}.png", i)),
                Fingerprint::new(value.to_be_bytes().to_vec()),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn pair_reported_iff_within_threshold(
        values in prop::collection::vec(any::<u64>(), 0..24),
        threshold in 0u32..=64,
    ) {
        let cache = cache_from(&values);
        let pairs = find_duplicate_pairs(&cache, &ThresholdStrategy::new(threshold));
        let reported: HashSet<(PathBuf, PathBuf)> = pairs
            .iter()
            .map(|p| (p.original.clone(), p.duplicate.clone()))
            .collect();

        // Each unordered pair at most once
        prop_assert_eq!(reported.len(), pairs.len());

        let entries: Vec<_> = cache.iter().collect();
        for i in 0..entries.len() {
            for j in (i + 1)..entries.len() {
                let distance = entries[i].1.distance(entries[j].1);
                let key = (entries[i].0.clone(), entries[j].0.clone());
                prop_assert_eq!(reported.contains(&key), distance <= threshold);
            }
        }
    }

    #[test]
    fn distance_is_popcount_of_xor(a in any::<u64>(), b in any::<u64>()) {
        let fa = Fingerprint::new(a.to_be_bytes().to_vec());
        let fb = Fingerprint::new(b.to_be_bytes().to_vec());

        prop_assert_eq!(fa.distance(&fb), (a ^ b).count_ones());
        prop_assert_eq!(fa.distance(&fb), fb.distance(&fa));
        prop_assert_eq!(fa.distance(&fa), 0);
    }

    #[test]
    fn parallel_matcher_agrees_with_sequential(
        values in prop::collection::vec(any::<u64>(), 0..32),
        threshold in 0u32..=40,
    ) {
        let cache = cache_from(&values);
        let strategy = ThresholdStrategy::new(threshold);

        prop_assert_eq!(
            find_duplicate_pairs_parallel(&cache, &strategy),
            find_duplicate_pairs(&cache, &strategy)
        );
    }

    #[test]
    fn hex_round_trip(bytes in prop::collection::vec(any::<u8>(), 1..64)) {
        let fingerprint = Fingerprint::new(bytes);
        let decoded = Fingerprint::from_hex(&fingerprint.to_hex()).unwrap();

        prop_assert_eq!(decoded, fingerprint);
    }

    #[test]
    fn cache_file_round_trip(
        entries in prop::collection::btree_map("[a-z0-9_, ]{1,12}", any::<u64>(), 0..16),
    ) {
        let dir = TempDir::new().unwrap();
        let store = TextFileStore::new(dir.path().join("hashes.txt"));
        let cache: HashCache = entries
            .iter()
            .map(|(name, value)| {
                (
                    PathBuf::from(format!("/photos/{}.jpg", name)),
                    Fingerprint::new(value.to_be_bytes().to_vec()),
                )
            })
            .collect();

        store.save(&cache).unwrap();
        prop_assert_eq!(store.load(false), cache);
    }
}
