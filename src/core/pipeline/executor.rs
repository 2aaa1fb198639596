//! Pipeline execution implementation.

use super::{CancellationToken, EngineConfig};
use crate::core::actions::{ActionExecutor, DispositionResult};
use crate::core::cache::{CacheStore, HashCache, TextFileStore};
use crate::core::comparator::{
    find_duplicate_pairs_parallel, find_duplicate_pairs_with_events, DuplicatePair,
    ThresholdStrategy,
};
use crate::core::hasher::{Fingerprint, HashAlgorithm, HasherConfig};
use crate::core::reporter::ReportWriter;
use crate::error::{DedupError, Result};
use crate::events::{
    CacheEvent, Event, EventSender, HashEvent, HashProgress, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Result of one run
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Duplicate pairs in path order
    pub pairs: Vec<DuplicatePair>,
    /// Distinct candidate paths supplied
    pub total_candidates: usize,
    /// Fingerprints in the cache after pruning
    pub fingerprints: usize,
    /// Files hashed during this run
    pub hashed: usize,
    /// Candidates whose fingerprint came from the cache
    pub cache_hits: usize,
    /// Files that could not be hashed (retried next run)
    pub hash_failures: usize,
    /// Cache entries dropped because their file is gone
    pub pruned: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Fingerprints computed in the hashing phase
struct HashOutcome {
    records: Vec<(PathBuf, Fingerprint)>,
    failed: usize,
}

/// The duplicate detection engine
///
/// Holds one immutable configuration, the cache store and the hasher it
/// selects. Each call to [`run`](Self::run) is independent.
pub struct DedupEngine {
    config: EngineConfig,
    store: Box<dyn CacheStore>,
    hasher: Box<dyn HashAlgorithm>,
}

impl DedupEngine {
    /// Engine persisting fingerprints to `config.cache_path`
    pub fn new(config: EngineConfig) -> Self {
        let store = Box::new(TextFileStore::new(&config.cache_path));
        Self::with_store(config, store)
    }

    /// Engine with a custom cache store
    pub fn with_store(config: EngineConfig, store: Box<dyn CacheStore>) -> Self {
        let hasher = HasherConfig::new()
            .algorithm(config.algorithm)
            .hash_size(config.hash_size)
            .build();

        Self {
            config,
            store,
            hasher,
        }
    }

    /// The configuration this engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run without events or cancellation
    pub fn run(&self, candidates: &[PathBuf]) -> Result<RunResult> {
        self.run_with_events(candidates, &EventSender::disabled(), &CancellationToken::new())
    }

    /// Run with event reporting and cooperative cancellation.
    ///
    /// Per-file hashing failures are logged and skipped. Failing to save the
    /// cache or write the report ends the run with an error. If `cancel`
    /// fires while hashing, the files hashed so far are saved (with stale
    /// entries pruned) and `DedupError::Cancelled` is returned.
    pub fn run_with_events(
        &self,
        candidates: &[PathBuf],
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> Result<RunResult> {
        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning (the candidate list is supplied by the caller)
        enter_phase(events, PipelinePhase::Scanning);
        let mut candidates = candidates.to_vec();
        candidates.sort();
        candidates.dedup();
        let live_paths: HashSet<PathBuf> = candidates.iter().cloned().collect();
        tracing::info!(candidates = candidates.len(), "Found image files");

        let mut cache = self.store.load(self.config.rebuild);
        events.send(Event::Cache(CacheEvent::Loaded {
            entries: cache.len(),
        }));

        // Phase 2: Hashing
        enter_phase(events, PipelinePhase::Hashing);
        let to_hash: Vec<&PathBuf> = candidates.iter().filter(|path| !cache.contains(path)).collect();
        let cache_hits = candidates.len() - to_hash.len();
        tracing::info!(
            to_hash = to_hash.len(),
            cache_hits,
            algorithm = %self.config.algorithm,
            "Hashing new images"
        );
        events.send(Event::Hash(HashEvent::Started {
            total_candidates: candidates.len(),
            to_hash: to_hash.len(),
        }));

        let outcome = self.hash_files(&to_hash, events, cancel);
        let hashed = outcome.records.len();
        events.send(Event::Hash(HashEvent::Completed {
            hashed,
            cache_hits,
            failed: outcome.failed,
        }));
        cache.update(outcome.records);

        // Phase 3: Pruning
        enter_phase(events, PipelinePhase::Pruning);
        let pruned = cache.prune(&live_paths).len();
        if pruned > 0 {
            tracing::info!(pruned, "Removed hashes for files no longer present");
        }
        events.send(Event::Cache(CacheEvent::Pruned { removed: pruned }));

        // Phase 4: Persisting the cache
        enter_phase(events, PipelinePhase::PersistingCache);
        if let Err(e) = self.store.save(&cache) {
            return Err(fail(events, e.into()));
        }
        events.send(Event::Cache(CacheEvent::Saved {
            entries: cache.len(),
        }));

        if cancel.is_cancelled() {
            tracing::info!(hashed, "Run cancelled after saving partial hashes");
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
            return Err(DedupError::Cancelled);
        }

        // Phase 5: Matching
        enter_phase(events, PipelinePhase::Matching);
        let pairs = self.find_pairs(&cache, events);
        tracing::info!(
            fingerprints = cache.len(),
            pairs = pairs.len(),
            threshold = self.config.threshold,
            "Comparison complete"
        );

        // Phase 6: Reporting
        enter_phase(events, PipelinePhase::Reporting);
        let reporter = ReportWriter::new(self.config.threshold, self.config.algorithm);
        if let Err(e) = reporter.write_report(&pairs, &self.config.report_path) {
            return Err(fail(events, e.into()));
        }

        let duration_ms = start_time.elapsed().as_millis() as u64;
        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_candidates: candidates.len(),
                fingerprints: cache.len(),
                duplicate_pairs: pairs.len(),
                duration_ms,
            },
        }));

        Ok(RunResult {
            pairs,
            total_candidates: candidates.len(),
            fingerprints: cache.len(),
            hashed,
            cache_hits,
            hash_failures: outcome.failed,
            pruned,
            duration_ms,
        })
    }

    /// Hash files in parallel; results are collected and merged by the caller
    fn hash_files(
        &self,
        paths: &[&PathBuf],
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> HashOutcome {
        let total = paths.len();
        let completed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let records: Vec<(PathBuf, Fingerprint)> = paths
            .par_iter()
            .filter_map(|path| {
                if cancel.is_cancelled() {
                    return None;
                }

                let result = match self.hasher.hash_file(path) {
                    Ok(fingerprint) => Some(((*path).clone(), fingerprint)),
                    Err(e) => {
                        failed.fetch_add(1, Ordering::SeqCst);
                        tracing::warn!(path = %path.display(), error = %e, "Error hashing image, skipping");
                        events.send(Event::Hash(HashEvent::Error {
                            path: (*path).clone(),
                            message: e.to_string(),
                        }));
                        None
                    }
                };

                let current = completed.fetch_add(1, Ordering::SeqCst) + 1;
                events.send(Event::Hash(HashEvent::Progress(HashProgress {
                    completed: current,
                    total,
                    current_path: (*path).clone(),
                })));

                result
            })
            .collect();

        HashOutcome {
            records,
            failed: failed.load(Ordering::SeqCst),
        }
    }

    fn find_pairs(&self, cache: &HashCache, events: &EventSender) -> Vec<DuplicatePair> {
        let strategy = ThresholdStrategy::new(self.config.threshold);
        if events.is_enabled() {
            find_duplicate_pairs_with_events(cache, &strategy, events)
        } else {
            find_duplicate_pairs_parallel(cache, &strategy)
        }
    }

    /// Move or copy the duplicate of each pair as configured.
    ///
    /// Does nothing unless actions are enabled and the kind is move or copy.
    pub fn dispose(&self, pairs: &[DuplicatePair]) -> DispositionResult {
        self.dispose_with_events(pairs, &EventSender::disabled(), &CancellationToken::new())
    }

    /// [`dispose`](Self::dispose) with events and cancellation
    pub fn dispose_with_events(
        &self,
        pairs: &[DuplicatePair],
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> DispositionResult {
        if !self.config.enable_actions {
            tracing::info!("Duplicate actions are disabled");
            return DispositionResult::default();
        }

        enter_phase(events, PipelinePhase::Disposing);
        ActionExecutor::new()
            .with_events(events.clone())
            .with_cancellation(cancel.clone())
            .disposition(
                pairs,
                self.config.action_kind,
                &self.config.input_dir,
                &self.config.action_dir,
            )
    }

    /// Permanently delete `paths`.
    ///
    /// Irreversible. The caller is responsible for an explicit, separate
    /// confirmation before calling this.
    pub fn delete(&self, paths: &[PathBuf]) -> DispositionResult {
        self.delete_with_events(paths, &EventSender::disabled(), &CancellationToken::new())
    }

    /// [`delete`](Self::delete) with events and cancellation
    pub fn delete_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
        cancel: &CancellationToken,
    ) -> DispositionResult {
        enter_phase(events, PipelinePhase::Disposing);
        ActionExecutor::new()
            .with_events(events.clone())
            .with_cancellation(cancel.clone())
            .delete(paths)
    }
}

fn enter_phase(events: &EventSender, phase: PipelinePhase) {
    tracing::debug!(%phase, "Entering phase");
    events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
}

fn fail(events: &EventSender, error: DedupError) -> DedupError {
    tracing::error!(error = %error, "Run failed");
    events.send(Event::Pipeline(PipelineEvent::Error {
        message: error.to_string(),
    }));
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actions::ActionKind;
    use crate::core::cache::InMemoryStore;
    use crate::events::EventChannel;
    use image::{ImageBuffer, Rgb};
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Store handle that lets a test inspect what the engine saved
    struct SharedStore(Arc<InMemoryStore>);

    impl CacheStore for SharedStore {
        fn load(&self, rebuild: bool) -> HashCache {
            self.0.load(rebuild)
        }

        fn save(&self, cache: &HashCache) -> std::result::Result<(), crate::error::CacheError> {
            self.0.save(cache)
        }
    }

    fn save_gradient(path: &Path, offset: u8) {
        ImageBuffer::from_fn(64, 64, |x, _| Rgb([(x * 4) as u8 / 2 + offset, 40, 90]))
            .save(path)
            .unwrap();
    }

    fn config(dir: &TempDir) -> EngineConfig {
        EngineConfig::builder()
            .input_dir(dir.path())
            .report_path(dir.path().join("report.txt"))
            .cache_path(dir.path().join("hashes.txt"))
            .action_dir(dir.path().join("archive"))
            .build()
    }

    fn engine_with_memory(dir: &TempDir) -> (DedupEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        let engine = DedupEngine::with_store(config(dir), Box::new(SharedStore(store.clone())));
        (engine, store)
    }

    #[test]
    fn empty_candidate_list_writes_empty_report() {
        let dir = TempDir::new().unwrap();
        let (engine, store) = engine_with_memory(&dir);

        let result = engine.run(&[]).unwrap();

        assert!(result.pairs.is_empty());
        assert_eq!(store.snapshot(), Some(HashCache::new()));
        let report = std::fs::read_to_string(dir.path().join("report.txt")).unwrap();
        assert_eq!(report, "No duplicate or near-duplicate images found.\n");
    }

    #[test]
    fn second_run_uses_cache() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        save_gradient(&a, 0);
        save_gradient(&b, 0);
        let (engine, _store) = engine_with_memory(&dir);

        let first = engine.run(&[a.clone(), b.clone()]).unwrap();
        let second = engine.run(&[b, a]).unwrap();

        assert_eq!(first.hashed, 2);
        assert_eq!(second.hashed, 0);
        assert_eq!(second.cache_hits, 2);
        assert_eq!(first.pairs, second.pairs);
        assert_eq!(first.pairs.len(), 1);
    }

    #[test]
    fn duplicate_candidates_are_counted_once() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        save_gradient(&a, 0);
        let (engine, _store) = engine_with_memory(&dir);

        let result = engine.run(&[a.clone(), a]).unwrap();

        assert_eq!(result.total_candidates, 1);
        assert!(result.pairs.is_empty());
    }

    #[test]
    fn corrupt_file_is_skipped_and_absent_from_cache() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.png");
        let bad = dir.path().join("bad.jpg");
        save_gradient(&good, 0);
        std::fs::write(&bad, b"not an image").unwrap();
        let (engine, store) = engine_with_memory(&dir);

        let result = engine.run(&[good.clone(), bad.clone()]).unwrap();

        assert_eq!(result.hash_failures, 1);
        let saved = store.snapshot().unwrap();
        assert!(saved.contains(&good));
        assert!(!saved.contains(&bad));
    }

    #[test]
    fn cancelled_run_saves_and_returns_cancelled() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        save_gradient(&a, 0);
        let stale = PathBuf::from("/gone/old.png");
        let store = Arc::new(InMemoryStore::with_cache(
            [(stale.clone(), Fingerprint::new(vec![0; 8]))].into_iter().collect(),
        ));
        let engine = DedupEngine::with_store(config(&dir), Box::new(SharedStore(store.clone())));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = engine.run_with_events(&[a.clone()], &EventSender::disabled(), &cancel);

        assert!(matches!(result, Err(DedupError::Cancelled)));
        let saved = store.snapshot().unwrap();
        assert!(!saved.contains(&stale));
        assert!(!saved.contains(&a));
        assert!(!dir.path().join("report.txt").exists());
    }

    #[test]
    fn cancel_during_hashing_saves_only_finished_files() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.jpg");
        let c = dir.path().join("c.png");
        save_gradient(&a, 0);
        std::fs::write(&b, b"not an image").unwrap();
        save_gradient(&c, 10);
        let cached = dir.path().join("cached.png");
        let stale = PathBuf::from("/gone/old.png");
        let store = Arc::new(InMemoryStore::with_cache(
            [
                (cached.clone(), Fingerprint::new(vec![0xab; 8])),
                (stale.clone(), Fingerprint::new(vec![0; 8])),
            ]
            .into_iter()
            .collect(),
        ));
        let engine = DedupEngine::with_store(config(&dir), Box::new(SharedStore(store.clone())));

        // One worker hashes a, b, c in order. The rendezvous channel holds the
        // worker at its next send until the listener has cancelled, so the
        // failure on b stops the batch before c.
        let pool = rayon::ThreadPoolBuilder::new().num_threads(1).build().unwrap();
        let cancel = CancellationToken::new();
        let (sender, receiver) = EventChannel::bounded(0);
        let candidates = vec![a.clone(), b.clone(), c.clone(), cached.clone()];

        let result = std::thread::scope(|scope| {
            let listener = cancel.clone();
            scope.spawn(move || {
                for event in receiver.iter() {
                    if matches!(event, Event::Hash(HashEvent::Error { .. })) {
                        listener.cancel();
                    }
                }
            });

            let result = pool.install(|| engine.run_with_events(&candidates, &sender, &cancel));
            drop(sender);
            result
        });

        assert!(matches!(result, Err(DedupError::Cancelled)));
        let saved = store.snapshot().unwrap();
        assert!(saved.contains(&a));
        assert!(saved.contains(&cached));
        assert!(!saved.contains(&b));
        assert!(!saved.contains(&c));
        assert!(!saved.contains(&stale));
        assert_eq!(saved.len(), 2);
        assert!(!dir.path().join("report.txt").exists());
    }

    #[test]
    fn run_emits_phases_in_order() {
        let dir = TempDir::new().unwrap();
        let (engine, _store) = engine_with_memory(&dir);
        let (sender, receiver) = EventChannel::new();

        engine
            .run_with_events(&[], &sender, &CancellationToken::new())
            .unwrap();

        let phases: Vec<_> = receiver
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(
            phases,
            vec![
                PipelinePhase::Scanning,
                PipelinePhase::Hashing,
                PipelinePhase::Pruning,
                PipelinePhase::PersistingCache,
                PipelinePhase::Matching,
                PipelinePhase::Reporting,
            ]
        );
    }

    #[test]
    fn dispose_respects_enable_flag() {
        let dir = TempDir::new().unwrap();
        let b = dir.path().join("b.png");
        std::fs::write(&b, "b").unwrap();
        let pairs = vec![DuplicatePair {
            original: dir.path().join("a.png"),
            duplicate: b.clone(),
            distance: 0,
        }];

        let disabled = DedupEngine::new(EngineConfig {
            action_kind: ActionKind::Move,
            enable_actions: false,
            ..config(&dir)
        });
        assert_eq!(disabled.dispose(&pairs).count(), 0);
        assert!(b.exists());

        let enabled = DedupEngine::new(EngineConfig {
            action_kind: ActionKind::Move,
            enable_actions: true,
            ..config(&dir)
        });
        assert_eq!(enabled.dispose(&pairs).count(), 1);
        assert!(dir.path().join("archive").join("b.png").exists());
    }
}
