//! Executor for move, copy and delete batches.

use super::{ActionFailure, ActionKind, DispositionResult};
use crate::core::comparator::DuplicatePair;
use crate::core::pipeline::CancellationToken;
use crate::error::ActionError;
use crate::events::{ActionEvent, Event, EventSender};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Applies dispositions to duplicate files, one file at a time
#[derive(Debug, Clone, Default)]
pub struct ActionExecutor {
    events: EventSender,
    cancel: CancellationToken,
}

impl ActionExecutor {
    /// Executor without progress events or cancellation
    pub fn new() -> Self {
        Self::default()
    }

    /// Report per-file progress to `events`
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Stop before the next file once `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Move or copy the second file of each pair from `source_root` into
    /// `target_root`, keeping its path relative to `source_root`.
    ///
    /// `ActionKind::None` touches nothing and returns an empty result.
    pub fn disposition(
        &self,
        pairs: &[DuplicatePair],
        kind: ActionKind,
        source_root: &Path,
        target_root: &Path,
    ) -> DispositionResult {
        if kind == ActionKind::None {
            tracing::debug!("Action type is none, leaving duplicates in place");
            return DispositionResult::default();
        }

        let mut created_dirs: HashSet<PathBuf> = HashSet::new();
        let files = pairs.iter().map(|pair| pair.duplicate.as_path());

        self.run_batch(kind.name(), pairs.len(), files, |path| {
            let destination = unique_destination(destination_for(path, source_root, target_root));
            ensure_parent_dir(&destination, &mut created_dirs)?;

            match kind {
                ActionKind::Move => move_file(path, &destination)?,
                ActionKind::Copy => copy_file(path, &destination)?,
                ActionKind::None => {}
            }
            Ok(Some(destination))
        })
    }

    /// Permanently delete `paths`.
    ///
    /// This cannot be undone. Callers must have an explicit confirmation
    /// from the user before calling it.
    pub fn delete(&self, paths: &[PathBuf]) -> DispositionResult {
        let files = paths.iter().map(PathBuf::as_path);

        self.run_batch("delete", paths.len(), files, |path| {
            fs::remove_file(path).map_err(|source| ActionError::Io {
                operation: "delete",
                path: path.to_path_buf(),
                source,
            })?;
            Ok(None)
        })
    }

    fn run_batch<'a, I, F>(
        &self,
        operation: &str,
        total: usize,
        files: I,
        mut handle: F,
    ) -> DispositionResult
    where
        I: Iterator<Item = &'a Path>,
        F: FnMut(&Path) -> Result<Option<PathBuf>, ActionError>,
    {
        let mut result = DispositionResult::default();

        self.events.send(Event::Action(ActionEvent::Started {
            operation: operation.to_string(),
            total,
        }));

        for path in files {
            if self.cancel.is_cancelled() {
                tracing::info!(operation, "Cancelled, remaining files left untouched");
                result.cancelled = true;
                break;
            }
            result.attempted += 1;

            let outcome = if path.exists() {
                handle(path)
            } else {
                Err(ActionError::NotFound {
                    path: path.to_path_buf(),
                })
            };

            match outcome {
                Ok(destination) => {
                    result.succeeded += 1;
                    match &destination {
                        Some(to) => tracing::info!(
                            operation,
                            from = %path.display(),
                            to = %to.display(),
                            "Handled duplicate"
                        ),
                        None => tracing::info!(operation, path = %path.display(), "Handled duplicate"),
                    }
                    self.events.send(Event::Action(ActionEvent::Completed {
                        path: path.to_path_buf(),
                        destination,
                    }));
                }
                Err(ActionError::NotFound { .. }) => {
                    result.skipped += 1;
                    tracing::info!(
                        operation,
                        path = %path.display(),
                        "File no longer exists, skipping"
                    );
                    self.events.send(Event::Action(ActionEvent::Skipped {
                        path: path.to_path_buf(),
                    }));
                }
                Err(e) => {
                    result.failed += 1;
                    tracing::warn!(operation, path = %path.display(), error = %e, "Action failed");
                    self.events.send(Event::Action(ActionEvent::Failed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }));
                    result.failures.push(ActionFailure {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            operation,
            succeeded = result.succeeded,
            skipped = result.skipped,
            failed = result.failed,
            "Finished"
        );
        self.events.send(Event::Action(ActionEvent::Finished {
            succeeded: result.succeeded,
            skipped: result.skipped,
            failed: result.failed,
        }));

        result
    }
}

/// Where `path` lands under `target_root`.
///
/// Files outside `source_root` have no relative path and go directly under
/// `target_root` by file name.
fn destination_for(path: &Path, source_root: &Path, target_root: &Path) -> PathBuf {
    match path.strip_prefix(source_root) {
        Ok(relative) if !relative.as_os_str().is_empty() => target_root.join(relative),
        _ => {
            tracing::warn!(
                path = %path.display(),
                root = %source_root.display(),
                "File is outside the input directory, placing it at the top of the action directory"
            );
            target_root.join(path.file_name().unwrap_or(path.as_os_str()))
        }
    }
}

/// `destination`, or the first free `name (n).ext` beside it.
///
/// Two duplicates can map to the same place (same file name outside the
/// input directory, or an archive left by an earlier run); neither may
/// replace the other.
fn unique_destination(destination: PathBuf) -> PathBuf {
    if fs::symlink_metadata(&destination).is_err() {
        return destination;
    }

    let stem = destination.file_stem().unwrap_or_default().to_os_string();
    let extension = destination.extension().map(|ext| ext.to_os_string());

    let mut n = 1u32;
    loop {
        let mut name = stem.clone();
        name.push(format!(" ({})", n));
        if let Some(extension) = &extension {
            name.push(".");
            name.push(extension);
        }

        let candidate = destination.with_file_name(name);
        if fs::symlink_metadata(&candidate).is_err() {
            tracing::info!(
                taken = %destination.display(),
                destination = %candidate.display(),
                "Destination already exists, using a numbered name"
            );
            return candidate;
        }
        n += 1;
    }
}

/// Create the destination's parent once per batch
fn ensure_parent_dir(destination: &Path, created: &mut HashSet<PathBuf>) -> Result<(), ActionError> {
    let Some(parent) = destination.parent() else {
        return Ok(());
    };
    if created.contains(parent) {
        return Ok(());
    }

    fs::create_dir_all(parent).map_err(|source| ActionError::CreateDirectory {
        path: parent.to_path_buf(),
        source,
    })?;
    created.insert(parent.to_path_buf());
    Ok(())
}

fn move_file(from: &Path, to: &Path) -> Result<(), ActionError> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // rename fails across filesystems, fall back to copy+delete
    // with size verification before deleting the source
    let io = |source| ActionError::Io {
        operation: "move",
        path: from.to_path_buf(),
        source,
    };

    let expected = fs::metadata(from).map_err(io)?.len();
    fs::copy(from, to).map_err(io)?;
    preserve_modified_time(from, to);

    let actual = fs::metadata(to).map_err(io)?.len();
    if actual != expected {
        let _ = fs::remove_file(to);
        return Err(ActionError::VerificationFailed {
            path: from.to_path_buf(),
            expected,
            actual,
        });
    }

    fs::remove_file(from).map_err(io)
}

fn copy_file(from: &Path, to: &Path) -> Result<(), ActionError> {
    fs::copy(from, to).map_err(|source| ActionError::Io {
        operation: "copy",
        path: from.to_path_buf(),
        source,
    })?;
    preserve_modified_time(from, to);
    Ok(())
}

/// `fs::copy` keeps permissions but not timestamps
fn preserve_modified_time(from: &Path, to: &Path) {
    let result = fs::metadata(from).and_then(|meta| meta.modified()).and_then(|modified| {
        let file = fs::OpenOptions::new()
            .write(true)
            .open(to)
            .or_else(|_| fs::File::open(to))?;
        file.set_modified(modified)
    });

    if let Err(e) = result {
        tracing::warn!(path = %to.display(), error = %e, "Could not preserve modification time");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn pair(original: &Path, duplicate: &Path) -> DuplicatePair {
        DuplicatePair {
            original: original.to_path_buf(),
            duplicate: duplicate.to_path_buf(),
            distance: 0,
        }
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn move_keeps_relative_structure() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("photos");
        let archive = temp.path().join("archive");
        let original = root.join("a.png");
        let duplicate = root.join("trip").join("b.png");
        write(&original, "a");
        write(&duplicate, "b");

        let result = ActionExecutor::new().disposition(
            &[pair(&original, &duplicate)],
            ActionKind::Move,
            &root,
            &archive,
        );

        assert_eq!(result.count(), 1);
        assert!(original.exists());
        assert!(!duplicate.exists());
        assert_eq!(fs::read_to_string(archive.join("trip").join("b.png")).unwrap(), "b");
    }

    #[test]
    fn copy_leaves_source_and_keeps_mtime() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("photos");
        let archive = temp.path().join("archive");
        let original = root.join("a.png");
        let duplicate = root.join("b.png");
        write(&original, "a");
        write(&duplicate, "b");

        let old = SystemTime::UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        fs::OpenOptions::new()
            .write(true)
            .open(&duplicate)
            .unwrap()
            .set_modified(old)
            .unwrap();

        let result = ActionExecutor::new().disposition(
            &[pair(&original, &duplicate)],
            ActionKind::Copy,
            &root,
            &archive,
        );

        assert_eq!(result.succeeded, 1);
        assert!(duplicate.exists());
        let copied = archive.join("b.png");
        assert_eq!(fs::read_to_string(&copied).unwrap(), "b");
        assert_eq!(fs::metadata(&copied).unwrap().modified().unwrap(), old);
    }

    #[test]
    fn none_kind_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let duplicate = temp.path().join("b.png");
        write(&duplicate, "b");

        let result = ActionExecutor::new().disposition(
            &[pair(&temp.path().join("a.png"), &duplicate)],
            ActionKind::None,
            temp.path(),
            &temp.path().join("archive"),
        );

        assert_eq!(result, DispositionResult::default());
        assert!(duplicate.exists());
        assert!(!temp.path().join("archive").exists());
    }

    #[test]
    fn missing_file_is_skipped_and_batch_continues() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("photos");
        let archive = temp.path().join("archive");
        let present = root.join("c.png");
        write(&present, "c");

        let pairs = vec![
            pair(&root.join("a.png"), &root.join("gone.png")),
            pair(&root.join("a.png"), &present),
        ];
        let result = ActionExecutor::new().disposition(&pairs, ActionKind::Move, &root, &archive);

        assert_eq!(result.attempted, 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 0);
        assert!(archive.join("c.png").exists());
    }

    #[test]
    fn file_outside_root_goes_to_top_of_target() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("photos");
        let archive = temp.path().join("archive");
        let stray = temp.path().join("elsewhere").join("d.png");
        write(&stray, "d");

        let result = ActionExecutor::new().disposition(
            &[pair(&root.join("a.png"), &stray)],
            ActionKind::Copy,
            &root,
            &archive,
        );

        assert_eq!(result.succeeded, 1);
        assert!(archive.join("d.png").exists());
    }

    #[test]
    fn same_name_from_outside_root_does_not_overwrite() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("photos");
        let archive = temp.path().join("archive");
        let first = temp.path().join("x").join("dup.png");
        let second = temp.path().join("y").join("dup.png");
        write(&first, "AAA");
        write(&second, "BBB");

        let pairs = vec![
            pair(&root.join("a.png"), &first),
            pair(&root.join("a.png"), &second),
        ];
        let result = ActionExecutor::new().disposition(&pairs, ActionKind::Move, &root, &archive);

        assert_eq!(result.succeeded, 2);
        assert!(!first.exists());
        assert!(!second.exists());
        assert_eq!(fs::read_to_string(archive.join("dup.png")).unwrap(), "AAA");
        assert_eq!(fs::read_to_string(archive.join("dup (1).png")).unwrap(), "BBB");
    }

    #[test]
    fn copy_into_populated_archive_keeps_existing_file() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("photos");
        let archive = temp.path().join("archive");
        let duplicate = root.join("b.png");
        write(&duplicate, "new");
        write(&archive.join("b.png"), "from an earlier run");
        write(&archive.join("b (1).png"), "also earlier");

        let result = ActionExecutor::new().disposition(
            &[pair(&root.join("a.png"), &duplicate)],
            ActionKind::Copy,
            &root,
            &archive,
        );

        assert_eq!(result.succeeded, 1);
        assert_eq!(fs::read_to_string(archive.join("b.png")).unwrap(), "from an earlier run");
        assert_eq!(fs::read_to_string(archive.join("b (1).png")).unwrap(), "also earlier");
        assert_eq!(fs::read_to_string(archive.join("b (2).png")).unwrap(), "new");
    }

    #[test]
    fn delete_missing_file_counts_zero() {
        let temp = TempDir::new().unwrap();
        let result = ActionExecutor::new().delete(&[temp.path().join("never-existed.png")]);

        assert_eq!(result.count(), 0);
        assert_eq!(result.skipped, 1);
        assert!(result.failures.is_empty());
    }

    #[test]
    fn delete_isolates_failures() {
        let temp = TempDir::new().unwrap();
        let directory = temp.path().join("not-a-file");
        fs::create_dir(&directory).unwrap();
        let file = temp.path().join("b.png");
        write(&file, "b");

        let result = ActionExecutor::new().delete(&[directory.clone(), file.clone()]);

        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].path, directory);
        assert_eq!(result.succeeded, 1);
        assert!(!file.exists());
    }

    #[test]
    fn cancelled_batch_does_nothing() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("b.png");
        write(&file, "b");

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = ActionExecutor::new()
            .with_cancellation(cancel)
            .delete(&[file.clone()]);

        assert!(result.cancelled);
        assert_eq!(result.attempted, 0);
        assert!(file.exists());
    }

    #[test]
    fn batch_reports_events() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("b.png");
        write(&file, "b");
        let (sender, receiver) = EventChannel::new();

        ActionExecutor::new()
            .with_events(sender)
            .delete(&[file, temp.path().join("gone.png")]);

        let events = receiver.drain();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            Event::Action(ActionEvent::Started { total: 2, .. })
        ));
        assert!(matches!(
            events[3],
            Event::Action(ActionEvent::Finished {
                succeeded: 1,
                skipped: 1,
                failed: 0
            })
        ));
    }
}
