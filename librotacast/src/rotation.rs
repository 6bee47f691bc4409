//! Rotation queue
//!
//! The queue holds the not-yet-selected remainder of the current cycle as an
//! ordered permutation of the eligible identifiers. Selection pops the head;
//! when the remainder runs out, a fresh uniformly random permutation of the
//! currently eligible set is generated, which is the only place randomness
//! enters the system.
//!
//! Storage is behind the [`QueueStore`] trait so tests can substitute an
//! in-memory backend for the on-disk state file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::{QueueError, Result};
use crate::exclusions::ExclusionSet;

/// Durable storage for the queue's ordered identifier sequence.
pub trait QueueStore: Send + Sync {
    /// Read the persisted order. Missing state is an empty sequence, never an
    /// error.
    fn load(&self) -> std::result::Result<Vec<usize>, QueueError>;

    /// Replace the persisted order in full. Implementations must never leave
    /// a mixture of old and new state behind, even if interrupted mid-write.
    fn save(&self, remaining: &[usize]) -> std::result::Result<(), QueueError>;
}

/// File-backed store: one identifier per line, head first.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the state file, so readers only ever observe a complete sequence.
pub struct FileQueueStore {
    path: PathBuf,
}

impl FileQueueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl QueueStore for FileQueueStore {
    fn load(&self) -> std::result::Result<Vec<usize>, QueueError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(QueueError::ReadError)?;
        let mut order = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let index = trimmed.parse::<usize>().map_err(|_| QueueError::Parse {
                line_no: line_no + 1,
                text: trimmed.to_string(),
            })?;
            order.push(index);
        }
        Ok(order)
    }

    fn save(&self, remaining: &[usize]) -> std::result::Result<(), QueueError> {
        use std::io::Write;

        let dir = self.path.parent().filter(|p| !p.as_os_str().is_empty());
        let mut tmp = match dir {
            Some(dir) => tempfile::NamedTempFile::new_in(dir),
            None => tempfile::NamedTempFile::new_in("."),
        }
        .map_err(QueueError::WriteError)?;

        let mut content = String::new();
        for index in remaining {
            content.push_str(&index.to_string());
            content.push('\n');
        }
        tmp.write_all(content.as_bytes())
            .map_err(QueueError::WriteError)?;
        tmp.flush().map_err(QueueError::WriteError)?;

        tmp.persist(&self.path)
            .map_err(|e| QueueError::WriteError(e.error))?;
        Ok(())
    }
}

/// In-memory store for tests and inspection tooling.
#[derive(Default)]
pub struct MemoryQueueStore {
    state: Mutex<Vec<usize>>,
    saves: Mutex<usize>,
}

impl MemoryQueueStore {
    pub fn new(initial: Vec<usize>) -> Self {
        Self {
            state: Mutex::new(initial),
            saves: Mutex::new(0),
        }
    }

    /// Snapshot of the stored order.
    pub fn contents(&self) -> Vec<usize> {
        self.state.lock().unwrap().clone()
    }

    /// Number of times `save` has been called.
    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

impl QueueStore for MemoryQueueStore {
    fn load(&self) -> std::result::Result<Vec<usize>, QueueError> {
        Ok(self.state.lock().unwrap().clone())
    }

    fn save(&self, remaining: &[usize]) -> std::result::Result<(), QueueError> {
        *self.state.lock().unwrap() = remaining.to_vec();
        *self.saves.lock().unwrap() += 1;
        Ok(())
    }
}

/// Outcome of a selection: the chosen identifier and the remainder of the
/// cycle, in order. Nothing is persisted until [`RotationQueue::commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub selected: usize,
    pub remaining: Vec<usize>,
}

pub struct RotationQueue {
    store: Box<dyn QueueStore>,
}

impl RotationQueue {
    pub fn new(store: Box<dyn QueueStore>) -> Self {
        Self { store }
    }

    /// Queue backed by the state file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::new(Box::new(FileQueueStore::new(path)))
    }

    /// Select the next identifier.
    ///
    /// Filters the persisted order against the current exclusion set and the
    /// current catalog size, regenerates a fresh permutation when the filtered
    /// remainder is empty, and splits off the head. Performs no writes; the
    /// caller persists the remainder with [`commit`](Self::commit) once the
    /// selection is considered consumed.
    ///
    /// # Errors
    ///
    /// `QueueError::NoEligibleItems` when the exclusion set covers the whole
    /// catalog, storage errors otherwise.
    pub fn next(&self, catalog_size: usize, exclusions: &ExclusionSet) -> Result<Selection> {
        let persisted = self.store.load().map_err(crate::error::RotacastError::Queue)?;

        // Drop identifiers excluded after they were enqueued, identifiers the
        // catalog no longer covers, and duplicates from hand-edited state.
        let mut seen = HashSet::new();
        let mut order: Vec<usize> = persisted
            .into_iter()
            .filter(|i| *i < catalog_size && !exclusions.contains(*i) && seen.insert(*i))
            .collect();

        if order.is_empty() {
            order = regenerate(catalog_size, exclusions);
            if order.is_empty() {
                return Err(QueueError::NoEligibleItems.into());
            }
            info!(cycle_len = order.len(), "Regenerated rotation queue");
        }

        let selected = order[0];
        let remaining = order[1..].to_vec();
        debug!(selected, pending = remaining.len(), "Selected next item");

        Ok(Selection {
            selected,
            remaining,
        })
    }

    /// Persist the remainder, fully replacing prior state.
    pub fn commit(&self, remaining: &[usize]) -> Result<()> {
        self.store
            .save(remaining)
            .map_err(crate::error::RotacastError::Queue)?;
        Ok(())
    }

    /// The persisted pending order, filtered the same way `next` filters it.
    pub fn pending(&self, catalog_size: usize, exclusions: &ExclusionSet) -> Result<Vec<usize>> {
        let persisted = self.store.load().map_err(crate::error::RotacastError::Queue)?;
        let mut seen = HashSet::new();
        Ok(persisted
            .into_iter()
            .filter(|i| *i < catalog_size && !exclusions.contains(*i) && seen.insert(*i))
            .collect())
    }
}

/// Uniformly random permutation of `{0..catalog_size} \ exclusions`.
fn regenerate(catalog_size: usize, exclusions: &ExclusionSet) -> Vec<usize> {
    let mut eligible: Vec<usize> = (0..catalog_size)
        .filter(|i| !exclusions.contains(*i))
        .collect();
    eligible.shuffle(&mut rand::thread_rng());
    eligible
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn memory_queue(initial: Vec<usize>) -> (RotationQueue, std::sync::Arc<MemoryQueueStore>) {
        // The queue owns a boxed store, so tests keep a second handle through
        // an Arc-backed wrapper.
        struct Shared(std::sync::Arc<MemoryQueueStore>);
        impl QueueStore for Shared {
            fn load(&self) -> std::result::Result<Vec<usize>, QueueError> {
                self.0.load()
            }
            fn save(&self, remaining: &[usize]) -> std::result::Result<(), QueueError> {
                self.0.save(remaining)
            }
        }

        let store = std::sync::Arc::new(MemoryQueueStore::new(initial));
        let queue = RotationQueue::new(Box::new(Shared(store.clone())));
        (queue, store)
    }

    #[test]
    fn test_regenerate_is_permutation_of_eligible_set() {
        let exclusions: ExclusionSet = [1usize, 4].into_iter().collect();
        let order = regenerate(6, &exclusions);

        let values: HashSet<usize> = order.iter().copied().collect();
        assert_eq!(order.len(), 4, "no duplicates");
        assert_eq!(values, [0usize, 2, 3, 5].into_iter().collect());
    }

    #[test]
    fn test_first_selection_regenerates_from_empty_state() {
        let (queue, _store) = memory_queue(Vec::new());
        let selection = queue.next(5, &ExclusionSet::default()).unwrap();

        assert!(selection.selected < 5);
        assert_eq!(selection.remaining.len(), 4);
        assert!(!selection.remaining.contains(&selection.selected));
    }

    #[test]
    fn test_full_cycle_covers_every_eligible_identifier_once() {
        let exclusions: ExclusionSet = [2usize, 5].into_iter().collect();
        let (queue, _store) = memory_queue(Vec::new());

        let mut selected = Vec::new();
        for _ in 0..5 {
            let selection = queue.next(7, &exclusions).unwrap();
            queue.commit(&selection.remaining).unwrap();
            selected.push(selection.selected);
        }

        let unique: HashSet<usize> = selected.iter().copied().collect();
        assert_eq!(unique.len(), 5, "no repeats within a cycle");
        assert_eq!(unique, [0usize, 1, 3, 4, 6].into_iter().collect());
    }

    #[test]
    fn test_cycle_restart_regenerates_fresh_permutation() {
        let (queue, store) = memory_queue(Vec::new());

        for _ in 0..5 {
            let selection = queue.next(5, &ExclusionSet::default()).unwrap();
            queue.commit(&selection.remaining).unwrap();
        }
        assert!(store.contents().is_empty(), "cycle exhausted");

        // Sixth run starts a new cycle.
        let selection = queue.next(5, &ExclusionSet::default()).unwrap();
        assert_eq!(selection.remaining.len(), 4);
    }

    #[test]
    fn test_head_selection_preserves_order() {
        let (queue, _store) = memory_queue(vec![4, 1, 3]);
        let selection = queue.next(10, &ExclusionSet::default()).unwrap();

        assert_eq!(selection.selected, 4);
        assert_eq!(selection.remaining, vec![1, 3]);
    }

    #[test]
    fn test_late_exclusion_is_filtered_and_dropped() {
        let (queue, _store) = memory_queue(vec![4, 1, 3]);
        let exclusions: ExclusionSet = [1usize].into_iter().collect();

        let selection = queue.next(10, &exclusions).unwrap();
        assert_eq!(selection.selected, 4);
        assert_eq!(selection.remaining, vec![3], "1 dropped from remainder");

        // Excluded head is never returned either.
        let (queue, _store) = memory_queue(vec![1, 4, 3]);
        let selection = queue.next(10, &exclusions).unwrap();
        assert_eq!(selection.selected, 4);
    }

    #[test]
    fn test_out_of_range_identifiers_dropped_after_catalog_shrink() {
        let (queue, _store) = memory_queue(vec![9, 2, 7, 0]);
        let selection = queue.next(3, &ExclusionSet::default()).unwrap();

        assert_eq!(selection.selected, 2);
        assert_eq!(selection.remaining, vec![0]);
    }

    #[test]
    fn test_duplicate_identifiers_in_state_collapse() {
        let (queue, _store) = memory_queue(vec![2, 2, 1, 2]);
        let selection = queue.next(5, &ExclusionSet::default()).unwrap();

        assert_eq!(selection.selected, 2);
        assert_eq!(selection.remaining, vec![1]);
    }

    #[test]
    fn test_all_excluded_fails_without_mutation() {
        let exclusions: ExclusionSet = [0usize, 1, 2].into_iter().collect();
        let (queue, store) = memory_queue(Vec::new());

        let result = queue.next(3, &exclusions);
        assert!(matches!(
            result,
            Err(crate::error::RotacastError::Queue(QueueError::NoEligibleItems))
        ));
        assert_eq!(store.save_count(), 0, "no state written on failure");
    }

    #[test]
    fn test_next_performs_no_writes() {
        let (queue, store) = memory_queue(vec![3, 1]);
        queue.next(5, &ExclusionSet::default()).unwrap();
        assert_eq!(store.save_count(), 0);
        assert_eq!(store.contents(), vec![3, 1]);
    }

    #[test]
    fn test_commit_replaces_state() {
        let (queue, store) = memory_queue(vec![3, 1, 4]);
        queue.commit(&[1, 4]).unwrap();
        assert_eq!(store.contents(), vec![1, 4]);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_pending_applies_same_filter_as_next() {
        let (queue, _store) = memory_queue(vec![9, 2, 2, 1]);
        let exclusions: ExclusionSet = [1usize].into_iter().collect();
        assert_eq!(queue.pending(5, &exclusions).unwrap(), vec![2]);
    }

    mod file_store {
        use super::*;

        #[test]
        fn test_missing_file_loads_empty() {
            let dir = tempfile::tempdir().unwrap();
            let store = FileQueueStore::new(dir.path().join("order.txt"));
            assert!(store.load().unwrap().is_empty());
        }

        #[test]
        fn test_save_then_load_roundtrip() {
            let dir = tempfile::tempdir().unwrap();
            let store = FileQueueStore::new(dir.path().join("order.txt"));

            store.save(&[4, 0, 2]).unwrap();
            assert_eq!(store.load().unwrap(), vec![4, 0, 2]);
        }

        #[test]
        fn test_save_fully_replaces_previous_state() {
            let dir = tempfile::tempdir().unwrap();
            let store = FileQueueStore::new(dir.path().join("order.txt"));

            store.save(&[9, 8, 7, 6]).unwrap();
            store.save(&[1]).unwrap();

            let content = std::fs::read_to_string(store.path()).unwrap();
            assert_eq!(content, "1\n");
        }

        #[test]
        fn test_save_empty_remainder_writes_empty_file() {
            let dir = tempfile::tempdir().unwrap();
            let store = FileQueueStore::new(dir.path().join("order.txt"));

            store.save(&[]).unwrap();
            assert!(store.path().exists());
            assert!(store.load().unwrap().is_empty());
        }

        #[test]
        fn test_save_leaves_no_temp_files_behind() {
            let dir = tempfile::tempdir().unwrap();
            let store = FileQueueStore::new(dir.path().join("order.txt"));
            store.save(&[1, 2, 3]).unwrap();

            let entries: Vec<_> = std::fs::read_dir(dir.path())
                .unwrap()
                .map(|e| e.unwrap().file_name())
                .collect();
            assert_eq!(entries.len(), 1, "only the state file remains");
        }

        #[test]
        fn test_load_skips_blank_lines() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("order.txt");
            std::fs::write(&path, "3\n\n1\n").unwrap();

            let store = FileQueueStore::new(&path);
            assert_eq!(store.load().unwrap(), vec![3, 1]);
        }

        #[test]
        fn test_load_rejects_garbage() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("order.txt");
            std::fs::write(&path, "3\nnot-a-number\n").unwrap();

            let store = FileQueueStore::new(&path);
            let result = store.load();
            match result {
                Err(QueueError::Parse { line_no, text }) => {
                    assert_eq!(line_no, 2);
                    assert_eq!(text, "not-a-number");
                }
                other => panic!("Expected parse error, got {:?}", other),
            }
        }
    }
}
