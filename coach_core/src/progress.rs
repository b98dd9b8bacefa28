//! Progress persistence: a single global slot holding the in-flight workout position.
//!
//! Only one workout is tracked at a time, so every write overwrites the slot
//! regardless of which program day it held before.

use crate::sequencer::Sequencer;
use crate::{PersistedProgress, ProgramDay, Result, SequencePosition};
use std::path::{Path, PathBuf};

/// File name of the slot inside the data directory
pub const PROGRESS_FILE: &str = "progress.json";

/// Durable key-value slot for workout progress
pub trait ProgressStore {
    fn get(&self) -> Result<Option<PersistedProgress>>;
    fn set(&mut self, progress: &PersistedProgress) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

impl<T: ProgressStore + ?Sized> ProgressStore for Box<T> {
    fn get(&self) -> Result<Option<PersistedProgress>> {
        (**self).get()
    }

    fn set(&mut self, progress: &PersistedProgress) -> Result<()> {
        (**self).set(progress)
    }

    fn clear(&mut self) -> Result<()> {
        (**self).clear()
    }
}

/// Slot stored as a JSON file with file locking
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Slot at the standard location under a data directory
    pub fn in_data_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(PROGRESS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProgressStore for FileProgressStore {
    fn get(&self) -> Result<Option<PersistedProgress>> {
        crate::storage::read_json(&self.path)
    }

    fn set(&mut self, progress: &PersistedProgress) -> Result<()> {
        crate::storage::write_json_atomic(&self.path, progress)?;
        tracing::debug!("Saved progress {:?} to {:?}", progress, self.path);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        crate::storage::remove_file(&self.path)?;
        tracing::debug!("Cleared progress at {:?}", self.path);
        Ok(())
    }
}

/// In-memory slot, for tests and read-only sessions
#[derive(Debug, Default, Clone)]
pub struct MemoryProgressStore {
    slot: Option<PersistedProgress>,
    writes: usize,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(progress: PersistedProgress) -> Self {
        Self {
            slot: Some(progress),
            writes: 0,
        }
    }

    /// Number of `set` calls so far
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ProgressStore for MemoryProgressStore {
    fn get(&self) -> Result<Option<PersistedProgress>> {
        Ok(self.slot.clone())
    }

    fn set(&mut self, progress: &PersistedProgress) -> Result<()> {
        self.slot = Some(progress.clone());
        self.writes += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.slot = None;
        Ok(())
    }
}

/// Look up a resumable position for the workout being opened.
///
/// A slot for a different program day, or one pointing outside this workout,
/// is discarded.
pub fn take_resumable<S: ProgressStore + ?Sized>(
    store: &mut S,
    key: &ProgramDay,
    sequencer: &Sequencer,
) -> Result<Option<SequencePosition>> {
    let Some(saved) = store.get()? else {
        return Ok(None);
    };

    if !saved.matches(key) {
        tracing::info!(
            "Discarding saved progress for {} day {} while opening {}",
            saved.program_name,
            saved.day_number,
            key
        );
        store.clear()?;
        return Ok(None);
    }

    let position = saved.position();
    if !sequencer.is_valid(position) {
        tracing::warn!(
            "Saved progress {:?} no longer fits {}. Discarding it.",
            position,
            key
        );
        store.clear()?;
        return Ok(None);
    }

    Ok(Some(position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::tests::two_by_two;

    fn beginner_day(day: u32) -> ProgramDay {
        ProgramDay::new("beginner-program", day)
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileProgressStore::in_data_dir(temp_dir.path());
        assert_eq!(store.get().unwrap(), None);

        let progress = PersistedProgress::new(&beginner_day(5), SequencePosition::rest(1, 2));
        store.set(&progress).unwrap();

        let reopened = FileProgressStore::in_data_dir(temp_dir.path());
        assert_eq!(reopened.get().unwrap(), Some(progress));
    }

    #[test]
    fn test_file_store_clear() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileProgressStore::in_data_dir(temp_dir.path());

        store.clear().unwrap();

        let progress = PersistedProgress::new(&beginner_day(1), SequencePosition::default());
        store.set(&progress).unwrap();
        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_corrupted_slot_reads_as_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileProgressStore::in_data_dir(temp_dir.path());
        std::fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_take_resumable_restores_matching_slot() {
        let mut workout = two_by_two();
        workout.blocks[1]
            .exercises
            .push(crate::sequencer::tests::exercise("E", "30 seconds", "10 seconds"));
        let sequencer = Sequencer::new(workout).unwrap();

        let key = beginner_day(5);
        let mut store =
            MemoryProgressStore::with(PersistedProgress::new(&key, SequencePosition::rest(1, 2)));

        let restored = take_resumable(&mut store, &key, &sequencer).unwrap();
        assert_eq!(restored, Some(SequencePosition::rest(1, 2)));
        assert!(store.get().unwrap().is_some());
    }

    #[test]
    fn test_take_resumable_discards_other_day() {
        let sequencer = Sequencer::new(two_by_two()).unwrap();
        let mut store = MemoryProgressStore::with(PersistedProgress::new(
            &beginner_day(5),
            SequencePosition::rest(1, 0),
        ));

        let restored = take_resumable(&mut store, &beginner_day(6), &sequencer).unwrap();
        assert_eq!(restored, None);
        assert_eq!(store.get().unwrap(), None);
    }

    #[test]
    fn test_take_resumable_discards_out_of_range_slot() {
        let sequencer = Sequencer::new(two_by_two()).unwrap();
        let key = beginner_day(5);
        let mut store =
            MemoryProgressStore::with(PersistedProgress::new(&key, SequencePosition::active(7, 0)));

        assert_eq!(take_resumable(&mut store, &key, &sequencer).unwrap(), None);
        assert_eq!(store.get().unwrap(), None);
    }
}
