//! Locked JSON file helpers shared by the progress slot and the profile cache.
//!
//! Reads take a shared lock; writes go to a locked temp file in the same
//! directory that is synced and then renamed over the target.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read a JSON document under a shared lock.
///
/// Returns `Ok(None)` if the file does not exist. A file that cannot be read
/// or parsed is logged and also treated as absent.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {:?}: {}. Ignoring it.", path, e);
            return Ok(None);
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {:?}: {}. Ignoring it.", path, e);
        return Ok(None);
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {:?}: {}. Ignoring it.", path, e);
        return Ok(None);
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!("Failed to parse {:?}: {}. Ignoring it.", path, e);
            Ok(None)
        }
    }
}

/// Atomically replace `path` with the JSON encoding of `value`
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "storage path missing parent")
    })?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Remove a file; a missing file is not an error
pub fn remove_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_write_then_read() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("doc.json");

        let mut doc = BTreeMap::new();
        doc.insert("day".to_string(), 5u32);
        write_json_atomic(&path, &doc).unwrap();

        let loaded: Option<BTreeMap<String, u32>> = read_json(&path).unwrap();
        assert_eq!(loaded, Some(doc));
    }

    #[test]
    fn test_read_missing_and_corrupt() {
        let temp_dir = tempfile::tempdir().unwrap();
        let missing = temp_dir.path().join("missing.json");
        assert_eq!(read_json::<u32>(&missing).unwrap(), None);

        let corrupt = temp_dir.path().join("corrupt.json");
        std::fs::write(&corrupt, "{ invalid json }").unwrap();
        assert_eq!(read_json::<u32>(&corrupt).unwrap(), None);
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("doc.json");
        write_json_atomic(&path, &1u32).unwrap();
        write_json_atomic(&path, &2u32).unwrap();

        let extras: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name() != "doc.json")
            .collect();
        assert!(extras.is_empty(), "found extras: {:?}", extras);
        assert_eq!(read_json::<u32>(&path).unwrap(), Some(2));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let temp_dir = tempfile::tempdir().unwrap();
        remove_file(&temp_dir.path().join("nothing.json")).unwrap();
    }
}
