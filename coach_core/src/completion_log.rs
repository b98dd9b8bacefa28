//! Append-only completion log.
//!
//! Completions are appended to a JSONL (JSON Lines) file under an exclusive
//! file lock. The log is the local source of truth for completed days.

use crate::{CompletionRecord, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Sink that durably records day completions
pub trait CompletionSink {
    fn append(&mut self, record: &CompletionRecord) -> Result<()>;
}

/// JSONL-based completion log with file locking
pub struct JsonlCompletionLog {
    path: PathBuf,
}

impl JsonlCompletionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl CompletionSink for JsonlCompletionLog {
    fn append(&mut self, record: &CompletionRecord) -> Result<()> {
        self.ensure_parent_dir()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(record)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!(
            "Logged completion {} for {} day {}",
            record.id,
            record.program_name,
            record.day_number
        );
        Ok(())
    }
}

/// Read every completion from a log file. Unparseable lines are skipped.
pub fn read_completions(path: &Path) -> Result<Vec<CompletionRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut records = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<CompletionRecord>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!("Failed to parse completion at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} completions from {:?}", records.len(), path);
    Ok(records)
}
