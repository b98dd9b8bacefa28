//! Completion history across the live log and the CSV archive.
//!
//! `rollup` moves logged completions into the CSV, so anything that needs
//! the full history reads both and deduplicates by record id.

use crate::rollup::CsvRow;
use crate::{CompletionRecord, Result};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

impl TryFrom<CsvRow> for CompletionRecord {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let completed_at = DateTime::parse_from_rfc3339(&row.completed_at)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        Ok(CompletionRecord {
            id,
            program_name: row.program_name,
            day_number: row.day_number,
            completed_at,
        })
    }
}

/// Load every completion from the log and the CSV archive.
///
/// Records are returned oldest first. A record present in both is kept once.
pub fn load_completion_history(log_path: &Path, csv_path: &Path) -> Result<Vec<CompletionRecord>> {
    let mut records = Vec::new();
    let mut seen_ids = HashSet::new();

    if csv_path.exists() {
        for record in load_completions_from_csv(csv_path)? {
            if seen_ids.insert(record.id) {
                records.push(record);
            }
        }
        tracing::debug!("Loaded {} completions from CSV", records.len());
    }

    let archived = records.len();
    for record in crate::completion_log::read_completions(log_path)? {
        if seen_ids.insert(record.id) {
            records.push(record);
        }
    }
    tracing::debug!("Loaded {} completions from log", records.len() - archived);

    records.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));
    Ok(records)
}

fn load_completions_from_csv(path: &Path) -> Result<Vec<CompletionRecord>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match CompletionRecord::try_from(row) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("Failed to parse CSV row: {}", e),
            },
            Err(e) => tracing::warn!("Failed to deserialize CSV row: {}", e),
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion_log::{CompletionSink, JsonlCompletionLog};
    use crate::rollup::log_to_csv_and_archive;
    use crate::ProgramDay;

    #[test]
    fn test_history_spans_archive_and_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("completions.wal");
        let csv_path = temp_dir.path().join("completions.csv");

        let first = CompletionRecord::now(&ProgramDay::new("strength", 1));
        JsonlCompletionLog::new(&log_path).append(&first).unwrap();
        log_to_csv_and_archive(&log_path, &csv_path).unwrap();

        let second = CompletionRecord::now(&ProgramDay::new("strength", 2));
        JsonlCompletionLog::new(&log_path).append(&second).unwrap();

        let history = load_completion_history(&log_path, &csv_path).unwrap();
        let days: Vec<u32> = history.iter().map(|r| r.day_number).collect();
        assert_eq!(days, vec![1, 2]);
        assert_eq!(history[0].id, first.id);
    }

    #[test]
    fn test_duplicate_ids_are_kept_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("completions.wal");
        let csv_path = temp_dir.path().join("completions.csv");

        let record = CompletionRecord::now(&ProgramDay::new("strength", 1));
        JsonlCompletionLog::new(&log_path).append(&record).unwrap();
        log_to_csv_and_archive(&log_path, &csv_path).unwrap();
        JsonlCompletionLog::new(&log_path).append(&record).unwrap();

        let history = load_completion_history(&log_path, &csv_path).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_bad_csv_rows_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("completions.csv");
        std::fs::write(
            &csv_path,
            "id,program_name,day_number,completed_at\nnot-a-uuid,strength,1,2024-01-01T00:00:00Z\n",
        )
        .unwrap();

        let history =
            load_completion_history(&temp_dir.path().join("completions.wal"), &csv_path).unwrap();
        assert!(history.is_empty());
    }
}
