//! Archive the completion log into a CSV history file.
//!
//! The CSV is fsynced before the log is renamed out of the way, and the log is
//! renamed rather than deleted so it can be recovered by hand.

use crate::{CompletionRecord, Result};
use chrono::Utc;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// A row in the CSV history
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub(crate) struct CsvRow {
    pub(crate) id: String,
    pub(crate) program_name: String,
    pub(crate) day_number: u32,
    pub(crate) completed_at: String,
}

impl From<&CompletionRecord> for CsvRow {
    fn from(record: &CompletionRecord) -> Self {
        CsvRow {
            id: record.id.to_string(),
            program_name: record.program_name.clone(),
            day_number: record.day_number,
            completed_at: record.completed_at.to_rfc3339(),
        }
    }
}

/// Append every logged completion to `csv_path` and archive the log.
///
/// Returns the number of completions written.
pub fn log_to_csv_and_archive(log_path: &Path, csv_path: &Path) -> Result<usize> {
    let records = crate::completion_log::read_completions(log_path)?;

    if records.is_empty() {
        tracing::info!("No completions in log to roll up");
        return Ok(0);
    }

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)?;

    // Only a brand-new file gets a header row
    let needs_headers = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file);

    for record in &records {
        writer.serialize(CsvRow::from(record))?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Wrote {} completions to {:?}", records.len(), csv_path);

    let archived = archived_path(log_path);
    std::fs::rename(log_path, &archived)?;
    tracing::info!("Archived completion log to {:?}", archived);

    Ok(records.len())
}

fn archived_path(log_path: &Path) -> PathBuf {
    let stamp = Utc::now().format("%Y%m%dT%H%M%S%.3f");
    log_path.with_extension(format!("wal.{}.processed", stamp))
}
