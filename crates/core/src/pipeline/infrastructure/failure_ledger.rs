//! On-disk record of the files that failed in a batch run, so a later
//! `--retry` invocation can reprocess exactly those.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pipeline::batch_report::{BatchSummary, FileOutcome};
use crate::shared::constants::FAILED_FILES_DIR;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to write ledger {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to read ledger {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed ledger {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One failed file as recorded on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Relative to the batch root, for display.
    pub file_path: String,
    pub full_path: String,
    pub error: String,
    pub timestamp: String,
}

/// The full ledger for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureLedger {
    pub processing_time: String,
    pub source_folder: String,
    pub total_failed: usize,
    pub failed_files: Vec<FailureRecord>,
}

impl FailureLedger {
    /// Build a ledger from a finished run; `None` when nothing failed.
    pub fn from_summary(root: &Path, summary: &BatchSummary) -> Option<Self> {
        let now = Local::now();
        let stamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
        let failed_files: Vec<FailureRecord> = summary
            .reports
            .iter()
            .filter_map(|report| match &report.outcome {
                FileOutcome::Failed { kind, detail } => Some(FailureRecord {
                    file_path: report.relative.display().to_string(),
                    full_path: report.path.display().to_string(),
                    error: format!("{kind}: {detail}"),
                    timestamp: stamp.clone(),
                }),
                _ => None,
            })
            .collect();
        if failed_files.is_empty() {
            return None;
        }
        Some(Self {
            processing_time: now.to_rfc3339(),
            source_folder: root.display().to_string(),
            total_failed: failed_files.len(),
            failed_files,
        })
    }
}

/// Directory the CLI writes ledgers into, relative to the working directory.
pub fn default_dir() -> PathBuf {
    PathBuf::from(FAILED_FILES_DIR)
}

/// Write the JSON ledger plus a human-readable list; returns the JSON path.
pub fn save(ledger: &FailureLedger, dir: &Path) -> Result<PathBuf, LedgerError> {
    fs::create_dir_all(dir).map_err(|source| LedgerError::Write {
        path: dir.to_path_buf(),
        source,
    })?;
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let json_path = dir.join(format!("failed_files_{stamp}.json"));
    let list_path = dir.join(format!("failed_list_{stamp}.txt"));

    let json = serde_json::to_string_pretty(ledger).map_err(|source| LedgerError::Malformed {
        path: json_path.clone(),
        source,
    })?;
    fs::write(&json_path, json).map_err(|source| LedgerError::Write {
        path: json_path.clone(),
        source,
    })?;

    let mut list = String::new();
    let _ = writeln!(list, "Files that failed processing");
    let _ = writeln!(list, "Run: {}", ledger.processing_time);
    let _ = writeln!(list, "Source folder: {}", ledger.source_folder);
    let _ = writeln!(list, "Failed files: {}", ledger.total_failed);
    let _ = writeln!(list);
    for (i, record) in ledger.failed_files.iter().enumerate() {
        let _ = writeln!(list, "{}. {}", i + 1, record.file_path);
        let _ = writeln!(list, "   full path: {}", record.full_path);
        let _ = writeln!(list, "   at: {}", record.timestamp);
        let _ = writeln!(list, "   error: {}", record.error);
    }
    fs::write(&list_path, list).map_err(|source| LedgerError::Write {
        path: list_path,
        source,
    })?;

    Ok(json_path)
}

/// Load a JSON ledger previously written by [`save`].
pub fn load(path: &Path) -> Result<FailureLedger, LedgerError> {
    let text = fs::read_to_string(path).map_err(|source| LedgerError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LedgerError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}
