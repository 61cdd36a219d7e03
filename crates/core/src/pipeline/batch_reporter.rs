use std::path::Path;

use log::{info, warn};

use crate::scan::domain::audio_file::AudioFile;

use super::batch_report::{BatchSummary, FileOutcome, FileReport};

/// Cross-cutting observer for batch progress events.
///
/// Decouples the use case from any particular output channel. A reporter
/// only renders; it never aborts or retries on its own.
pub trait BatchReporter: Send {
    /// The file list is final; processing is about to begin.
    fn batch_started(&mut self, root: &Path, files: &[AudioFile]);

    fn file_started(&mut self, index: usize, total: usize, path: &Path);

    fn file_finished(&mut self, report: &FileReport);

    fn summary(&mut self, summary: &BatchSummary);
}

/// Silent reporter for tests and embedding.
pub struct NullBatchReporter;

impl BatchReporter for NullBatchReporter {
    fn batch_started(&mut self, _root: &Path, _files: &[AudioFile]) {}
    fn file_started(&mut self, _index: usize, _total: usize, _path: &Path) {}
    fn file_finished(&mut self, _report: &FileReport) {}
    fn summary(&mut self, _summary: &BatchSummary) {}
}

/// Log-crate reporter used by the CLI.
pub struct LogBatchReporter;

impl BatchReporter for LogBatchReporter {
    fn batch_started(&mut self, root: &Path, files: &[AudioFile]) {
        info!("found {} audio file(s) under {}", files.len(), root.display());
        for (i, file) in files.iter().enumerate() {
            let shown = file.path().strip_prefix(root).unwrap_or(file.path());
            let size_mb = std::fs::metadata(file.path())
                .map(|m| m.len() as f64 / (1024.0 * 1024.0))
                .unwrap_or(0.0);
            info!("  {}. {} ({size_mb:.1} MB)", i + 1, shown.display());
        }
    }

    fn file_started(&mut self, index: usize, total: usize, path: &Path) {
        info!("[{index}/{total}] processing {}", path.display());
    }

    fn file_finished(&mut self, report: &FileReport) {
        match &report.outcome {
            FileOutcome::Succeeded => info!("wrote {}", report.output.display()),
            FileOutcome::Skipped => {
                info!("skipped {} (output already exists)", report.relative.display())
            }
            FileOutcome::Failed { kind, detail } => {
                warn!("failed {} ({kind}): {detail}", report.relative.display())
            }
        }
    }

    fn summary(&mut self, summary: &BatchSummary) {
        info!(
            "batch finished: {} total, {} succeeded, {} failed, {} skipped",
            summary.total, summary.succeeded, summary.failed, summary.skipped
        );
        for report in summary.failures() {
            info!("  failed: {}", report.relative.display());
        }
    }
}
