use std::fmt;
use std::path::PathBuf;

/// Classification of a per-file failure, for reports and the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    SizeExceeded,
    Transport,
    Upstream,
    Filesystem,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::SizeExceeded => "size-exceeded",
            FailureKind::Transport => "transport",
            FailureKind::Upstream => "upstream",
            FailureKind::Filesystem => "filesystem",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Succeeded,
    /// Output already existed and the skip policy was in effect.
    Skipped,
    Failed { kind: FailureKind, detail: String },
}

/// Outcome record for one file in a batch run.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub path: PathBuf,
    /// Path relative to the batch root, for display and the ledger.
    pub relative: PathBuf,
    pub output: PathBuf,
    pub outcome: FileOutcome,
}

impl FileReport {
    pub fn is_success(&self) -> bool {
        self.outcome == FileOutcome::Succeeded
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, FileOutcome::Failed { .. })
    }
}

/// Aggregate of one batch run. Lives only for the run; failures are
/// additionally persisted through the failure ledger.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub reports: Vec<FileReport>,
}

impl BatchSummary {
    pub fn from_reports(reports: Vec<FileReport>) -> Self {
        let total = reports.len();
        let succeeded = reports.iter().filter(|r| r.is_success()).count();
        let failed = reports.iter().filter(|r| r.is_failure()).count();
        let skipped = total - succeeded - failed;
        Self {
            total,
            succeeded,
            failed,
            skipped,
            reports,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.reports.iter().filter(|r| r.is_failure())
    }
}
