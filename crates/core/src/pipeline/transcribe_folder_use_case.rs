use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::scan::domain::audio_file::AudioFile;
use crate::scan::infrastructure::walker;
use crate::shared::constants::{DEFAULT_FILE_DELAY_SECS, SUBTITLE_EXTENSION};
use crate::subtitle::domain::srt_formatter;
use crate::transcription::domain::transcriber::{TranscribeError, Transcriber};

use super::batch_report::{BatchSummary, FailureKind, FileOutcome, FileReport};
use super::batch_reporter::BatchReporter;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("folder not found: {}", .0.display())]
    RootNotFound(PathBuf),
    #[error("not a folder: {}", .0.display())]
    NotADirectory(PathBuf),
    #[error("failed to scan {}: {source}", .path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What to do when the subtitle file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Replace the existing file. The default.
    #[default]
    Overwrite,
    /// Leave it alone and record the file as skipped.
    Skip,
}

/// Knobs for one batch run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Mirror outputs under this root instead of writing beside the sources.
    pub output_root: Option<PathBuf>,
    pub overwrite: OverwritePolicy,
    /// Worker threads; 1 means sequential.
    pub workers: usize,
    /// Pause between files in sequential mode.
    pub file_delay: Duration,
    pub output_extension: String,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            output_root: None,
            overwrite: OverwritePolicy::Overwrite,
            workers: 1,
            file_delay: Duration::from_secs(DEFAULT_FILE_DELAY_SECS),
            output_extension: SUBTITLE_EXTENSION.to_string(),
        }
    }
}

struct FileJob {
    index: usize,
    file: AudioFile,
    relative: PathBuf,
    output: PathBuf,
}

enum Event {
    Started { index: usize, path: PathBuf },
    Finished { index: usize, report: FileReport },
}

/// Orchestrates one batch run: discovery, per-file transcription and
/// subtitle writing, progress reporting, and summary assembly.
///
/// Every per-file error is captured in that file's report and the walk
/// continues; only a root that cannot be scanned at all aborts the run.
pub struct TranscribeFolderUseCase {
    transcriber: Box<dyn Transcriber>,
    reporter: Box<dyn BatchReporter>,
    options: BatchOptions,
}

impl TranscribeFolderUseCase {
    pub fn new(
        transcriber: Box<dyn Transcriber>,
        reporter: Box<dyn BatchReporter>,
        options: BatchOptions,
    ) -> Self {
        Self {
            transcriber,
            reporter,
            options,
        }
    }

    /// Discover audio files under `root` and process them all.
    pub fn execute(&mut self, root: &Path) -> Result<BatchSummary, BatchError> {
        if !root.exists() {
            return Err(BatchError::RootNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(BatchError::NotADirectory(root.to_path_buf()));
        }
        let files = walker::discover(root).map_err(|source| BatchError::Scan {
            path: root.to_path_buf(),
            source,
        })?;
        Ok(self.run(root, files))
    }

    /// Process an explicit file list (retry mode). `root` only anchors the
    /// relative paths shown in reports.
    pub fn execute_files(&mut self, root: &Path, files: Vec<AudioFile>) -> BatchSummary {
        self.run(root, files)
    }

    fn run(&mut self, root: &Path, files: Vec<AudioFile>) -> BatchSummary {
        self.reporter.batch_started(root, &files);

        let jobs: Vec<FileJob> = files
            .into_iter()
            .enumerate()
            .map(|(index, file)| {
                let output = output_path_for(&self.options, root, &file);
                let relative = file
                    .path()
                    .strip_prefix(root)
                    .unwrap_or(file.path())
                    .to_path_buf();
                FileJob {
                    index,
                    file,
                    relative,
                    output,
                }
            })
            .collect();

        let total = jobs.len();
        let reports = if self.options.workers > 1 && total > 1 {
            self.run_parallel(jobs, total)
        } else {
            self.run_sequential(jobs, total)
        };

        let summary = BatchSummary::from_reports(reports);
        self.reporter.summary(&summary);
        summary
    }

    fn run_sequential(&mut self, jobs: Vec<FileJob>, total: usize) -> Vec<FileReport> {
        let mut reports = Vec::with_capacity(total);
        for job in jobs {
            let is_last = job.index + 1 == total;
            self.reporter.file_started(job.index + 1, total, &job.relative);
            let report = process_file(&*self.transcriber, self.options.overwrite, job);
            self.reporter.file_finished(&report);
            reports.push(report);
            if !is_last && !self.options.file_delay.is_zero() {
                thread::sleep(self.options.file_delay);
            }
        }
        reports
    }

    /// Worker-pool variant: a job channel feeds scoped threads, and results
    /// come back over an event channel so reporting stays on one thread.
    fn run_parallel(&mut self, jobs: Vec<FileJob>, total: usize) -> Vec<FileReport> {
        let workers = self.options.workers.min(total);
        let transcriber: &dyn Transcriber = &*self.transcriber;
        let overwrite = self.options.overwrite;
        let reporter = &mut self.reporter;

        let (job_tx, job_rx) = crossbeam_channel::unbounded::<FileJob>();
        for job in jobs {
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<Event>();
        let mut slots: Vec<Option<FileReport>> = (0..total).map(|_| None).collect();

        thread::scope(|s| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let event_tx = event_tx.clone();
                s.spawn(move || {
                    for job in job_rx.iter() {
                        let index = job.index;
                        let _ = event_tx.send(Event::Started {
                            index,
                            path: job.relative.clone(),
                        });
                        let report = process_file(transcriber, overwrite, job);
                        let _ = event_tx.send(Event::Finished { index, report });
                    }
                });
            }
            drop(event_tx);

            for event in event_rx.iter() {
                match event {
                    Event::Started { index, path } => {
                        reporter.file_started(index + 1, total, &path)
                    }
                    Event::Finished { index, report } => {
                        reporter.file_finished(&report);
                        slots[index] = Some(report);
                    }
                }
            }
        });

        slots.into_iter().flatten().collect()
    }
}

fn output_path_for(options: &BatchOptions, root: &Path, file: &AudioFile) -> PathBuf {
    let source = match &options.output_root {
        None => file.path().to_path_buf(),
        Some(out_root) => {
            let relative = file.path().strip_prefix(root).unwrap_or(file.path());
            out_root.join(relative)
        }
    };
    source.with_extension(options.output_extension.as_str())
}

fn process_file(
    transcriber: &dyn Transcriber,
    overwrite: OverwritePolicy,
    job: FileJob,
) -> FileReport {
    let FileJob {
        file,
        relative,
        output,
        ..
    } = job;
    let outcome = transcribe_one(transcriber, overwrite, &file, &output);
    FileReport {
        path: file.path().to_path_buf(),
        relative,
        output,
        outcome,
    }
}

fn transcribe_one(
    transcriber: &dyn Transcriber,
    overwrite: OverwritePolicy,
    file: &AudioFile,
    output: &Path,
) -> FileOutcome {
    if overwrite == OverwritePolicy::Skip && output.exists() {
        return FileOutcome::Skipped;
    }

    let segments = match transcriber.transcribe(file) {
        Ok(segments) => segments,
        Err(e) => {
            return FileOutcome::Failed {
                kind: failure_kind(&e),
                detail: e.to_string(),
            }
        }
    };

    let srt = srt_formatter::render_segments(&segments);
    if let Some(parent) = output.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            return FileOutcome::Failed {
                kind: FailureKind::Filesystem,
                detail: format!("cannot create {}: {e}", parent.display()),
            };
        }
    }
    match fs::write(output, srt) {
        Ok(()) => FileOutcome::Succeeded,
        Err(e) => FileOutcome::Failed {
            kind: FailureKind::Filesystem,
            detail: format!("cannot write {}: {e}", output.display()),
        },
    }
}

fn failure_kind(error: &TranscribeError) -> FailureKind {
    match error {
        TranscribeError::SizeExceeded { .. } => FailureKind::SizeExceeded,
        TranscribeError::Read { .. } => FailureKind::Filesystem,
        TranscribeError::Transport(_) => FailureKind::Transport,
        TranscribeError::Upstream(_) => FailureKind::Upstream,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::batch_reporter::NullBatchReporter;
    use crate::transcription::domain::transcript::TranscriptSegment;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    // ─── Stubs ───

    struct StubTranscriber {
        fail_names: HashSet<String>,
        calls: Arc<AtomicUsize>,
    }

    impl StubTranscriber {
        fn ok() -> Self {
            Self {
                fail_names: HashSet::new(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing_on(names: &[&str]) -> Self {
            Self {
                fail_names: names.iter().map(|n| n.to_string()).collect(),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Transcriber for StubTranscriber {
        fn transcribe(
            &self,
            file: &AudioFile,
        ) -> Result<Vec<TranscriptSegment>, TranscribeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = file
                .path()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default();
            if self.fail_names.contains(name) {
                return Err(TranscribeError::Transport("connection refused".to_string()));
            }
            Ok(vec![TranscriptSegment {
                text: format!("transcript of {name}"),
                start: Duration::from_secs(1),
                end: Duration::from_secs(2),
            }])
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        events: Arc<Mutex<Vec<String>>>,
    }

    impl BatchReporter for RecordingReporter {
        fn batch_started(&mut self, _root: &Path, files: &[AudioFile]) {
            self.events.lock().unwrap().push(format!("started:{}", files.len()));
        }
        fn file_started(&mut self, index: usize, total: usize, _path: &Path) {
            self.events.lock().unwrap().push(format!("file:{index}/{total}"));
        }
        fn file_finished(&mut self, report: &FileReport) {
            let tag = match &report.outcome {
                FileOutcome::Succeeded => "ok",
                FileOutcome::Skipped => "skip",
                FileOutcome::Failed { .. } => "fail",
            };
            self.events.lock().unwrap().push(format!("done:{tag}"));
        }
        fn summary(&mut self, summary: &BatchSummary) {
            self.events
                .lock()
                .unwrap()
                .push(format!("summary:{}/{}", summary.succeeded, summary.total));
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"audio-bytes").unwrap();
    }

    fn options() -> BatchOptions {
        BatchOptions {
            file_delay: Duration::ZERO,
            ..BatchOptions::default()
        }
    }

    fn use_case(transcriber: StubTranscriber, opts: BatchOptions) -> TranscribeFolderUseCase {
        TranscribeFolderUseCase::new(Box::new(transcriber), Box::new(NullBatchReporter), opts)
    }

    #[test]
    fn test_outputs_written_beside_sources() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a.mp3"));
        touch(&root.join("sub/b.wav"));

        let summary = use_case(StubTranscriber::ok(), options())
            .execute(root)
            .unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.succeeded, 2);
        assert!(root.join("a.srt").exists());
        assert!(root.join("sub/b.srt").exists());
        // sources untouched
        assert_eq!(fs::read(root.join("a.mp3")).unwrap(), b"audio-bytes");
        assert_eq!(fs::read(root.join("sub/b.wav")).unwrap(), b"audio-bytes");
    }

    #[test]
    fn test_written_subtitle_is_srt_text() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("talk.mp3"));

        use_case(StubTranscriber::ok(), options())
            .execute(root)
            .unwrap();

        let srt = fs::read_to_string(root.join("talk.srt")).unwrap();
        assert_eq!(srt, "1\n00:00:01,000 --> 00:00:02,000\ntranscript of talk.mp3\n\n");
    }

    #[test]
    fn test_single_failure_does_not_stop_the_batch() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a.mp3"));
        touch(&root.join("b.mp3"));
        touch(&root.join("c.mp3"));

        let summary = use_case(StubTranscriber::failing_on(&["a.mp3"]), options())
            .execute(root)
            .unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.succeeded, 2);
        assert!(!root.join("a.srt").exists());
        assert!(root.join("b.srt").exists());
        assert!(root.join("c.srt").exists());

        let failure = summary.failures().next().unwrap();
        assert!(matches!(
            failure.outcome,
            FileOutcome::Failed {
                kind: FailureKind::Transport,
                ..
            }
        ));
    }

    #[test]
    fn test_skip_policy_leaves_existing_output_alone() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a.mp3"));
        fs::write(root.join("a.srt"), "hand-edited").unwrap();

        let transcriber = StubTranscriber::ok();
        let calls = transcriber.calls.clone();
        let opts = BatchOptions {
            overwrite: OverwritePolicy::Skip,
            ..options()
        };
        let summary = use_case(transcriber, opts).execute(root).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.succeeded, 0);
        assert_eq!(fs::read_to_string(root.join("a.srt")).unwrap(), "hand-edited");
        // the transcriber was never consulted for the skipped file
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_policy_overwrites_existing_output() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a.mp3"));
        fs::write(root.join("a.srt"), "stale").unwrap();

        let summary = use_case(StubTranscriber::ok(), options())
            .execute(root)
            .unwrap();

        assert_eq!(summary.succeeded, 1);
        assert_ne!(fs::read_to_string(root.join("a.srt")).unwrap(), "stale");
    }

    #[test]
    fn test_output_root_mirrors_source_tree() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("in");
        let out = tmp.path().join("out");
        touch(&root.join("a.mp3"));
        touch(&root.join("sub/b.wav"));

        let opts = BatchOptions {
            output_root: Some(out.clone()),
            ..options()
        };
        let summary = use_case(StubTranscriber::ok(), opts).execute(&root).unwrap();

        assert_eq!(summary.succeeded, 2);
        assert!(out.join("a.srt").exists());
        assert!(out.join("sub/b.srt").exists());
        assert!(!root.join("a.srt").exists());
    }

    #[test]
    fn test_parallel_run_processes_everything() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        for i in 0..6 {
            touch(&root.join(format!("f{i}.mp3")));
        }

        let opts = BatchOptions {
            workers: 3,
            ..options()
        };
        let summary = use_case(StubTranscriber::failing_on(&["f2.mp3"]), opts)
            .execute(root)
            .unwrap();

        assert_eq!(summary.total, 6);
        assert_eq!(summary.succeeded, 5);
        assert_eq!(summary.failed, 1);
        for i in [0usize, 1, 3, 4, 5] {
            assert!(root.join(format!("f{i}.srt")).exists());
        }
        // reports come back in discovery order regardless of completion order
        let names: Vec<_> = summary
            .reports
            .iter()
            .map(|r| r.relative.display().to_string())
            .collect();
        assert_eq!(names, vec!["f0.mp3", "f1.mp3", "f2.mp3", "f3.mp3", "f4.mp3", "f5.mp3"]);
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        let result = use_case(StubTranscriber::ok(), options()).execute(&missing);
        assert!(matches!(result, Err(BatchError::RootNotFound(_))));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.mp3");
        touch(&file);
        let result = use_case(StubTranscriber::ok(), options()).execute(&file);
        assert!(matches!(result, Err(BatchError::NotADirectory(_))));
    }

    #[test]
    fn test_empty_tree_yields_empty_summary() {
        let tmp = TempDir::new().unwrap();
        let summary = use_case(StubTranscriber::ok(), options())
            .execute(tmp.path())
            .unwrap();
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn test_reporter_sees_every_stage() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("a.mp3"));
        touch(&root.join("b.mp3"));

        let reporter = RecordingReporter::default();
        let events = reporter.events.clone();
        let mut use_case = TranscribeFolderUseCase::new(
            Box::new(StubTranscriber::failing_on(&["b.mp3"])),
            Box::new(reporter),
            options(),
        );
        use_case.execute(root).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "started:2",
                "file:1/2",
                "done:ok",
                "file:2/2",
                "done:fail",
                "summary:1/2",
            ]
        );
    }

    #[test]
    fn test_execute_files_anchors_relative_paths() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("sub/deep.mp3"));
        let files = vec![AudioFile::from_path(&root.join("sub/deep.mp3")).unwrap()];

        let mut use_case = use_case(StubTranscriber::ok(), options());
        let summary = use_case.execute_files(root, files);

        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.reports[0].relative, PathBuf::from("sub/deep.mp3"));
        assert!(root.join("sub/deep.srt").exists());
    }
}
