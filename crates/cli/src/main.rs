use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use audioscribe_core::config::settings::Settings;
use audioscribe_core::pipeline::batch_report::BatchSummary;
use audioscribe_core::pipeline::batch_reporter::LogBatchReporter;
use audioscribe_core::pipeline::infrastructure::failure_ledger::{self, FailureLedger};
use audioscribe_core::pipeline::transcribe_folder_use_case::{
    BatchOptions, OverwritePolicy, TranscribeFolderUseCase,
};
use audioscribe_core::scan::domain::audio_file::AudioFile;
use audioscribe_core::shared::constants::{DEFAULT_FILE_DELAY_SECS, DEFAULT_PROMPT_PATH};
use audioscribe_core::subtitle::domain::srt_parser;
use audioscribe_core::transcription::infrastructure::gemini_transcriber::GeminiTranscriber;

/// Batch transcription of audio folders into SRT subtitles.
#[derive(Parser)]
#[command(name = "audioscribe")]
struct Cli {
    /// Folder to scan for audio files (prompted for when omitted).
    root: Option<PathBuf>,

    /// Write subtitles under this folder, mirroring the source tree.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Prompt template file sent with every transcription request.
    #[arg(long, default_value = DEFAULT_PROMPT_PATH)]
    prompt: PathBuf,

    /// Number of files to process at once.
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Leave existing subtitle files alone instead of overwriting them.
    #[arg(long)]
    skip_existing: bool,

    /// Seconds to pause between files in sequential mode.
    #[arg(long, default_value_t = DEFAULT_FILE_DELAY_SECS)]
    delay_secs: u64,

    /// Upload size ceiling in MB (overrides the environment setting).
    #[arg(long, value_name = "MB")]
    max_file_mb: Option<u64>,

    /// Reprocess the files recorded in a failure ledger instead of scanning.
    #[arg(long, value_name = "LEDGER")]
    retry: Option<PathBuf>,

    /// Re-number and re-space existing .srt files (no transcription).
    #[arg(long, value_name = "PATH")]
    normalize: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    validate(&cli)?;

    if let Some(target) = &cli.normalize {
        return run_normalize(target);
    }

    let mut settings = Settings::load(&cli.prompt)?;
    if let Some(mb) = cli.max_file_mb {
        settings.max_file_bytes = mb * 1024 * 1024;
    }
    log::info!(
        "using model {} with {} API key(s)",
        settings.model,
        settings.api_keys.len()
    );

    let transcriber = GeminiTranscriber::new(&settings)?;
    let options = BatchOptions {
        output_root: cli.output_dir.clone(),
        overwrite: if cli.skip_existing {
            OverwritePolicy::Skip
        } else {
            OverwritePolicy::Overwrite
        },
        workers: cli.jobs,
        file_delay: Duration::from_secs(cli.delay_secs),
        output_extension: settings.output_extension.clone(),
    };
    let mut use_case =
        TranscribeFolderUseCase::new(Box::new(transcriber), Box::new(LogBatchReporter), options);

    let (root, summary) = if let Some(ledger_path) = &cli.retry {
        run_retry(&mut use_case, ledger_path)?
    } else {
        let root = match cli.root {
            Some(root) => root,
            None => prompt_for_folder()?,
        };
        let summary = use_case.execute(&root)?;
        (root, summary)
    };

    if let Some(ledger) = FailureLedger::from_summary(&root, &summary) {
        let path = failure_ledger::save(&ledger, &failure_ledger::default_dir())?;
        log::info!("failure ledger written to {}", path.display());
        log::info!("rerun with --retry {} to reprocess", path.display());
    }

    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.jobs == 0 {
        return Err("--jobs must be at least 1".into());
    }
    if cli.max_file_mb == Some(0) {
        return Err("--max-file-mb must be at least 1".into());
    }
    if cli.retry.is_some() && cli.root.is_some() {
        return Err("ROOT and --retry are mutually exclusive".into());
    }
    if cli.normalize.is_some() && (cli.retry.is_some() || cli.root.is_some()) {
        return Err("--normalize cannot be combined with ROOT or --retry".into());
    }
    Ok(())
}

/// Single interactive prompt for the batch root, looping until the answer
/// names an existing folder.
fn prompt_for_folder() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    loop {
        print!("Audio folder path: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            return Err("no folder path provided".into());
        }
        let answer = line.trim();
        if answer.is_empty() {
            eprintln!("Folder path cannot be empty");
            continue;
        }
        let path = PathBuf::from(answer);
        if !path.exists() {
            eprintln!("Folder not found: {}", path.display());
            continue;
        }
        if !path.is_dir() {
            eprintln!("Not a folder: {}", path.display());
            continue;
        }
        return Ok(path);
    }
}

/// Reprocess the files recorded in a failure ledger.
fn run_retry(
    use_case: &mut TranscribeFolderUseCase,
    ledger_path: &Path,
) -> Result<(PathBuf, BatchSummary), Box<dyn std::error::Error>> {
    let ledger = failure_ledger::load(ledger_path)?;
    let root = PathBuf::from(&ledger.source_folder);

    let mut files = Vec::new();
    for record in &ledger.failed_files {
        let path = PathBuf::from(&record.full_path);
        if !path.exists() {
            log::warn!("recorded file no longer exists: {}", path.display());
            continue;
        }
        match AudioFile::from_path(&path) {
            Some(file) => files.push(file),
            None => log::warn!("not a supported audio file: {}", path.display()),
        }
    }

    log::info!(
        "retrying {} of {} file(s) from {}",
        files.len(),
        ledger.total_failed,
        ledger_path.display()
    );
    let summary = use_case.execute_files(&root, files);
    Ok((root, summary))
}

/// Rewrite `.srt` files as parse → renumber → format. Accepts a single file
/// or a directory tree.
fn run_normalize(target: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut files = Vec::new();
    collect_srt_files(target, &mut files)?;
    if files.is_empty() {
        log::info!("no .srt files found under {}", target.display());
        return Ok(());
    }

    let mut rewritten = 0usize;
    for path in &files {
        match normalize_file(path) {
            Ok(true) => {
                rewritten += 1;
                log::info!("normalized {}", path.display());
            }
            Ok(false) => {}
            Err(e) => log::warn!("failed to normalize {}: {e}", path.display()),
        }
    }
    log::info!("normalized {rewritten} of {} subtitle file(s)", files.len());
    Ok(())
}

fn collect_srt_files(
    target: &Path,
    files: &mut Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if target.is_file() {
        if target.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("srt")) {
            files.push(target.to_path_buf());
            return Ok(());
        }
        return Err(format!("not an .srt file: {}", target.display()).into());
    }
    if !target.is_dir() {
        return Err(format!("path not found: {}", target.display()).into());
    }
    for entry in std::fs::read_dir(target)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_srt_files(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("srt")) {
            files.push(path);
        }
    }
    Ok(())
}

/// Returns true when the file changed on disk.
fn normalize_file(path: &Path) -> Result<bool, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    match srt_parser::normalize(&text) {
        Some(normalized) if normalized != text => {
            std::fs::write(path, normalized)?;
            Ok(true)
        }
        Some(_) => Ok(false),
        None => {
            log::warn!("no readable cues in {}", path.display());
            Ok(false)
        }
    }
}
