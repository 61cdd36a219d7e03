pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_PROMPT_PATH: &str = "config/default_prompt.txt";

pub const SUBTITLE_EXTENSION: &str = "srt";

/// Hard upload ceiling; larger files never reach the network.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 100 * 1024 * 1024;
/// Uploads above this get slow and flaky, so the client warns.
pub const RECOMMENDED_MAX_FILE_BYTES: u64 = 20 * 1024 * 1024;

pub const UPLOAD_TIMEOUT_SECS: u64 = 120;
pub const GENERATE_TIMEOUT_SECS: u64 = 300;

/// Per-request timeout while polling the uploaded file's state.
pub const POLL_TIMEOUT_SECS: u64 = 30;
pub const POLL_INTERVAL_SECS: u64 = 10;
/// Total budget for the service to finish ingesting an upload.
pub const FILE_PROCESSING_BUDGET_SECS: u64 = 300;

pub const TRANSPORT_RETRIES: u32 = 2;
pub const RETRY_BACKOFF_SECS: u64 = 2;

/// Pause between files in sequential mode (the service rate-limits bursts).
pub const DEFAULT_FILE_DELAY_SECS: u64 = 5;

pub const FAILED_FILES_DIR: &str = "failed_files";
