use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_MAX_FILE_BYTES, DEFAULT_MODEL, GEMINI_BASE_URL, SUBTITLE_EXTENSION,
};

pub const KEY_VAR: &str = "GEMINI_API_KEY";
/// Every variable with this prefix joins the API-key pool.
pub const KEY_POOL_PREFIX: &str = "API_KEY_";
pub const MODEL_VAR: &str = "GEMINI_MODEL_NAME";
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";
pub const MAX_FILE_MB_VAR: &str = "AUDIOSCRIBE_MAX_FILE_MB";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no API key found: set {KEY_VAR} or at least one {KEY_POOL_PREFIX}* variable")]
    MissingApiKey,
    #[error("prompt file not found: {}", .0.display())]
    PromptMissing(PathBuf),
    #[error("failed to read prompt file {}: {source}", .path.display())]
    PromptUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("prompt file is empty: {}", .0.display())]
    PromptEmpty(PathBuf),
    #[error("invalid {MAX_FILE_MB_VAR} value {value:?}: expected a positive integer")]
    InvalidMaxFileSize { value: String },
}

/// Immutable configuration for one batch run.
///
/// Loaded once at startup and handed to the transcriber constructor;
/// nothing reads the environment after this point.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_keys: Vec<String>,
    pub model: String,
    pub base_url: String,
    /// Prompt template sent verbatim with every transcription request.
    pub prompt: String,
    pub max_file_bytes: u64,
    pub output_extension: String,
}

impl Settings {
    /// Gather credentials from the environment and the prompt template from
    /// the designated file. Any problem here is fatal to the whole run.
    pub fn load(prompt_path: &Path) -> Result<Self, ConfigError> {
        let api_keys = collect_api_keys(std::env::vars());
        if api_keys.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }

        let prompt = read_prompt(prompt_path)?;

        let model = non_empty_var(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base_url = non_empty_var(BASE_URL_VAR)
            .unwrap_or_else(|| GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let max_file_bytes = match non_empty_var(MAX_FILE_MB_VAR) {
            None => DEFAULT_MAX_FILE_BYTES,
            Some(value) => parse_max_file_mb(&value)
                .ok_or(ConfigError::InvalidMaxFileSize { value })?,
        };

        Ok(Self {
            api_keys,
            model,
            base_url,
            prompt,
            max_file_bytes,
            output_extension: SUBTITLE_EXTENSION.to_string(),
        })
    }
}

/// Pool keys come from every `API_KEY_*` variable, sorted by variable name
/// for a stable rotation order, with a plain `GEMINI_API_KEY` first.
fn collect_api_keys(vars: impl Iterator<Item = (String, String)>) -> Vec<String> {
    let mut single = None;
    let mut pool: Vec<(String, String)> = Vec::new();
    for (name, value) in vars {
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        if name == KEY_VAR {
            single = Some(value);
        } else if name.starts_with(KEY_POOL_PREFIX) {
            pool.push((name, value));
        }
    }
    pool.sort_by(|a, b| a.0.cmp(&b.0));

    let mut keys: Vec<String> = Vec::new();
    if let Some(key) = single {
        keys.push(key);
    }
    for (_, key) in pool {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Load the prompt template verbatim; a missing or empty file is an error.
fn read_prompt(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::PromptMissing(path.to_path_buf()));
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::PromptUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(ConfigError::PromptEmpty(path.to_path_buf()));
    }
    Ok(text)
}

fn parse_max_file_mb(value: &str) -> Option<u64> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|mb| *mb > 0)
        .map(|mb| mb * 1024 * 1024)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
