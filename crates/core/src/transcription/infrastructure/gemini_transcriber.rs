use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde_json::{json, Value};

use crate::config::settings::Settings;
use crate::scan::domain::audio_file::AudioFile;
use crate::shared::constants::{
    FILE_PROCESSING_BUDGET_SECS, GENERATE_TIMEOUT_SECS, POLL_INTERVAL_SECS, POLL_TIMEOUT_SECS,
    RECOMMENDED_MAX_FILE_BYTES, RETRY_BACKOFF_SECS, TRANSPORT_RETRIES, UPLOAD_TIMEOUT_SECS,
};
use crate::subtitle::domain::srt_parser;
use crate::transcription::domain::transcriber::{TranscribeError, Transcriber};
use crate::transcription::domain::transcript::TranscriptSegment;

use super::key_pool::{EmptyKeyPool, KeyPool};

const API_KEY_HEADER: &str = "X-goog-api-key";

/// Remote transcription adapter for the Gemini generative-language API.
///
/// One file is transcribed in three exchanges: a multipart upload, a state
/// poll until the service has ingested the audio, and a generateContent
/// call carrying the prompt plus a reference to the uploaded file. The
/// model is prompted to answer in SRT form, which parses into segments.
pub struct GeminiTranscriber {
    http: reqwest::blocking::Client,
    base_url: String,
    model: String,
    prompt: String,
    keys: KeyPool,
    max_file_bytes: u64,
}

impl GeminiTranscriber {
    pub fn new(settings: &Settings) -> Result<Self, EmptyKeyPool> {
        Ok(Self {
            http: reqwest::blocking::Client::new(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            prompt: settings.prompt.clone(),
            keys: KeyPool::new(settings.api_keys.clone())?,
            max_file_bytes: settings.max_file_bytes,
        })
    }

    /// Upload the audio bytes; returns the service-side `(uri, name)` pair.
    fn upload(&self, file: &AudioFile, bytes: &[u8]) -> Result<(String, String), TranscribeError> {
        let url = format!("{}/upload/v1beta/files", self.base_url);
        let file_name = file
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio")
            .to_string();
        let metadata = json!({ "file": { "display_name": file_name } }).to_string();

        with_transport_retry("upload", || {
            // the form is consumed by send, so each attempt rebuilds it
            let data = reqwest::blocking::multipart::Part::bytes(bytes.to_vec())
                .file_name(file_name.clone())
                .mime_str(file.format().mime_type())
                .map_err(transport)?;
            let form = reqwest::blocking::multipart::Form::new()
                .part(
                    "metadata",
                    reqwest::blocking::multipart::Part::text(metadata.clone())
                        .mime_str("application/json")
                        .map_err(transport)?,
                )
                .part("data", data);

            let key = self.keys.lease();
            let response = self
                .http
                .post(&url)
                .header(API_KEY_HEADER, &*key)
                .multipart(form)
                .timeout(Duration::from_secs(UPLOAD_TIMEOUT_SECS))
                .send()
                .map_err(transport)?;

            let status = response.status();
            let body = response.text().map_err(transport)?;
            if !status.is_success() {
                return Err(TranscribeError::Upstream(format!(
                    "upload failed with {status}: {body}"
                )));
            }
            let parsed: Value = serde_json::from_str(&body).map_err(|e| {
                TranscribeError::Upstream(format!("malformed upload response: {e}"))
            })?;
            let uri = parsed.pointer("/file/uri").and_then(Value::as_str);
            let name = parsed.pointer("/file/name").and_then(Value::as_str);
            match (uri, name) {
                (Some(uri), Some(name)) => Ok((uri.to_string(), name.to_string())),
                _ => Err(TranscribeError::Upstream(
                    "upload response missing file uri/name".to_string(),
                )),
            }
        })
    }

    /// Poll the uploaded file until the service reports it `ACTIVE`.
    ///
    /// Transient poll failures are tolerated until the processing budget
    /// runs out; a `FAILED` state from the service ends the wait early.
    fn wait_until_active(&self, file_name: &str) -> Result<(), TranscribeError> {
        let url = format!("{}/v1beta/{file_name}", self.base_url);
        let deadline = Instant::now() + Duration::from_secs(FILE_PROCESSING_BUDGET_SECS);
        // one lease across the whole poll loop, like a status-check session
        let key = self.keys.lease();

        loop {
            let result = self
                .http
                .get(&url)
                .header(API_KEY_HEADER, &*key)
                .timeout(Duration::from_secs(POLL_TIMEOUT_SECS))
                .send();
            match result {
                Ok(response) if response.status().is_success() => {
                    let info: Value = response.json().map_err(|e| {
                        TranscribeError::Upstream(format!("malformed file status: {e}"))
                    })?;
                    match info.get("state").and_then(Value::as_str).unwrap_or("UNKNOWN") {
                        "ACTIVE" => return Ok(()),
                        "FAILED" => {
                            return Err(TranscribeError::Upstream(format!(
                                "service failed to process uploaded file {file_name}"
                            )))
                        }
                        state => debug!("file {file_name} still {state}"),
                    }
                }
                Ok(response) => warn!("file status check failed with {}", response.status()),
                Err(e) => warn!("file status check transport failure: {e}"),
            }
            if Instant::now() >= deadline {
                return Err(TranscribeError::Upstream(format!(
                    "file {file_name} not ready after {FILE_PROCESSING_BUDGET_SECS}s"
                )));
            }
            thread::sleep(Duration::from_secs(POLL_INTERVAL_SECS));
        }
    }

    /// Ask the model for the transcript of an uploaded file.
    fn generate(&self, file_uri: &str, mime_type: &str) -> Result<String, TranscribeError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": self.prompt },
                    { "file_data": { "file_uri": file_uri, "mime_type": mime_type } },
                ]
            }]
        });

        with_transport_retry("generate", || {
            let key = self.keys.lease();
            let response = self
                .http
                .post(&url)
                .header(API_KEY_HEADER, &*key)
                .json(&body)
                .timeout(Duration::from_secs(GENERATE_TIMEOUT_SECS))
                .send()
                .map_err(transport)?;

            let status = response.status();
            let text = response.text().map_err(transport)?;
            if !status.is_success() {
                return Err(TranscribeError::Upstream(format!(
                    "transcription request failed with {status}: {text}"
                )));
            }
            let parsed: Value = serde_json::from_str(&text).map_err(|e| {
                TranscribeError::Upstream(format!("malformed transcription response: {e}"))
            })?;
            parsed
                .pointer("/candidates/0/content/parts/0/text")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| {
                    TranscribeError::Upstream("transcription returned an empty result".to_string())
                })
        })
    }
}

impl Transcriber for GeminiTranscriber {
    fn transcribe(&self, file: &AudioFile) -> Result<Vec<TranscriptSegment>, TranscribeError> {
        let path = file.path();
        let size = fs::metadata(path)
            .map_err(|source| TranscribeError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        if size > self.max_file_bytes {
            return Err(TranscribeError::SizeExceeded {
                path: path.to_path_buf(),
                size,
                limit: self.max_file_bytes,
            });
        }
        if size > RECOMMENDED_MAX_FILE_BYTES {
            warn!(
                "{} is {:.1} MB; uploads above {} MB are slow and may time out",
                path.display(),
                size as f64 / (1024.0 * 1024.0),
                RECOMMENDED_MAX_FILE_BYTES / (1024 * 1024)
            );
        }

        let bytes = fs::read(path).map_err(|source| TranscribeError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        debug!("uploading {} ({size} bytes)", path.display());
        let (file_uri, file_name) = self.upload(file, &bytes)?;
        self.wait_until_active(&file_name)?;

        debug!("transcribing {}", path.display());
        let raw = self.generate(&file_uri, file.format().mime_type())?;

        let segments = srt_parser::parse(&raw);
        if segments.is_empty() {
            return Err(TranscribeError::Upstream(
                "transcript contained no readable cues".to_string(),
            ));
        }
        Ok(segments)
    }
}

fn transport(e: reqwest::Error) -> TranscribeError {
    TranscribeError::Transport(e.to_string())
}

/// Re-run `attempt` after transient transport failures, with linear backoff.
/// Upstream failures pass through untouched.
fn with_transport_retry<T>(
    op: &str,
    mut attempt: impl FnMut() -> Result<T, TranscribeError>,
) -> Result<T, TranscribeError> {
    retry_with_backoff(
        op,
        TRANSPORT_RETRIES,
        Duration::from_secs(RETRY_BACKOFF_SECS),
        &mut attempt,
    )
}

fn retry_with_backoff<T>(
    op: &str,
    retries: u32,
    backoff: Duration,
    attempt: &mut impl FnMut() -> Result<T, TranscribeError>,
) -> Result<T, TranscribeError> {
    let mut failures = 0;
    loop {
        match attempt() {
            Err(TranscribeError::Transport(detail)) if failures < retries => {
                failures += 1;
                warn!("{op} transport failure (retry {failures}/{retries}): {detail}");
                thread::sleep(backoff * failures);
            }
            other => return other,
        }
    }
}
