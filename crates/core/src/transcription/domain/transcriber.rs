use std::path::PathBuf;

use thiserror::Error;

use super::transcript::TranscriptSegment;
use crate::scan::domain::audio_file::AudioFile;

#[derive(Error, Debug)]
pub enum TranscribeError {
    /// Raised before any network call when the source exceeds the limit.
    #[error("{}: {size} bytes exceeds the {limit}-byte upload limit", .path.display())]
    SizeExceeded { path: PathBuf, size: u64, limit: u64 },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The network exchange could not complete.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The service responded but the result is unusable.
    #[error("service returned an unusable result: {0}")]
    Upstream(String),
}

/// Domain interface for remote speech-to-text transcription.
///
/// One synchronous request-response exchange per file. Implementations must
/// be shareable across worker threads.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self, file: &AudioFile) -> Result<Vec<TranscriptSegment>, TranscribeError>;
}
