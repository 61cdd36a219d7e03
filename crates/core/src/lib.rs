//! Batch transcription of audio directory trees into SRT subtitles.
//!
//! The pipeline walks a root folder for audio files, transcribes each one
//! through a remote speech-to-text service, and writes the resulting
//! subtitle file beside the source (or mirrored under an output root).

pub mod config;
pub mod pipeline;
pub mod scan;
pub mod shared;
pub mod subtitle;
pub mod transcription;
