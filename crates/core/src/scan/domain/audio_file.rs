use std::fmt;
use std::path::{Path, PathBuf};

/// Audio container formats the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    M4a,
    Flac,
    Ogg,
}

impl AudioFormat {
    pub const ALL: &[AudioFormat] = &[
        AudioFormat::Mp3,
        AudioFormat::Wav,
        AudioFormat::M4a,
        AudioFormat::Flac,
        AudioFormat::Ogg,
    ];

    /// Classify a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "m4a" => Some(AudioFormat::M4a),
            "flac" => Some(AudioFormat::Flac),
            "ogg" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::M4a => "m4a",
            AudioFormat::Flac => "flac",
            AudioFormat::Ogg => "ogg",
        }
    }

    /// MIME type sent with the upload request.
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Flac => "audio/flac",
            AudioFormat::Ogg => "audio/ogg",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A discovered source file. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFile {
    path: PathBuf,
    format: AudioFormat,
}

impl AudioFile {
    /// Classify a path by its extension; `None` when it is not a supported
    /// audio format.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        let format = AudioFormat::from_extension(ext)?;
        Some(Self {
            path: path.to_path_buf(),
            format,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mp3", Some(AudioFormat::Mp3))]
    #[case("MP3", Some(AudioFormat::Mp3))]
    #[case("Wav", Some(AudioFormat::Wav))]
    #[case("m4a", Some(AudioFormat::M4a))]
    #[case("FLAC", Some(AudioFormat::Flac))]
    #[case("ogg", Some(AudioFormat::Ogg))]
    #[case("aac", None)]
    #[case("txt", None)]
    #[case("", None)]
    fn test_format_from_extension(#[case] ext: &str, #[case] expected: Option<AudioFormat>) {
        assert_eq!(AudioFormat::from_extension(ext), expected);
    }

    #[test]
    fn test_from_path_supported() {
        let file = AudioFile::from_path(Path::new("talks/lecture.MP3")).unwrap();
        assert_eq!(file.format(), AudioFormat::Mp3);
        assert_eq!(file.path(), Path::new("talks/lecture.MP3"));
    }

    #[test]
    fn test_from_path_rejects_unsupported() {
        assert!(AudioFile::from_path(Path::new("notes.txt")).is_none());
        assert!(AudioFile::from_path(Path::new("no_extension")).is_none());
    }

    #[test]
    fn test_every_format_has_extension_and_mime() {
        for format in AudioFormat::ALL {
            assert!(!format.extension().is_empty());
            assert!(format.mime_type().starts_with("audio/"));
            assert_eq!(AudioFormat::from_extension(format.extension()), Some(*format));
        }
    }
}
