use std::time::Duration;

use crate::transcription::domain::transcript::TranscriptSegment;

/// One timed subtitle entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleCue {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

/// An ordered set of cues ready for rendering.
///
/// Indices are assigned here: 1-based and strictly sequential, whatever
/// numbering (or gaps) the source material carried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleDocument {
    pub cues: Vec<SubtitleCue>,
}

impl SubtitleDocument {
    pub fn from_segments(segments: &[TranscriptSegment]) -> Self {
        let cues = segments
            .iter()
            .enumerate()
            .map(|(i, seg)| SubtitleCue {
                index: i + 1,
                start: seg.start,
                end: seg.end,
                text: seg.text.clone(),
            })
            .collect();
        Self { cues }
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}
