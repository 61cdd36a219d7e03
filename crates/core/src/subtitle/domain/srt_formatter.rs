//! SRT (SubRip) rendering.

use crate::shared::timecode::format_timecode;
use crate::transcription::domain::transcript::TranscriptSegment;

use super::cue::SubtitleDocument;

/// Render a document as SRT text: index line, `start --> end` line, text
/// line(s), blank separator line per cue. `\n` line endings, UTF-8.
pub fn render(document: &SubtitleDocument) -> String {
    let mut out = String::new();
    for cue in &document.cues {
        out.push_str(&cue.index.to_string());
        out.push('\n');
        out.push_str(&format_timecode(cue.start));
        out.push_str(" --> ");
        out.push_str(&format_timecode(cue.end));
        out.push('\n');
        out.push_str(&cue.text);
        out.push('\n');
        out.push('\n');
    }
    out
}

/// Segments straight to SRT text, renumbering from 1.
pub fn render_segments(segments: &[TranscriptSegment]) -> String {
    render(&SubtitleDocument::from_segments(segments))
}
