//! Lenient SRT reading.
//!
//! The usual input is model output, which takes liberties with the format:
//! markdown fences around the whole document, missing blank lines, `.` as
//! the millisecond separator, or positioning hints after the end timestamp.

use std::time::Duration;

use crate::shared::timecode::parse_timecode;
use crate::transcription::domain::transcript::TranscriptSegment;

use super::srt_formatter;

/// Read SRT-shaped text into ordered segments.
///
/// Cue numbering in the input is ignored (rendering renumbers). Cues whose
/// timestamps do not parse, that run backwards, or that carry no text are
/// dropped.
pub fn parse(text: &str) -> Vec<TranscriptSegment> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with("```"))
        .collect();

    let mut segments = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some((start, end)) = parse_timing_line(lines[i]) else {
            i += 1;
            continue;
        };
        i += 1;

        let mut text_lines: Vec<&str> = Vec::new();
        while i < lines.len() {
            let line = lines[i];
            if line.is_empty() || parse_timing_line(line).is_some() {
                break;
            }
            // a bare number directly before a timing line is the next cue's
            // index, not cue text
            if is_index_line(line)
                && lines
                    .get(i + 1)
                    .is_some_and(|next| parse_timing_line(next).is_some())
            {
                break;
            }
            text_lines.push(line);
            i += 1;
        }

        let cue_text = text_lines.join("\n");
        if !cue_text.is_empty() && end >= start {
            segments.push(TranscriptSegment {
                text: cue_text,
                start,
                end,
            });
        }
    }
    segments
}

/// Re-number and re-space SRT text; `None` when no cues could be read.
pub fn normalize(text: &str) -> Option<String> {
    let segments = parse(text);
    if segments.is_empty() {
        return None;
    }
    Some(srt_formatter::render_segments(&segments))
}

fn is_index_line(line: &str) -> bool {
    !line.is_empty() && line.bytes().all(|b| b.is_ascii_digit())
}

fn parse_timing_line(line: &str) -> Option<(Duration, Duration)> {
    let (lhs, rhs) = line.split_once("-->")?;
    let start = parse_timecode(lhs)?;
    // anything after the end timecode (SRT positioning hints) is ignored
    let end = parse_timecode(rhs.trim().split_whitespace().next()?)?;
    Some((start, end))
}
