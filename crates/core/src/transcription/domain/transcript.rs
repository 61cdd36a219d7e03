use std::time::Duration;

/// One unit of transcribed speech with its time range.
///
/// Segments arrive in chronological order from the remote service; the
/// pipeline preserves that order and never merges or reorders them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSegment {
    pub text: String,
    pub start: Duration,
    pub end: Duration,
}

impl TranscriptSegment {
    pub fn duration(&self) -> Duration {
        self.end.saturating_sub(self.start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_fields() {
        let seg = TranscriptSegment {
            text: "hello".to_string(),
            start: Duration::from_millis(1_000),
            end: Duration::from_millis(1_500),
        };
        assert_eq!(seg.text, "hello");
        assert_eq!(seg.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_duration_saturates_on_equal_times() {
        let seg = TranscriptSegment {
            text: "blip".to_string(),
            start: Duration::from_secs(2),
            end: Duration::from_secs(2),
        };
        assert_eq!(seg.duration(), Duration::ZERO);
    }
}
