use std::time::Duration;

/// Render a duration as an SRT timecode: `HH:MM:SS,mmm`.
pub fn format_timecode(t: Duration) -> String {
    let ms = t.as_millis() as u64;
    let hours = ms / 3_600_000;
    let mins = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1_000;
    let millis = ms % 1_000;
    format!("{hours:02}:{mins:02}:{secs:02},{millis:03}")
}

/// Parse an `HH:MM:SS,mmm` timecode.
///
/// Accepts `.` as well as `,` before the milliseconds (the remote model
/// emits both) and treats the fractional part as a decimal, so `1.5`
/// seconds means 500 ms.
pub fn parse_timecode(text: &str) -> Option<Duration> {
    let mut fields = text.trim().split(':');
    let hours: u64 = fields.next()?.trim().parse().ok()?;
    let mins: u64 = fields.next()?.trim().parse().ok()?;
    let seconds_field = fields.next()?.trim();
    if fields.next().is_some() {
        return None;
    }

    let (secs_text, fraction_text) = match seconds_field.split_once([',', '.']) {
        Some((s, f)) => (s, f.trim()),
        None => (seconds_field, ""),
    };
    let secs: u64 = secs_text.trim().parse().ok()?;

    let millis: u64 = if fraction_text.is_empty() {
        0
    } else {
        let digits: String = fraction_text.chars().take_while(|c| c.is_ascii_digit()).collect();
        if digits.is_empty() {
            return None;
        }
        // pad or cut to millisecond precision
        format!("{digits:0<3}")[..3].parse().ok()?
    };

    Some(Duration::from_millis(
        hours * 3_600_000 + mins * 60_000 + secs * 1_000 + millis,
    ))
}
