//! Conversion between milliseconds and the `H:MM:SS` strings shown to users.

const MS_PER_SECOND: u64 = 1000;

/// Renders `ms` as `H:MM:SS`, or `MM:SS` below one hour.
///
/// Sub-second remainders are truncated.
pub fn format(ms: u64) -> String {
    let total_seconds = ms / MS_PER_SECOND;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Parses a colon-separated duration back into milliseconds.
///
/// Segments are read right to left as seconds, minutes, hours, so `"45"`,
/// `"3:45"` and `"1:03:45"` are all accepted. Anything malformed yields 0:
/// durations are display data and never worth failing over.
pub fn parse(text: &str) -> u64 {
    let mut total: u64 = 0;
    let mut scale: u64 = 1;

    for segment in text.trim().rsplit(':') {
        let Ok(value) = segment.trim().parse::<u64>() else {
            return 0;
        };
        let Some(next) = value.checked_mul(scale).and_then(|v| total.checked_add(v)) else {
            return 0;
        };
        total = next;
        scale = scale.saturating_mul(60);
    }

    total.checked_mul(MS_PER_SECOND).unwrap_or(0)
}
