/// Format a number of whole seconds as a mm:ss countdown string.
/// Values past 99 minutes keep growing the minute field.
pub fn format_mm_ss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Length of the answer after trimming surrounding whitespace, in chars.
/// This is the length the manual-submit validation is measured against.
pub fn trimmed_len(text: &str) -> usize {
    text.trim().chars().count()
}

/// Round a duration to whole seconds the way the metrics are reported.
pub fn round_secs(d: std::time::Duration) -> u64 {
    (d.as_millis() as f64 / 1000.0).round() as u64
}
