/// `hh:mm:ss`, signed when the span runs backwards (clock skew).
pub fn format_duration(duration: chrono::Duration) -> String {
    let sign = if duration < chrono::Duration::zero() { "-" } else { "" };
    let secs = duration.num_seconds().unsigned_abs();
    format!("{sign}{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

/// `mm:ss` for rest countdowns.
pub fn format_rest(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Drops a trailing `.0` so whole plates read naturally.
pub fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{:.0}", weight)
    } else {
        format!("{}", weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_and_weights() {
        assert_eq!(format_duration(chrono::Duration::seconds(3725)), "01:02:05");
        assert_eq!(format_duration(chrono::Duration::seconds(-95)), "-00:01:35");
        assert_eq!(format_duration(chrono::Duration::hours(26)), "26:00:00");
        assert_eq!(format_rest(95), "1:35");
        assert_eq!(format_rest(0), "0:00");
        assert_eq!(format_weight(100.0), "100");
        assert_eq!(format_weight(132.5), "132.5");
    }
}
