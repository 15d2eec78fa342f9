//! Display formatting contracts for the dashboard. Numbers only; rendering
//! is the front end's business.

/// Human-readable reading time: "45s" under a minute, "12m 30s" under an
/// hour, "2h 5m" from an hour up.
pub fn format_reading_time(total_seconds: u64) -> String {
    if total_seconds < 60 {
        return format!("{}s", total_seconds);
    }
    if total_seconds < 3600 {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        return format!("{}m {}s", minutes, seconds);
    }
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    format!("{}h {}m", hours, minutes)
}

/// Percentage rounded to the nearest whole number and clamped to [0, 100].
pub fn rounded_percent(value: f64) -> u32 {
    value.round().clamp(0.0, 100.0) as u32
}
