//! Time formatting helpers.

const MINUTE: u64 = 60;
const HOUR: u64 = 3_600;
const DAY: u64 = 86_400;

/// Largest whole unit among days, hours and minutes: `"1d"`, `"3h"`, `"50m"`.
///
/// No seconds granularity: anything under a minute reads `"0m"`.
pub fn format_remaining(secs: u64) -> String {
    if secs >= DAY {
        format!("{}d", secs / DAY)
    } else if secs >= HOUR {
        format!("{}h", secs / HOUR)
    } else {
        format!("{}m", secs / MINUTE)
    }
}

/// Age label for something that happened `secs` ago: `"2h ago"`.
pub fn format_age(secs: u64) -> String {
    if secs < MINUTE {
        "just now".to_string()
    } else {
        format!("{} ago", format_remaining(secs))
    }
}
