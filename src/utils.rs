/// Utility functions for formatting timestamps and intervals
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

/// Format a timestamp as wall-clock time in the given offset
///
/// Produces HH:MM:SS. Falls back to the default string representation if
/// formatting fails.
pub fn format_clock(dt: &OffsetDateTime, offset: UtcOffset) -> String {
    let local = dt.to_offset(offset);
    local
        .format(format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| local.to_string())
}

/// Format an interval between two reports as H:MM:SS
///
/// Negative intervals (clock adjustments) are shown with a leading minus.
pub fn format_interval(duration: Duration) -> String {
    let total = duration.whole_seconds();
    let sign = if total < 0 { "-" } else { "" };
    let total = total.unsigned_abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
