//! Display formats for dates, times and durations.

use chrono::NaiveDateTime;

/// Row date, e.g. `01 Jan`.
pub const DATE_FORMAT: &str = "%d %b";
/// Row clock time.
pub const TIME_FORMAT: &str = "%H:%M";
/// Editor time inputs, e.g. `01/01/24 10:00`.
pub const EDIT_DATE_FORMAT: &str = "%d/%m/%y %H:%M";

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

pub fn format_day(value: Option<NaiveDateTime>) -> String {
    value
        .map(|value| value.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn format_time(value: Option<NaiveDateTime>) -> String {
    value
        .map(|value| value.format(TIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn format_edit_time(value: Option<NaiveDateTime>) -> String {
    value
        .map(|value| value.format(EDIT_DATE_FORMAT).to_string())
        .unwrap_or_default()
}

/// Parses an editor time input; blank input clears the value.
pub fn parse_edit_time(value: &str) -> Result<Option<NaiveDateTime>, chrono::ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDateTime::parse_from_str(trimmed, EDIT_DATE_FORMAT).map(Some)
}

/// Event length as `01D 02H 30M`, dropping leading zero units.
///
/// Empty when either bound is missing.
pub fn format_duration(from: Option<NaiveDateTime>, to: Option<NaiveDateTime>) -> String {
    let (Some(from), Some(to)) = (from, to) else {
        return String::new();
    };
    let minutes = (to - from).num_minutes().max(0);
    let days = minutes / MINUTES_PER_DAY;
    let hours = minutes % MINUTES_PER_DAY / MINUTES_PER_HOUR;
    let rest = minutes % MINUTES_PER_HOUR;

    if days > 0 {
        format!("{days:02}D {hours:02}H {rest:02}M")
    } else if hours > 0 {
        format!("{hours:02}H {rest:02}M")
    } else {
        format!("{rest:02}M")
    }
}
