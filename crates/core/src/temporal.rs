use chrono::{Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static TIME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b([0-9]{1,2})(?::([0-9]{2}))?\s*(am|pm)?\b").expect("valid time pattern")
});

const TOMORROW_MARKER: &str = "tomorrow";

/// Finds the first clock time in `text` ("5 pm", "17:30", "9am") and places it
/// on the day of `now`, or on the next day when the text says "tomorrow".
///
/// Only the first time-like substring is used, and only ASCII digits count.
/// Hours without a meridiem are taken as given; values past the end of the
/// day roll forward instead of being rejected.
pub fn extract_datetime_at(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    let lower = text.to_lowercase();

    let base_day = if lower.contains(TOMORROW_MARKER) {
        now.date() + Duration::days(1)
    } else {
        now.date()
    };

    let captures = TIME_PATTERN.captures(&lower)?;
    let mut hour: u32 = captures.get(1)?.as_str().parse().ok()?;
    let minute: u32 = match captures.get(2) {
        Some(value) => value.as_str().parse().ok()?,
        None => 0,
    };

    match captures.get(3).map(|value| value.as_str()) {
        Some("pm") if hour < 12 => hour += 12,
        Some("am") if hour == 12 => hour = 0,
        _ => {}
    }

    at_clock(base_day, hour, minute)
}

fn at_clock(day: NaiveDate, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    let midnight = day.and_hms_opt(0, 0, 0)?;
    Some(midnight + Duration::hours(i64::from(hour)) + Duration::minutes(i64::from(minute)))
}
