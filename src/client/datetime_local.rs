//! Conversion between stored instants and the local, minute-precision text
//! the edit form works with (`YYYY-MM-DDTHH:MM`, as an HTML `datetime-local`).
//!
//! Callers pass the time zone so the rest of the client never touches `Local`.

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};

pub const INPUT_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateInputError {
    #[error("cannot read {0:?} as a date and time (expected YYYY-MM-DDTHH:MM)")]
    Unparsable(String),
    #[error("{0:?} does not exist in the local time zone")]
    Skipped(String),
}

/// Instant → editable local text. Unset maps to an empty string.
pub fn to_input<Tz: TimeZone>(instant: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match instant {
        Some(instant) => instant.with_timezone(tz).format(INPUT_FORMAT).to_string(),
        None => String::new(),
    }
}

/// Editable local text → instant. Blank input maps to unset.
///
/// A wall-clock time repeated by a DST fall-back resolves to its earlier
/// occurrence; one skipped by spring-forward is rejected.
pub fn from_input<Tz: TimeZone>(input: &str, tz: &Tz) -> Result<Option<DateTime<Utc>>, DateInputError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    let naive = [INPUT_FORMAT, "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| DateInputError::Unparsable(input.to_string()))?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Ok(Some(dt.with_timezone(&Utc))),
        LocalResult::None => Err(DateInputError::Skipped(input.to_string())),
    }
}

/// Serialises an instant the way the store expects it (ISO 8601, UTC, millisecond precision).
pub fn to_wire(instant: Option<DateTime<Utc>>) -> Option<String> {
    instant.map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
}
