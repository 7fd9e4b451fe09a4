use chrono::{DateTime, Utc};

/// Elapsed share of the `start..end` window at `now`, as a whole percentage.
///
/// Missing bounds yield 0. The clock is never read here; callers pass `now`.
pub fn progress(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u8 {
    let (Some(start), Some(end)) = (start, end) else { return 0 };
    if now <= start {
        return 0;
    }
    if now >= end {
        return 100;
    }
    // start < now < end here, so the window is strictly positive.
    let elapsed = span(now - start);
    let window = span(end - start);
    (elapsed * 100.0 / window).round().clamp(0.0, 100.0) as u8
}

/// Length of a span at the finest precision that fits in an `i64`.
fn span(d: chrono::Duration) -> f64 {
    match d.num_nanoseconds() {
        Some(ns) => ns as f64,
        None => d.num_microseconds().map_or(d.num_milliseconds() as f64 * 1e6, |us| us as f64 * 1e3),
    }
}
