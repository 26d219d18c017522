use chrono::{DateTime, Utc};

/// Render `instant` as `HH:MM:SS` followed by `today`, `yesterday` or the
/// date (`DD/MM/YYYY`), relative to `now`.
pub fn format_timestamp(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let time = instant.format("%H:%M:%S");

    let date = instant.date_naive();
    let today = now.date_naive();

    if date == today {
        format!("{} today", time)
    } else if today.pred_opt() == Some(date) {
        format!("{} yesterday", time)
    } else {
        format!("{} {}", time, date.format("%d/%m/%Y"))
    }
}
