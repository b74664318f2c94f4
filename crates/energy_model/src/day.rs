use chrono::{DateTime, NaiveDateTime, TimeZone};

use crate::ModelError;

/// Interprets `naive` as wall-clock time in `tz`.
///
/// Ambiguous times (clocks turned back) resolve to the earlier instant. Times
/// skipped by a clock change are reported as errors.
fn at_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Result<DateTime<Tz>, ModelError> {
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or(ModelError::NonexistentLocalTime(naive))
}

/// Moves `instant` to 23:59:59.999 of its own calendar day in its time zone.
pub fn end_of_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> Result<DateTime<Tz>, ModelError> {
    let date = instant.date_naive();
    let naive = date
        .and_hms_milli_opt(23, 59, 59, 999)
        .ok_or(ModelError::OutOfRange(date))?;
    at_local(&instant.timezone(), naive)
}

/// Same wall-clock time on the previous calendar day.
pub fn previous_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> Result<DateTime<Tz>, ModelError> {
    let date = instant.date_naive();
    let prev = date.pred_opt().ok_or(ModelError::OutOfRange(date))?;
    at_local(&instant.timezone(), prev.and_time(instant.time()))
}

/// `YYYY-MM-DD` of the instant's local calendar day.
pub fn format_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> String {
    instant.date_naive().format("%Y-%m-%d").to_string()
}
