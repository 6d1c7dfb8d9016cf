use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use crate::common::boll_exception::{BollException, BollResult, ErrCode};

pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const DATE_FORMAT: &str = "%Y%m%d";

pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Parse a bar time into epoch milliseconds (UTC).
///
/// Accepts a plain integer (already epoch milliseconds), `YYYY-MM-DD HH:MM:SS`
/// or `YYYYMMDD`. An eight digit value is read as a date, not as milliseconds.
pub fn parse_timestamp(time_str: &str) -> BollResult<i64> {
    let s = time_str.trim();

    let datetime = if s.len() == 8 && s.chars().all(|c| c.is_ascii_digit()) {
        let date = NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format_err(s, e))?;
        date.and_time(NaiveTime::MIN)
    } else if let Ok(ms) = s.parse::<i64>() {
        return Ok(ms);
    } else {
        NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).map_err(|e| format_err(s, e))?
    };

    Ok(datetime.and_utc().timestamp_millis())
}

/// Format epoch milliseconds as `YYYY-MM-DD HH:MM:SS`, falling back to the raw
/// number when it is outside chrono's range.
pub fn format_timestamp(ts: i64) -> String {
    match DateTime::from_timestamp_millis(ts) {
        Some(dt) => dt.format(DATETIME_FORMAT).to_string(),
        None => ts.to_string(),
    }
}

fn format_err(s: &str, e: impl std::fmt::Display) -> BollException {
    BollException::new(
        format!("unrecognised time '{}': {}", s, e),
        ErrCode::SrcDataFormatError,
    )
}
