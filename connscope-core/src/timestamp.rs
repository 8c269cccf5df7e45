use chrono::{DateTime, NaiveDateTime, TimeDelta};
use connscope_common::{ConnScopeError, Result};

/// query instants: `YYYY-MM-DD HH:MM:SS.ffffff`
pub const QUERY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

const LOG_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

const NANOS_PER_SEC: i128 = 1_000_000_000;

/// Parse a query timestamp. The fractional part is mandatory (1 to 6 digits).
pub fn parse_query(input: &str) -> Result<NaiveDateTime> {
    let err = || ConnScopeError::QueryTimestamp {
        input: input.to_owned(),
    };
    let frac_ok = input.rsplit_once('.').is_some_and(|(_, frac)| {
        !frac.is_empty() && frac.len() <= 6 && frac.bytes().all(|b| b.is_ascii_digit())
    });
    if !frac_ok {
        return Err(err());
    }
    NaiveDateTime::parse_from_str(input, QUERY_FORMAT).map_err(|_| err())
}

pub fn parse_queries<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<NaiveDateTime>> {
    inputs.iter().map(|s| parse_query(s.as_ref())).collect()
}

/// `endTs` values: naive date-time (space or `T` separated) or RFC 3339, offsets folded to UTC
pub fn parse_log_instant(value: &str) -> Option<NaiveDateTime> {
    for fmt in LOG_FORMATS {
        if let Ok(t) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(t);
        }
    }
    DateTime::parse_from_rfc3339(value).ok().map(|t| t.naive_utc())
}

/// `timeTaken` seconds to a duration, rounded to the nanosecond
pub fn seconds_to_delta(secs: f64) -> Option<TimeDelta> {
    if !secs.is_finite() {
        return None;
    }
    let nanos = (secs * 1e9).round();
    if nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::nanoseconds(nanos as i64))
}

pub fn format_instant(t: &NaiveDateTime) -> String {
    t.format(DISPLAY_FORMAT).to_string()
}

/// signed `(to - from)` in nanoseconds, without the i64 overflow of `num_nanoseconds`
pub(crate) fn nanos_between(from: NaiveDateTime, to: NaiveDateTime) -> i128 {
    let d = to - from;
    d.num_seconds() as i128 * NANOS_PER_SEC + d.subsec_nanos() as i128
}

/// whole seconds covering `nanos`, rounded towards +inf
pub(crate) fn ceil_seconds(nanos: i128) -> i128 {
    if nanos > 0 {
        (nanos + NANOS_PER_SEC - 1) / NANOS_PER_SEC
    } else {
        nanos / NANOS_PER_SEC // truncation is ceil for non-positive values
    }
}
