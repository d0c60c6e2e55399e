//! Calendar helpers.
//!
//! Every stored roster date and attendance day is a *local* calendar date.
//! Timestamps are only converted to a date through [`local_date_of`] with the
//! configured offset, never by slicing the UTC string.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};

/// Parses `+01:00`, `-0530`, `Z` or `UTC` into a fixed offset.
pub fn parse_local_offset(raw: &str) -> Result<FixedOffset, String> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let (sign, rest) = match s.as_bytes()[0] {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return Err(format!("Invalid UTC offset '{}': expected +HH:MM", raw)),
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("Invalid UTC offset '{}': expected +HH:MM", raw));
    }

    let hours: i32 = digits[..2].parse().map_err(|_| format!("Invalid hours in '{}'", raw))?;
    let minutes: i32 = digits[2..].parse().map_err(|_| format!("Invalid minutes in '{}'", raw))?;
    if hours > 14 || minutes > 59 {
        return Err(format!("UTC offset '{}' out of range", raw));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("UTC offset '{}' out of range", raw))
}

/// Local calendar date of a UTC instant.
pub fn local_date_of(ts: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    ts.with_timezone(&offset).date_naive()
}

/// Normalises a stored or requested date into a local calendar date.
///
/// Plain `YYYY-MM-DD` is taken as-is. RFC 3339 timestamps are shifted into
/// `offset` first, so `2025-01-01T23:30:00Z` is `2025-01-02` at `+01:00`.
/// Naive timestamps without a zone are treated as already local.
pub fn normalize_local_date(raw: &str, offset: FixedOffset) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&offset).date_naive());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.date());
        }
    }

    None
}

/// First and last day of a month, `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn offset(raw: &str) -> FixedOffset {
        parse_local_offset(raw).unwrap()
    }

    #[test]
    fn test_parse_local_offset() {
        assert_eq!(offset("+01:00").local_minus_utc(), 3600);
        assert_eq!(offset("-0530").local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(offset("UTC").local_minus_utc(), 0);
        assert_eq!(offset("").local_minus_utc(), 0);
        assert!(parse_local_offset("01:00").is_err());
        assert!(parse_local_offset("+25:00").is_err());
        assert!(parse_local_offset("+1").is_err());
    }

    #[test]
    fn test_plain_date_is_kept() {
        let d = normalize_local_date("2025-11-20", offset("-08:00")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());
    }

    #[test]
    fn test_timestamp_crossing_midnight_moves_to_local_day() {
        let d = normalize_local_date("2025-01-01T23:30:00.000Z", offset("+01:00")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());

        let d = normalize_local_date("2025-01-01T00:30:00Z", offset("-03:00")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
    }

    #[test]
    fn test_naive_timestamp_is_local() {
        let d = normalize_local_date("2025-03-04T23:59:59", offset("+05:00")).unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(normalize_local_date("", offset("Z")).is_none());
        assert!(normalize_local_date("tomorrow", offset("Z")).is_none());
        assert!(normalize_local_date("2025-02-30", offset("Z")).is_none());
    }

    #[test]
    fn test_local_date_of() {
        let ts = Utc.with_ymd_and_hms(2025, 11, 20, 23, 15, 0).unwrap();
        assert_eq!(local_date_of(ts, offset("Z")), NaiveDate::from_ymd_opt(2025, 11, 20).unwrap());
        assert_eq!(local_date_of(ts, offset("+01:00")), NaiveDate::from_ymd_opt(2025, 11, 21).unwrap());
    }

    #[test]
    fn test_month_bounds() {
        let last_day = |y, m| month_bounds(y, m).map(|(_, last)| last);
        assert_eq!(last_day(2025, 11), NaiveDate::from_ymd_opt(2025, 11, 30));
        assert_eq!(last_day(2025, 12), NaiveDate::from_ymd_opt(2025, 12, 31));
        assert_eq!(last_day(2024, 2), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(last_day(2025, 2), NaiveDate::from_ymd_opt(2025, 2, 28));
        assert_eq!(month_bounds(2025, 13), None);
        assert_eq!(month_bounds(2025, 0), None);
    }
}
