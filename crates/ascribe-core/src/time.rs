//! Ascription timestamps.
//!
//! Timestamps are written as `YYYY-MM-DD HH:MM:SS±HHMM`. Parsing is more
//! forgiving so that users can write shorter forms in selector arguments:
//! seconds, offset, time, day and month may be left out, in that order.
//! Missing parts default to the start of the period, offset to UTC.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, SubsecRound, TimeZone};
use regex::{Captures, Regex};

use crate::errors::{CoreError, Result};

/// A timestamp with its original UTC offset.
pub type Timestamp = DateTime<FixedOffset>;

/// Layout used when writing ascription lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%z";

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^ *(?P<y>\d+)-(?P<mo>\d+)-(?P<d>\d+) *(?P<h>\d+):(?P<mi>\d+):(?P<s>\d+) *(?P<off>[+-]\d+) *$",
        r"^ *(?P<y>\d+)-(?P<mo>\d+)-(?P<d>\d+) *(?P<h>\d+):(?P<mi>\d+) *(?P<off>[+-]\d+) *$",
        r"^ *(?P<y>\d+)-(?P<mo>\d+)-(?P<d>\d+) *(?P<h>\d+):(?P<mi>\d+):(?P<s>\d+) *$",
        r"^ *(?P<y>\d+)-(?P<mo>\d+)-(?P<d>\d+) *(?P<h>\d+):(?P<mi>\d+) *$",
        r"^ *(?P<y>\d+)-(?P<mo>\d+)-(?P<d>\d+) *$",
        r"^ *(?P<y>\d+)-(?P<mo>\d+) *$",
        r"^ *(?P<y>\d+) *$",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Format a timestamp for an ascription line.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Current local time, truncated to whole seconds.
pub fn now() -> Timestamp {
    Local::now().fixed_offset().trunc_subsecs(0)
}

/// Parse a full or abbreviated timestamp.
pub fn parse_timestamp(input: &str) -> Result<Timestamp> {
    let caps = DATE_PATTERNS
        .iter()
        .find_map(|re| re.captures(input))
        .ok_or_else(|| CoreError::Timestamp(input.to_owned()))?;
    build(input, &caps)
}

fn build(input: &str, caps: &Captures<'_>) -> Result<Timestamp> {
    let range_err = || CoreError::TimestampRange(input.to_owned());
    let num = |name: &str, default: u32| -> Result<u32> {
        match caps.name(name) {
            Some(m) => m.as_str().parse().map_err(|_| range_err()),
            None => Ok(default),
        }
    };

    let year = i32::try_from(num("y", 1)?).map_err(|_| range_err())?;
    let (month, day) = (num("mo", 1)?, num("d", 1)?);
    let (hour, minute, second) = (num("h", 0)?, num("mi", 0)?, num("s", 0)?);
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .ok_or_else(range_err)?;

    let offset_secs = match caps.name("off") {
        Some(m) => {
            let raw = m.as_str();
            let sign = if raw.starts_with('-') { -1 } else { 1 };
            let hhmm: i32 = raw[1..].parse().map_err(|_| range_err())?;
            (hhmm / 100)
                .checked_mul(3600)
                .and_then(|h| h.checked_add((hhmm % 100) * 60))
                .map(|secs| sign * secs)
                .ok_or_else(range_err)?
        }
        None => 0,
    };
    let offset = FixedOffset::east_opt(offset_secs).ok_or_else(range_err)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(range_err)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Datelike, Timelike};

    use super::*;

    #[test]
    fn full_form_round_trips() {
        let ts = parse_timestamp("2024-03-05 14:07:09+0130").unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-05 14:07:09+0130");
        assert_eq!(ts.offset().local_minus_utc(), 90 * 60);
    }

    #[test]
    fn negative_offset() {
        let ts = parse_timestamp("2024-03-05 14:07:09-0130").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -90 * 60);
        assert_eq!(format_timestamp(&ts), "2024-03-05 14:07:09-0130");
    }

    #[test]
    fn without_seconds() {
        let ts = parse_timestamp("2024-03-05 14:07+0000").unwrap();
        assert_eq!(ts.second(), 0);
        assert_eq!(ts.minute(), 7);
    }

    #[test]
    fn without_offset_is_utc() {
        let ts = parse_timestamp("2024-03-05 14:07:09").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
    }

    #[test]
    fn date_only_and_shorter() {
        let ts = parse_timestamp("2024-03-05").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2024, 3, 5, 0));
        let ts = parse_timestamp("2024-03").unwrap();
        assert_eq!((ts.month(), ts.day()), (3, 1));
        let ts = parse_timestamp(" 2024 ").unwrap();
        assert_eq!((ts.year(), ts.month()), (2024, 1));
    }

    #[test]
    fn oversized_offset_is_out_of_range() {
        assert_matches!(
            parse_timestamp("2024-01-01 10:00:00+999999999"),
            Err(CoreError::TimestampRange(_))
        );
        assert_matches!(
            parse_timestamp("2024-01-01 10:00:00-2400"),
            Err(CoreError::TimestampRange(_))
        );
        assert_matches!(
            parse_timestamp("2024-01-01 10:00:00+99999999999"),
            Err(CoreError::TimestampRange(_))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_matches!(parse_timestamp("yesterday"), Err(CoreError::Timestamp(_)));
        assert_matches!(parse_timestamp(""), Err(CoreError::Timestamp(_)));
    }

    #[test]
    fn impossible_date_is_range_error() {
        assert_matches!(
            parse_timestamp("2024-13-45 10:00:00+0000"),
            Err(CoreError::TimestampRange(_))
        );
    }

    #[test]
    fn ordering_respects_offsets() {
        let a = parse_timestamp("2024-01-01 12:00:00+0200").unwrap();
        let b = parse_timestamp("2024-01-01 11:00:00+0000").unwrap();
        assert!(a < b);
    }

    #[test]
    fn now_has_no_subseconds() {
        assert_eq!(now().nanosecond(), 0);
    }
}
