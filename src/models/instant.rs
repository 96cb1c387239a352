use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, SubsecRound, Utc};

use crate::error::{JournalError, Result};

/// Storage form of every timestamp: fixed-width UTC with millisecond precision,
/// so lexical order equals chronological order.
pub const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Which end of the day a bare `YYYY-MM-DD` date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayBound {
    Start,
    End,
}

/// Current time truncated to the stored precision.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}

/// Parse an RFC 3339 instant, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC),
/// or a bare `YYYY-MM-DD` date expanded according to `bound`.
pub fn parse_instant(input: &str, bound: DayBound) -> Result<DateTime<Utc>> {
    let s = input.trim();
    if s.is_empty() {
        return Err(JournalError::InvalidArgument("empty date".into()));
    }

    let parsed = if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        dt.with_timezone(&Utc)
    } else if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        naive.and_utc()
    } else if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let time = match bound {
            DayBound::Start => day.and_hms_milli_opt(0, 0, 0, 0),
            DayBound::End => day.and_hms_milli_opt(23, 59, 59, 999),
        };
        time.map(|t| t.and_utc())
            .ok_or_else(|| JournalError::InvalidArgument(format!("invalid date: {s}")))?
    } else {
        return Err(JournalError::InvalidArgument(format!("invalid date: {s}")));
    };

    if !(0..=9999).contains(&parsed.year()) {
        return Err(JournalError::InvalidArgument(format!(
            "date out of range: {s}"
        )));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_date_expands_to_day_bounds() {
        let start = parse_instant("2024-03-01", DayBound::Start).unwrap();
        let end = parse_instant("2024-03-01", DayBound::End).unwrap();
        assert_eq!(format_instant(&start), "2024-03-01T00:00:00.000Z");
        assert_eq!(format_instant(&end), "2024-03-01T23:59:59.999Z");
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let t = parse_instant("2024-03-01T02:30:00+02:00", DayBound::Start).unwrap();
        assert_eq!(format_instant(&t), "2024-03-01T00:30:00.000Z");
    }

    #[test]
    fn naive_datetime_is_read_as_utc() {
        let t = parse_instant("2024-03-01T09:15:00", DayBound::End).unwrap();
        assert_eq!(format_instant(&t), "2024-03-01T09:15:00.000Z");
    }

    #[test]
    fn garbage_is_rejected() {
        for bad in ["", "  ", "yesterday", "2024-13-01", "2024-02-30", "03/01/2024"] {
            let err = parse_instant(bad, DayBound::Start).unwrap_err();
            assert!(matches!(err, JournalError::InvalidArgument(_)), "{bad}");
        }
    }

    #[test]
    fn stored_form_sorts_chronologically() {
        let a = format_instant(&parse_instant("2023-12-31T23:59:59Z", DayBound::Start).unwrap());
        let b = format_instant(&parse_instant("2024-01-01T00:00:00Z", DayBound::Start).unwrap());
        assert!(a < b);
    }
}
