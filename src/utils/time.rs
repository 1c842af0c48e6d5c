use crate::error::{PortalError, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, Utc, Weekday};

/// School-local offset; out-of-range hours fall back to UTC.
pub fn school_offset(utc_offset_hours: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix())
}

pub fn local_date_of(timestamp: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    timestamp.with_timezone(&offset).date_naive()
}

pub fn local_time_of(timestamp: DateTime<Utc>, offset: FixedOffset) -> NaiveTime {
    timestamp.with_timezone(&offset).time()
}

/// Normalises `mon`, `Monday`, `MON` and friends to the stored `Mon` form.
pub fn parse_weekday(raw: &str) -> Result<Weekday> {
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| PortalError::validation(format!("Unknown day '{}'", raw.trim())))
}

pub fn weekday_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Whole days `now` is past `due`; zero when not yet due.
pub fn days_overdue(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(due).num_days().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    #[test]
    fn school_day_follows_the_offset() {
        let offset = school_offset(8);
        let utc = Utc.with_ymd_and_hms(2025, 3, 9, 23, 0, 0).unwrap();
        assert_eq!(local_date_of(utc, offset), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(local_time_of(utc, offset), NaiveTime::from_hms_opt(7, 0, 0).unwrap());
        assert_eq!(local_date_of(utc, school_offset(0)), NaiveDate::from_ymd_opt(2025, 3, 9).unwrap());
    }

    #[test]
    fn weekday_names_normalise() {
        assert_eq!(parse_weekday("monday").unwrap(), Weekday::Mon);
        assert_eq!(weekday_label(parse_weekday("FRI").unwrap()), "Fri");
        assert!(parse_weekday("someday").is_err());
    }

    #[test]
    fn overdue_days_never_negative() {
        let due = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        assert_eq!(days_overdue(due, due - TimeDelta::days(2)), 0);
        assert_eq!(days_overdue(due, due + TimeDelta::days(3)), 3);
    }
}
