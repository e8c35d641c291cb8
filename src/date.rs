//! Relative publication dates for the popup ("Date: 2024-01-15 (1 year & 3 days ago)").

use chrono::{DateTime, NaiveDate, Utc};

pub const INVALID_DATE: &str = "Invalid date";

/// Format an ISO date (`YYYY-MM-DD` or RFC 3339) relative to `now`.
///
/// Only the calendar date is considered. Years are counted as 365 days.
pub fn format_date(input: &str, now: DateTime<Utc>) -> String {
    match parse_date(input) {
        Some(date) => format_relative(date, now.date_naive()),
        None => INVALID_DATE.to_string(),
    }
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let date_part = input.split('T').next().unwrap_or(input);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn format_relative(date: NaiveDate, today: NaiveDate) -> String {
    let diff_days = (today - date).num_days().unsigned_abs();
    let years = diff_days / 365;
    let remaining_days = diff_days % 365;

    let relative = if years > 0 {
        let mut relative = plural(years, "year");
        if remaining_days > 0 {
            relative.push_str(" & ");
            relative.push_str(&plural(remaining_days, "day"));
        }
        relative
    } else {
        plural(diff_days, "day")
    };

    format!("Date: {} ({} ago)", date.format("%Y-%m-%d"), relative)
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{} {}", count, unit)
    } else {
        format!("{} {}s", count, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_days_only() {
        assert_eq!(
            format_date("2025-03-07", now()),
            "Date: 2025-03-07 (3 days ago)"
        );
        assert_eq!(format_date("2025-03-09", now()), "Date: 2025-03-09 (1 day ago)");
        assert_eq!(format_date("2025-03-10", now()), "Date: 2025-03-10 (0 days ago)");
    }

    #[test]
    fn test_years_and_days() {
        // 2024-03-05 -> 2025-03-10 is 370 days
        assert_eq!(
            format_date("2024-03-05", now()),
            "Date: 2024-03-05 (1 year & 5 days ago)"
        );
    }

    #[test]
    fn test_whole_years_omit_days() {
        // 2023-03-11 -> 2025-03-10 is 730 days
        assert_eq!(
            format_date("2023-03-11", now()),
            "Date: 2023-03-11 (2 years ago)"
        );
    }

    #[test]
    fn test_full_timestamp_uses_date_part() {
        assert_eq!(
            format_date("2025-03-08T23:59:59.000Z", now()),
            "Date: 2025-03-08 (2 days ago)"
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(format_date("", now()), INVALID_DATE);
        assert_eq!(format_date("   ", now()), INVALID_DATE);
        assert_eq!(format_date("yesterday", now()), INVALID_DATE);
        assert_eq!(format_date("2025-13-40", now()), INVALID_DATE);
    }

    #[test]
    fn test_future_dates_use_absolute_difference() {
        assert_eq!(
            format_date("2025-03-12", now()),
            "Date: 2025-03-12 (2 days ago)"
        );
    }

    proptest! {
        #[test]
        fn prop_valid_dates_always_format(days_back in 0i64..20_000) {
            let date = now().date_naive() - chrono::Duration::days(days_back);
            let formatted = format_date(&date.format("%Y-%m-%d").to_string(), now());
            prop_assert!(formatted.starts_with("Date: "));
            prop_assert!(formatted.ends_with(" ago)"));
        }
    }
}
