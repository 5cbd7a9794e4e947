use anyhow::Context;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::America::New_York;

// Labels roll to the next season from August on, ahead of October tip-off.
const SEASON_ROLLOVER_MONTH: u32 = 8;

/// Today's date in US-Eastern time, where NBA game dates are reported.
pub fn eastern_date(now_utc: DateTime<Utc>) -> NaiveDate {
    now_utc.with_timezone(&New_York).date_naive()
}

/// Season label such as `2024-25` for the season a date falls in.
pub fn season_for_date(date: NaiveDate) -> String {
    let start = if date.month() >= SEASON_ROLLOVER_MONTH {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{start}-{:02}", (start + 1) % 100)
}

/// Checks a `YYYY-YY` label and returns it normalized.
pub fn parse_season(label: &str) -> anyhow::Result<String> {
    let label = label.trim();
    let (start, end) = label
        .split_once('-')
        .with_context(|| format!("season must look like 2024-25 (got {label:?})"))?;
    let start: i32 = start
        .parse()
        .with_context(|| format!("invalid season start year in {label:?}"))?;
    let end: i32 = end
        .parse()
        .with_context(|| format!("invalid season end year in {label:?}"))?;
    anyhow::ensure!(
        end == (start + 1) % 100,
        "season {label:?} must span consecutive years"
    );
    Ok(format!("{start}-{end:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn late_utc_evening_is_still_same_eastern_day_in_winter() {
        // 2025-01-04 03:30 UTC = 2025-01-03 22:30 EST
        let now = Utc.with_ymd_and_hms(2025, 1, 4, 3, 30, 0).unwrap();
        assert_eq!(eastern_date(now), NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
    }

    #[test]
    fn daylight_time_uses_minus_four() {
        // 2025-04-10 03:30 UTC = 2025-04-09 23:30 EDT
        let now = Utc.with_ymd_and_hms(2025, 4, 10, 3, 30, 0).unwrap();
        assert_eq!(eastern_date(now), NaiveDate::from_ymd_opt(2025, 4, 9).unwrap());
        // 2025-04-10 04:30 UTC = 2025-04-10 00:30 EDT
        let now = Utc.with_ymd_and_hms(2025, 4, 10, 4, 30, 0).unwrap();
        assert_eq!(eastern_date(now), NaiveDate::from_ymd_opt(2025, 4, 10).unwrap());
    }

    #[test]
    fn switches_offset_on_dst_boundaries() {
        // 2025-03-09 04:30 UTC is 23:30 EST on the 8th, before the spring change.
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 4, 30, 0).unwrap();
        assert_eq!(eastern_date(now), NaiveDate::from_ymd_opt(2025, 3, 8).unwrap());
        // 2025-11-03 04:30 UTC is 23:30 EST on the 2nd, after the fall change.
        let now = Utc.with_ymd_and_hms(2025, 11, 3, 4, 30, 0).unwrap();
        assert_eq!(eastern_date(now), NaiveDate::from_ymd_opt(2025, 11, 2).unwrap());
        // Same instant a week earlier is still EDT: 00:30 on the 27th.
        let now = Utc.with_ymd_and_hms(2025, 10, 27, 4, 30, 0).unwrap();
        assert_eq!(eastern_date(now), NaiveDate::from_ymd_opt(2025, 10, 27).unwrap());
    }

    #[test]
    fn season_labels_roll_in_august() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(season_for_date(d(2025, 2, 1)), "2024-25");
        assert_eq!(season_for_date(d(2025, 7, 31)), "2024-25");
        assert_eq!(season_for_date(d(2025, 10, 22)), "2025-26");
        assert_eq!(season_for_date(d(2099, 12, 1)), "2099-00");
    }

    #[test]
    fn parses_season_labels() {
        assert_eq!(parse_season(" 2024-25 ").unwrap(), "2024-25");
        assert!(parse_season("2024-26").is_err());
        assert!(parse_season("2024").is_err());
    }
}
