//! Release-date normalization.
//!
//! Every date the crawler compares is a [`NaiveDate`] in one fixed civil calendar
//! (KST by default). Extracted text never becomes an instant before comparison,
//! so a `yyyy.mm.dd` string is never shifted by the host's or UTC's midnight.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use clap::ValueEnum;
use regex::Regex;

use crate::error::{CrawlError, Result};

pub const KST_OFFSET_HOURS: i32 = 9;

static DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})[.\-/](\d{1,2})[.\-/](\d{1,2})\.?$").unwrap());

/// Local date-times without an offset, already on the storefront's calendar.
const LOCAL_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

static NON_DATE_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.]").unwrap());

pub fn offset_from_hours(hours: i32) -> Result<FixedOffset> {
    FixedOffset::east_opt(hours * 3600)
        .ok_or_else(|| CrawlError::Parse(format!("utc offset out of range: {}h", hours)))
}

/// Civil date of `now` in the given zone.
pub fn target_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Parses `yyyy.mm.dd[.]`, `yyyy-mm-dd`, RFC 3339 instants and offset-less
/// `yyyy-mm-ddThh:mm[:ss]` into a civil date.
///
/// Instants are converted into `offset` before the time of day is dropped.
/// Offset-less date-times are taken as local and keep their own date.
pub fn parse_release_date(raw: &str, offset: FixedOffset) -> Result<NaiveDate> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(CrawlError::InvalidDate("empty date text".into()));
    }

    if let Some(caps) = DOTTED.captures(text) {
        let year: i32 = caps[1].parse().map_err(|_| invalid(text))?;
        let month: u32 = caps[2].parse().map_err(|_| invalid(text))?;
        let day: u32 = caps[3].parse().map_err(|_| invalid(text))?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid(text));
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Ok(instant.with_timezone(&offset).date_naive());
    }

    if let Some(local) = LOCAL_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Ok(local.date());
    }

    Err(invalid(text))
}

/// Strips everything but digits and dots, e.g. `"2025.09.05. 등록"` -> `"2025.09.05."`.
pub fn strip_to_date_chars(raw: &str) -> String {
    NON_DATE_CHARS.replace_all(raw, "").into_owned()
}

fn invalid(text: &str) -> CrawlError {
    CrawlError::InvalidDate(text.to_string())
}

/// How an extracted date is compared against the target day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CutoffPolicy {
    /// Keep today's and future-dated titles.
    #[default]
    OnOrAfter,
    /// Keep only titles dated exactly on the target day.
    ExactDay,
}

impl CutoffPolicy {
    /// Whether the scan stops at this date. Anything before the target day always stops it.
    pub fn stops(self, date: NaiveDate, target: NaiveDate) -> bool {
        date < target
    }

    pub fn accepts(self, date: NaiveDate, target: NaiveDate) -> bool {
        match self {
            CutoffPolicy::OnOrAfter => date >= target,
            CutoffPolicy::ExactDay => date == target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn kst() -> FixedOffset {
        offset_from_hours(KST_OFFSET_HOURS).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_dotted_with_trailing_dot() {
        assert_eq!(parse_release_date("2025.09.05.", kst()).unwrap(), ymd(2025, 9, 5));
        assert_eq!(parse_release_date("2025.09.05", kst()).unwrap(), ymd(2025, 9, 5));
        assert_eq!(parse_release_date(" 2025.9.5 ", kst()).unwrap(), ymd(2025, 9, 5));
    }

    #[test]
    fn parses_dashed() {
        assert_eq!(parse_release_date("2025-09-05", kst()).unwrap(), ymd(2025, 9, 5));
    }

    #[test]
    fn instant_is_read_in_local_calendar() {
        // midnight UTC is already 09:00 the same day in KST
        assert_eq!(
            parse_release_date("2025-09-05T00:00:00Z", kst()).unwrap(),
            ymd(2025, 9, 5)
        );
        // 16:00 UTC rolls over to the next KST day
        assert_eq!(
            parse_release_date("2025-09-04T16:00:00Z", kst()).unwrap(),
            ymd(2025, 9, 5)
        );
        assert_eq!(
            parse_release_date("2025-09-05T00:00:00+09:00", kst()).unwrap(),
            ymd(2025, 9, 5)
        );
    }

    #[test]
    fn offsetless_datetime_keeps_its_own_date() {
        assert_eq!(
            parse_release_date("2025-09-05T00:00:00", kst()).unwrap(),
            ymd(2025, 9, 5)
        );
        // late evening must not roll into the next day
        assert_eq!(
            parse_release_date("2025-09-05T23:30", kst()).unwrap(),
            ymd(2025, 9, 5)
        );
        assert_eq!(
            parse_release_date("2025-09-05T10:00:00.123", kst()).unwrap(),
            ymd(2025, 9, 5)
        );
        assert!(matches!(
            parse_release_date("2025-02-30T00:00:00", kst()),
            Err(CrawlError::InvalidDate(_))
        ));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert!(matches!(
            parse_release_date("2025.13.01", kst()),
            Err(CrawlError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_release_date("2025.02.30.", kst()),
            Err(CrawlError::InvalidDate(_))
        ));
        assert!(matches!(parse_release_date("", kst()), Err(CrawlError::InvalidDate(_))));
        assert!(matches!(
            parse_release_date("yesterday", kst()),
            Err(CrawlError::InvalidDate(_))
        ));
    }

    #[test]
    fn strip_keeps_digits_and_dots() {
        assert_eq!(strip_to_date_chars("2025.09.05. 등록"), "2025.09.05.");
        assert_eq!(strip_to_date_chars("등록일 : 2024.12.31"), "2024.12.31");
    }

    #[test]
    fn target_day_uses_fixed_offset() {
        // 2025-09-04 15:30 UTC is 2025-09-05 00:30 KST
        let now = Utc.with_ymd_and_hms(2025, 9, 4, 15, 30, 0).unwrap();
        assert_eq!(target_day(now, kst()), ymd(2025, 9, 5));
        let now = Utc.with_ymd_and_hms(2025, 9, 4, 14, 59, 0).unwrap();
        assert_eq!(target_day(now, kst()), ymd(2025, 9, 4));
    }

    #[test]
    fn same_day_is_not_before_target() {
        let date = parse_release_date("2025.09.05", kst()).unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 4, 15, 0, 0).unwrap();
        let target = target_day(now, kst());
        assert!(!CutoffPolicy::OnOrAfter.stops(date, target));
        assert!(CutoffPolicy::OnOrAfter.accepts(date, target));
        assert!(CutoffPolicy::ExactDay.accepts(date, target));
    }

    #[test]
    fn normalizing_twice_is_stable() {
        let once = parse_release_date("2025.09.05.", kst()).unwrap();
        let twice = parse_release_date(&once.format("%Y-%m-%d").to_string(), kst()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn exact_day_rejects_future_without_stopping() {
        let target = ymd(2025, 9, 5);
        let future = ymd(2025, 9, 8);
        assert!(!CutoffPolicy::ExactDay.accepts(future, target));
        assert!(!CutoffPolicy::ExactDay.stops(future, target));
        assert!(CutoffPolicy::OnOrAfter.accepts(future, target));
        assert!(CutoffPolicy::ExactDay.stops(ymd(2025, 9, 4), target));
    }
}
