//! Time types for the calendar dashboard.
//!
//! This module provides [`EventTime`] for the start/end strings the backend
//! sends (either an RFC 3339 timestamp or a date-only value), [`DateRange`]
//! for the range the user is looking at, the range shortcuts
//! ([`RangePreset`]), and [`DisplayZone`] which decides which wall clock the
//! ranges and formatted times are computed in.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime,
    NaiveTime, SecondsFormat, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display format for a date-only value (e.g. "Jan 15, 2025").
pub const DATE_FORMAT: &str = "%b %-d, %Y";

/// Display format for a timestamp (e.g. "Jan 15, 2025 9:00 AM").
pub const DATETIME_FORMAT: &str = "%b %-d, %Y %-I:%M %p";

/// Errors raised while building or parsing date ranges.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The range would end before it starts.
    #[error("range start {from} is after range end {to}")]
    Inverted { from: String, to: String },

    /// A date argument was not `YYYY-MM-DD`.
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Unknown range shortcut name.
    #[error("unknown range '{0}', expected this-week, next-week or this-month")]
    UnknownPreset(String),

    /// Unknown IANA timezone name.
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
}

/// The start or end of a calendar event as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// A timestamp with an explicit offset.
    DateTime(DateTime<FixedOffset>),
    /// A timestamp without offset; shown as-is.
    Floating(NaiveDateTime),
    /// A whole-day event date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Parses a backend time string.
    ///
    /// Ten-character values are date-only (`2025-01-15`). Anything else is
    /// tried as RFC 3339, then as an offset-less ISO timestamp.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() == 10 {
            return NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(Self::AllDay);
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(Self::DateTime(dt));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(Self::Floating)
    }

    /// Returns `true` if this is a whole-day value.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Formats for display in the given zone.
    pub fn format_in(&self, zone: &DisplayZone) -> String {
        match self {
            Self::AllDay(date) => date.format(DATE_FORMAT).to_string(),
            Self::Floating(naive) => naive.format(DATETIME_FORMAT).to_string(),
            Self::DateTime(dt) => zone.format_instant(dt, DATETIME_FORMAT),
        }
    }
}

/// Formats a raw backend time string, falling back to the raw value when it
/// cannot be parsed.
pub fn format_event_time(raw: &str, zone: &DisplayZone) -> String {
    match EventTime::parse(raw) {
        Some(time) => time.format_in(zone),
        None => raw.to_string(),
    }
}

/// The date range the dashboard is showing.
///
/// Both ends are inclusive instants carrying the offset of the wall clock
/// they were computed in. `from <= to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: DateTime<FixedOffset>,
    to: DateTime<FixedOffset>,
}

impl DateRange {
    /// Creates a range, rejecting `from > to`.
    pub fn new(
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Self, RangeError> {
        if from > to {
            return Err(RangeError::Inverted {
                from: from.to_rfc3339(),
                to: to.to_rfc3339(),
            });
        }
        Ok(Self { from, to })
    }

    /// Sunday 00:00:00.000 through Saturday 23:59:59.999 of the week
    /// containing `now`, in `now`'s timezone.
    pub fn this_week<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::week_starting(now, 0)
    }

    /// The week after [`DateRange::this_week`].
    pub fn next_week<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self::week_starting(now, 7)
    }

    /// Day 1 00:00:00.000 through the last instant of the month containing
    /// `now`, in `now`'s timezone.
    pub fn this_month<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let first = today - Duration::days(i64::from(today.day0()));
        let probe = first + Duration::days(32);
        let next_first = probe - Duration::days(i64::from(probe.day0()));
        Self {
            from: start_of_day(&tz, first),
            to: end_of_day(&tz, next_first - Duration::days(1)),
        }
    }

    /// Start of `from` through end of `to`, both whole local days in `tz`.
    pub fn whole_days<Tz: TimeZone>(
        tz: &Tz,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Self, RangeError> {
        Self::new(start_of_day(tz, from), end_of_day(tz, to))
    }

    fn week_starting<Tz: TimeZone>(now: &DateTime<Tz>, offset_days: i64) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let since_sunday = i64::from(today.weekday().num_days_from_sunday());
        let sunday = today - Duration::days(since_sunday) + Duration::days(offset_days);
        Self {
            from: start_of_day(&tz, sunday),
            to: end_of_day(&tz, sunday + Duration::days(6)),
        }
    }

    /// Start of the range (inclusive).
    pub fn from(&self) -> DateTime<FixedOffset> {
        self.from
    }

    /// End of the range (inclusive).
    pub fn to(&self) -> DateTime<FixedOffset> {
        self.to
    }

    /// `timeMin` query value: UTC, millisecond precision, `Z` suffix.
    pub fn time_min(&self) -> String {
        api_timestamp(&self.from)
    }

    /// `timeMax` query value: UTC, millisecond precision, `Z` suffix.
    pub fn time_max(&self) -> String {
        api_timestamp(&self.to)
    }

    /// Human label such as "Jan 12 - 18, 2025".
    pub fn label(&self) -> String {
        let from = self.from.naive_local();
        let to = self.to.naive_local();
        let from_str = from.format(DATE_FORMAT).to_string();
        let to_str = to.format(DATE_FORMAT).to_string();

        if from_str == to_str {
            return from_str;
        }

        if from.month() == to.month() && from.year() == to.year() {
            return format!("{} - {}", from.format("%b %-d"), to.format("%-d, %Y"));
        }

        format!("{} - {}", from_str, to_str)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn api_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<FixedOffset> {
    at_local(tz, date.and_time(NaiveTime::MIN))
}

/// 23:59:59.999 on `date`: one millisecond before the next local midnight,
/// on the wall clock in force at that instant.
fn end_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<FixedOffset> {
    let last = start_of_day(tz, date + Duration::days(1)) - Duration::milliseconds(1);
    last.with_timezone(tz).fixed_offset()
}

/// Longest stretch of wall-clock time a transition can skip.
const MAX_GAP_MINUTES: i64 = 24 * 60;

fn at_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<FixedOffset> {
    // A skipped wall time resolves to the first instant after the gap.
    (0..=MAX_GAP_MINUTES)
        .find_map(|minutes| {
            tz.from_local_datetime(&(naive + Duration::minutes(minutes)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
        .fixed_offset()
}

/// Date range shortcuts offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    /// Current Sunday–Saturday week.
    ThisWeek,
    /// Following Sunday–Saturday week.
    NextWeek,
    /// Current calendar month.
    ThisMonth,
}

impl RangePreset {
    /// Returns the command-line name of this preset.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThisWeek => "this-week",
            Self::NextWeek => "next-week",
            Self::ThisMonth => "this-month",
        }
    }

    /// Computes the range for this preset at `now`.
    pub fn resolve<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> DateRange {
        match self {
            Self::ThisWeek => DateRange::this_week(now),
            Self::NextWeek => DateRange::next_week(now),
            Self::ThisMonth => DateRange::this_month(now),
        }
    }
}

impl FromStr for RangePreset {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "this-week" | "week" => Ok(Self::ThisWeek),
            "next-week" => Ok(Self::NextWeek),
            "this-month" | "month" => Ok(Self::ThisMonth),
            _ => Err(RangeError::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a `YYYY-MM-DD` argument.
pub fn parse_date(s: &str) -> Result<NaiveDate, RangeError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| RangeError::InvalidDate(s.to_string()))
}

/// The wall clock ranges are computed in and timestamps are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// The machine's local timezone.
    #[default]
    Local,
    /// A named IANA timezone.
    Named(chrono_tz::Tz),
}

impl DisplayZone {
    /// Parses a timezone setting. `None`, empty and `"local"` mean the
    /// machine's local timezone.
    pub fn parse(name: Option<&str>) -> Result<Self, RangeError> {
        match name.map(str::trim) {
            None | Some("") => Ok(Self::Local),
            Some(n) if n.eq_ignore_ascii_case("local") => Ok(Self::Local),
            Some(n) => n
                .parse::<chrono_tz::Tz>()
                .map(Self::Named)
                .map_err(|_| RangeError::UnknownTimezone(n.to_string())),
        }
    }

    /// Computes a preset range at the given instant in this zone.
    pub fn resolve(&self, preset: RangePreset, now: DateTime<Utc>) -> DateRange {
        match self {
            Self::Local => preset.resolve(&now.with_timezone(&Local)),
            Self::Named(tz) => preset.resolve(&now.with_timezone(tz)),
        }
    }

    /// Whole-day range between two dates in this zone.
    pub fn whole_days(&self, from: NaiveDate, to: NaiveDate) -> Result<DateRange, RangeError> {
        match self {
            Self::Local => DateRange::whole_days(&Local, from, to),
            Self::Named(tz) => DateRange::whole_days(tz, from, to),
        }
    }

    /// Formats an instant on this zone's wall clock.
    pub fn format_instant(&self, dt: &DateTime<FixedOffset>, fmt: &str) -> String {
        match self {
            Self::Local => dt.with_timezone(&Local).format(fmt).to_string(),
            Self::Named(tz) => dt.with_timezone(tz).format(fmt).to_string(),
        }
    }
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Named(tz) => f.write_str(tz.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn naive(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_milli_opt(h, min, s, ms).unwrap()
    }

    mod event_time {
        use super::*;

        #[test]
        fn parses_date_only() {
            let et = EventTime::parse("2025-01-15").unwrap();
            assert!(et.is_all_day());
            assert!(matches!(et, EventTime::AllDay(d) if d == date(2025, 1, 15)));
        }

        #[test]
        fn parses_rfc3339() {
            let et = EventTime::parse("2025-01-15T09:00:00+07:00").unwrap();
            assert!(!et.is_all_day());
            match et {
                EventTime::DateTime(dt) => {
                    assert_eq!(dt.with_timezone(&Utc), utc(2025, 1, 15, 2, 0, 0));
                }
                other => panic!("expected DateTime, got {:?}", other),
            }
        }

        #[test]
        fn parses_offsetless_timestamp() {
            let et = EventTime::parse("2025-01-15T09:30:00").unwrap();
            assert_eq!(et, EventTime::Floating(naive(2025, 1, 15, 9, 30, 0, 0)));
        }

        #[test]
        fn rejects_garbage() {
            assert!(EventTime::parse("not a time").is_none());
            assert!(EventTime::parse("2025-13-45").is_none());
        }

        #[test]
        fn formats_all_day() {
            let zone = DisplayZone::Named(chrono_tz::Asia::Bangkok);
            assert_eq!(format_event_time("2025-01-15", &zone), "Jan 15, 2025");
        }

        #[test]
        fn formats_timestamp_in_zone() {
            let zone = DisplayZone::Named(chrono_tz::Asia::Bangkok);
            assert_eq!(
                format_event_time("2025-01-15T02:00:00Z", &zone),
                "Jan 15, 2025 9:00 AM"
            );
            assert_eq!(
                format_event_time("2025-01-15T10:05:00Z", &zone),
                "Jan 15, 2025 5:05 PM"
            );
        }

        #[test]
        fn unparseable_falls_back_to_raw() {
            let zone = DisplayZone::Named(chrono_tz::UTC);
            assert_eq!(format_event_time("sometime soon", &zone), "sometime soon");
        }
    }

    mod date_range {
        use super::*;

        #[test]
        fn this_week_from_wednesday() {
            // 2025-01-15 is a Wednesday.
            let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
            let range = DateRange::this_week(&now);
            assert_eq!(range.from().naive_local(), naive(2025, 1, 12, 0, 0, 0, 0));
            assert_eq!(range.to().naive_local(), naive(2025, 1, 18, 23, 59, 59, 999));
        }

        #[test]
        fn this_week_is_idempotent() {
            let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
            assert_eq!(DateRange::this_week(&now), DateRange::this_week(&now));
        }

        #[test]
        fn this_week_on_sunday_and_saturday() {
            let sunday = Utc.with_ymd_and_hms(2025, 1, 12, 0, 0, 0).unwrap();
            let saturday = Utc.with_ymd_and_hms(2025, 1, 18, 23, 0, 0).unwrap();
            assert_eq!(DateRange::this_week(&sunday), DateRange::this_week(&saturday));
        }

        #[test]
        fn next_week_is_shifted_by_seven_days() {
            let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
            let range = DateRange::next_week(&now);
            assert_eq!(range.from().naive_local(), naive(2025, 1, 19, 0, 0, 0, 0));
            assert_eq!(range.to().naive_local(), naive(2025, 1, 25, 23, 59, 59, 999));
        }

        #[test]
        fn week_across_skipped_midnight() {
            // Santiago clocks jump from 00:00 to 01:00 on Sunday 2024-09-08.
            let tz = chrono_tz::America::Santiago;
            let now = utc(2024, 9, 4, 16, 0, 0).with_timezone(&tz);

            let this_week = DateRange::this_week(&now);
            assert_eq!(this_week.from().naive_local(), naive(2024, 9, 1, 0, 0, 0, 0));
            assert_eq!(this_week.to().naive_local(), naive(2024, 9, 7, 23, 59, 59, 999));
            assert_eq!(this_week.to().offset().local_minus_utc(), -4 * 3600);

            let next_week = DateRange::next_week(&now);
            assert_eq!(next_week.from().naive_local(), naive(2024, 9, 8, 1, 0, 0, 0));
            assert_eq!(next_week.from().offset().local_minus_utc(), -3 * 3600);
            assert_eq!(next_week.from() - this_week.to(), Duration::milliseconds(1));
            assert_eq!(next_week.label(), "Sep 8 - 14, 2024");
        }

        #[test]
        fn week_in_named_timezone() {
            // Saturday 20:00 UTC is already Sunday in Bangkok.
            let now = utc(2025, 1, 18, 20, 0, 0).with_timezone(&chrono_tz::Asia::Bangkok);
            let range = DateRange::this_week(&now);
            assert_eq!(range.from().naive_local(), naive(2025, 1, 19, 0, 0, 0, 0));
            assert_eq!(range.time_min(), "2025-01-18T17:00:00.000Z");
        }

        #[test]
        fn this_month_spans_whole_month() {
            for (y, m, d, last) in [(2025, 1, 15, 31), (2024, 2, 29, 29), (2025, 2, 1, 28), (2025, 4, 30, 30), (2025, 12, 31, 31)] {
                let now = Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap();
                let range = DateRange::this_month(&now);
                assert_eq!(range.from().day(), 1);
                assert_eq!(range.from().month(), m);
                assert_eq!(range.from().naive_local().time(), NaiveTime::MIN);
                assert_eq!(range.to().day(), last);
                assert_eq!(range.to().month(), m);
                assert_eq!(range.to().hour(), 23);
                assert_eq!(range.to().nanosecond(), 999_000_000);
                // One millisecond later is the next month.
                let after = range.to() + Duration::milliseconds(1);
                assert_eq!(after.day(), 1);
                assert_ne!(after.month(), m);
            }
        }

        #[test]
        fn api_timestamps_are_utc_millis() {
            let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
            let range = DateRange::this_week(&now);
            assert_eq!(range.time_min(), "2025-01-12T00:00:00.000Z");
            assert_eq!(range.time_max(), "2025-01-18T23:59:59.999Z");
        }

        #[test]
        fn rejects_inverted_range() {
            let result = DateRange::whole_days(&Utc, date(2025, 2, 1), date(2025, 1, 1));
            assert!(matches!(result, Err(RangeError::Inverted { .. })));
        }

        #[test]
        fn single_day_range_is_allowed() {
            let range = DateRange::whole_days(&Utc, date(2025, 3, 3), date(2025, 3, 3)).unwrap();
            assert_eq!(range.label(), "Mar 3, 2025");
        }

        #[test]
        fn labels() {
            let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
            assert_eq!(DateRange::this_week(&now).label(), "Jan 12 - 18, 2025");

            let spanning = Utc.with_ymd_and_hms(2025, 1, 29, 10, 0, 0).unwrap();
            assert_eq!(
                DateRange::this_week(&spanning).label(),
                "Jan 26, 2025 - Feb 1, 2025"
            );
        }
    }

    mod presets {
        use super::*;

        #[test]
        fn parse_names() {
            assert_eq!("this-week".parse::<RangePreset>().unwrap(), RangePreset::ThisWeek);
            assert_eq!("next_week".parse::<RangePreset>().unwrap(), RangePreset::NextWeek);
            assert_eq!("Month".parse::<RangePreset>().unwrap(), RangePreset::ThisMonth);
            assert!("fortnight".parse::<RangePreset>().is_err());
        }

        #[test]
        fn resolve_matches_constructors() {
            let now = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
            assert_eq!(RangePreset::ThisWeek.resolve(&now), DateRange::this_week(&now));
            assert_eq!(RangePreset::ThisMonth.resolve(&now), DateRange::this_month(&now));
        }
    }

    mod display_zone {
        use super::*;

        #[test]
        fn parse_settings() {
            assert_eq!(DisplayZone::parse(None).unwrap(), DisplayZone::Local);
            assert_eq!(DisplayZone::parse(Some("local")).unwrap(), DisplayZone::Local);
            assert_eq!(
                DisplayZone::parse(Some("Asia/Bangkok")).unwrap(),
                DisplayZone::Named(chrono_tz::Asia::Bangkok)
            );
            assert!(matches!(
                DisplayZone::parse(Some("Mars/Olympus")),
                Err(RangeError::UnknownTimezone(_))
            ));
        }

        #[test]
        fn resolve_uses_zone_wall_clock() {
            let zone = DisplayZone::Named(chrono_tz::Asia::Bangkok);
            let range = zone.resolve(RangePreset::ThisWeek, utc(2025, 1, 15, 10, 0, 0));
            assert_eq!(range.from().offset().local_minus_utc(), 7 * 3600);
            assert_eq!(range.from().naive_local(), naive(2025, 1, 12, 0, 0, 0, 0));
        }
    }
}
