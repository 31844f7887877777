//! Calendar arithmetic and the injectable clock.
//!
//! Everything that needs "now" takes a [`Clock`] so that tests can pin an
//! instant (e.g. `2020-02-01T12:00:00Z`) instead of reading the wall clock.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Abbreviated English month names, January first.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Full English month names, January first.
pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn month_length(year: i32, month: u32) -> Option<u32> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if is_leap_year(year) => Some(29),
        2 => Some(28),
        _ => None,
    }
}

/// Number of days in `month` (1-12) of `year`.
pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    month_length(year, month).ok_or_else(|| Error::invalid_month(month))
}

/// Day of the week as 0-6, Sunday = 0.
pub fn weekday_of(date: NaiveDate) -> u32 {
    date.weekday().num_days_from_sunday()
}

/// Grid column of `date` for weeks starting on `week_start`.
pub fn weekday_offset(date: NaiveDate, week_start: WeekStart) -> u32 {
    match week_start {
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
        WeekStart::Monday => date.weekday().num_days_from_monday(),
    }
}

/// Abbreviated month name ("Feb") for `month` in 1-12.
pub fn month_abbreviation(month: u32) -> Result<&'static str> {
    month_index(month).map(|i| MONTH_ABBREVIATIONS[i])
}

/// Full month name ("February") for `month` in 1-12.
pub fn month_name(month: u32) -> Result<&'static str> {
    month_index(month).map(|i| MONTH_NAMES[i])
}

fn month_index(month: u32) -> Result<usize> {
    if (1..=12).contains(&month) {
        Ok(month as usize - 1)
    } else {
        Err(Error::invalid_month(month))
    }
}

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid date '{}', expected YYYY-MM-DD", s))
    })
}

/// Parse an RFC 3339 instant such as `2020-02-01T12:00:00Z`.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::InvalidArgument(format!("invalid instant '{}': {}", s, e)))
}

/// First day of the displayed week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
}

impl WeekStart {
    pub fn as_str(self) -> &'static str {
        match self {
            WeekStart::Sunday => "sunday",
            WeekStart::Monday => "monday",
        }
    }

    /// Two-letter weekday headers in column order.
    pub fn headers(self) -> [&'static str; 7] {
        match self {
            WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
            WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
        }
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeekStart {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sunday" => Ok(WeekStart::Sunday),
            "monday" => Ok(WeekStart::Monday),
            other => Err(Error::InvalidArgument(format!(
                "invalid week start '{}', expected 'sunday' or 'monday'",
                other
            ))),
        }
    }
}

/// A validated (year, month) pair used for month navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        month_index(month)?;
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Day 1 of this month. Fails only for years chrono cannot represent.
    pub fn first_day(self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| {
            Error::InvalidArgument(format!("year {} is out of range", self.year))
        })
    }

    pub fn days(self) -> u32 {
        month_length(self.year, self.month).unwrap_or(0)
    }

    /// The following month. Stays put at the last representable month.
    pub fn next(self) -> Self {
        if self.month == 12 {
            match self.year.checked_add(1) {
                Some(year) => Self { year, month: 1 },
                None => self,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// The preceding month. Stays put at the first representable month.
    pub fn prev(self) -> Self {
        if self.month == 1 {
            match self.year.checked_sub(1) {
                Some(year) => Self { year, month: 12 },
                None => self,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// The calendar date the user considers "today".
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall clock. `today()` uses the local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a settable instant. `today()` is the UTC date.
#[derive(Debug)]
pub struct FixedClock {
    instant: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Mutex::new(instant),
        }
    }

    /// Pin the clock to an RFC 3339 instant.
    pub fn at(rfc3339: &str) -> Result<Self> {
        parse_instant(rfc3339).map(Self::new)
    }

    /// Pin the clock to noon UTC on `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        let noon = date.and_hms_opt(12, 0, 0).unwrap_or_default();
        Self::new(noon.and_utc())
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.instant.lock() = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock();
        *instant += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock()
    }
}

/// Detects when "today" moves on, for hosts that stay open past midnight.
#[derive(Debug, Clone)]
pub struct DayRollover {
    last: NaiveDate,
}

impl DayRollover {
    pub fn new(clock: &dyn Clock) -> Self {
        Self {
            last: clock.today(),
        }
    }

    pub fn current(&self) -> NaiveDate {
        self.last
    }

    /// Returns the new date exactly once after the clock crosses a day
    /// boundary (in either direction), `None` otherwise.
    pub fn check(&mut self, clock: &dyn Clock) -> Option<NaiveDate> {
        let today = clock.today();
        if today == self.last {
            return None;
        }
        tracing::debug!(from = %self.last, to = %today, "Day rolled over");
        self.last = today;
        Some(today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_leap_year_century_rules() {
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
        assert!(is_leap_year(2020));
        assert!(!is_leap_year(2021));
        assert!(!is_leap_year(2100));
        assert!(is_leap_year(2400));
    }

    #[test]
    fn test_leap_year_agrees_with_chrono() {
        for year in -4000..=4000 {
            let feb_29 = NaiveDate::from_ymd_opt(year, 2, 29).is_some();
            assert_eq!(is_leap_year(year), feb_29, "year {}", year);
        }
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2020, 2).unwrap(), 29);
        assert_eq!(days_in_month(2019, 2).unwrap(), 28);
        assert_eq!(days_in_month(1900, 2).unwrap(), 28);
        assert_eq!(days_in_month(2021, 1).unwrap(), 31);
        assert_eq!(days_in_month(2021, 4).unwrap(), 30);
        assert_eq!(days_in_month(2021, 12).unwrap(), 31);
    }

    #[test]
    fn test_days_in_month_rejects_out_of_range() {
        assert!(matches!(days_in_month(2020, 0), Err(Error::InvalidArgument(_))));
        assert!(matches!(days_in_month(2020, 13), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_days_in_month_agrees_with_chrono() {
        for year in 1890..=2110 {
            for month in 1..=12 {
                let ym = YearMonth::new(year, month).unwrap();
                let first = ym.first_day().unwrap();
                let next = ym.next().first_day().unwrap();
                let expected = (next - first).num_days() as u32;
                assert_eq!(days_in_month(year, month).unwrap(), expected);
            }
        }
    }

    #[test]
    fn test_weekday_of() {
        // 2020-02-01 was a Saturday
        assert_eq!(weekday_of(ymd(2020, 2, 1)), 6);
        // 2000-01-01 was a Saturday, 2024-09-01 a Sunday
        assert_eq!(weekday_of(ymd(2000, 1, 1)), 6);
        assert_eq!(weekday_of(ymd(2024, 9, 1)), 0);
    }

    #[test]
    fn test_weekday_offset_monday_start() {
        assert_eq!(weekday_offset(ymd(2020, 2, 1), WeekStart::Monday), 5);
        assert_eq!(weekday_offset(ymd(2024, 9, 1), WeekStart::Monday), 6);
        assert_eq!(weekday_offset(ymd(2024, 9, 2), WeekStart::Monday), 0);
    }

    #[test]
    fn test_month_names() {
        assert_eq!(month_abbreviation(2).unwrap(), "Feb");
        assert_eq!(month_name(12).unwrap(), "December");
        assert!(month_abbreviation(0).is_err());
    }

    #[test]
    fn test_week_start_parse() {
        assert_eq!("Monday".parse::<WeekStart>().unwrap(), WeekStart::Monday);
        assert_eq!("sunday".parse::<WeekStart>().unwrap(), WeekStart::Sunday);
        assert!("friday".parse::<WeekStart>().is_err());
    }

    #[test]
    fn test_year_month_navigation() {
        let dec = YearMonth::new(2019, 12).unwrap();
        assert_eq!(dec.next(), YearMonth::new(2020, 1).unwrap());
        assert_eq!(dec.next().prev(), dec);
        assert_eq!(YearMonth::new(2020, 1).unwrap().prev(), dec);
        assert_eq!(YearMonth::new(2020, 2).unwrap().days(), 29);
        assert!(YearMonth::new(2020, 13).is_err());
        assert_eq!(dec.to_string(), "2019-12");
    }

    #[test]
    fn test_year_month_navigation_stops_at_year_bounds() {
        let last = YearMonth::new(i32::MAX, 12).unwrap();
        assert_eq!(last.next(), last);
        assert_eq!(last.prev(), YearMonth::new(i32::MAX, 11).unwrap());

        let first = YearMonth::new(i32::MIN, 1).unwrap();
        assert_eq!(first.prev(), first);
        assert_eq!(first.next(), YearMonth::new(i32::MIN, 2).unwrap());
    }

    #[test]
    fn test_fixed_clock_pins_today() {
        let clock = FixedClock::at("2020-02-01T12:00:00Z").unwrap();
        assert_eq!(clock.today(), ymd(2020, 2, 1));

        clock.advance(Duration::hours(12));
        assert_eq!(clock.today(), ymd(2020, 2, 2));
    }

    #[test]
    fn test_fixed_clock_rejects_garbage() {
        assert!(matches!(
            FixedClock::at("yesterday"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2020-02-29").unwrap(), ymd(2020, 2, 29));
        assert!(parse_date("2019-02-29").is_err());
        assert!(parse_date("29/02/2020").is_err());
    }

    #[test]
    fn test_day_rollover_fires_once() {
        let clock = FixedClock::at("2020-02-28T23:00:00Z").unwrap();
        let mut rollover = DayRollover::new(&clock);
        assert_eq!(rollover.check(&clock), None);

        clock.advance(Duration::hours(2));
        assert_eq!(rollover.check(&clock), Some(ymd(2020, 2, 29)));
        assert_eq!(rollover.check(&clock), None);
        assert_eq!(rollover.current(), ymd(2020, 2, 29));
    }
}
