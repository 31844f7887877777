//! Named occasions attached to calendar days.
//!
//! An [`EventTable`] holds three kinds of entries:
//! - recurring fixed-date events keyed by (month, day), repeating every year
//! - dated events that belong to a single year
//! - season markers (equinoxes and solstices), computed per year on demand

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::config::EventsConfig;
use crate::dates::days_in_month;
use crate::error::{Error, Result};
use crate::seasons::season_markers;

/// Fixed-date holidays shipped with almanac: (month, day, name).
pub const BUILTIN_HOLIDAYS: &[(u32, u32, &str)] = &[
    (1, 1, "New Year's Day"),
    (2, 14, "Valentine's Day"),
    (3, 17, "St. Patrick's Day"),
    (4, 1, "April Fools' Day"),
    (7, 4, "Independence Day"),
    (10, 31, "Halloween"),
    (12, 24, "Christmas Eve"),
    (12, 25, "Christmas Day"),
    (12, 31, "New Year's Eve"),
];

// Leap year, so Feb 29 is accepted for recurring events.
const REFERENCE_LEAP_YEAR: i32 = 2000;

fn push_unique(names: &mut Vec<String>, name: &str) {
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
}

fn clean_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidArgument(
            "event name must not be empty".to_string(),
        ));
    }
    Ok(name)
}

/// Lookup table from dates to event names.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    recurring: BTreeMap<(u32, u32), Vec<String>>,
    dated: BTreeMap<NaiveDate, Vec<String>>,
    seasons: bool,
}

impl EventTable {
    /// An empty table with season markers disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in holidays, without season markers.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        for &(month, day, name) in BUILTIN_HOLIDAYS {
            table
                .recurring
                .entry((month, day))
                .or_default()
                .push(name.to_string());
        }
        table
    }

    /// Build a table from the `[events]` config section.
    pub fn from_config(config: &EventsConfig) -> Result<Self> {
        let mut table = if config.holidays {
            Self::builtin()
        } else {
            Self::new()
        };
        table.seasons = config.seasons;

        for event in &config.custom {
            match event.year {
                Some(year) => {
                    let date = NaiveDate::from_ymd_opt(year, event.month, event.day)
                        .ok_or_else(|| {
                            Error::InvalidArgument(format!(
                                "event '{}': {}-{:02}-{:02} is not a valid date",
                                event.name, year, event.month, event.day
                            ))
                        })?;
                    table.add_dated(date, &event.name)?;
                }
                None => table.add_recurring(event.month, event.day, &event.name)?,
            }
        }

        tracing::debug!(
            recurring = table.recurring.len(),
            dated = table.dated.len(),
            seasons = table.seasons,
            "Built event table"
        );
        Ok(table)
    }

    /// Enable or disable computed equinox/solstice markers.
    pub fn with_seasons(mut self, enabled: bool) -> Self {
        self.seasons = enabled;
        self
    }

    pub fn seasons_enabled(&self) -> bool {
        self.seasons
    }

    /// Add an event that repeats every year on `month`/`day`.
    ///
    /// Feb 29 is accepted and simply never matches in common years.
    pub fn add_recurring(&mut self, month: u32, day: u32, name: &str) -> Result<()> {
        let max_day = days_in_month(REFERENCE_LEAP_YEAR, month)?;
        if day == 0 || day > max_day {
            return Err(Error::InvalidArgument(format!(
                "event '{}': day {} is out of range for month {}",
                name, day, month
            )));
        }
        let name = clean_name(name)?;
        push_unique(self.recurring.entry((month, day)).or_default(), name);
        Ok(())
    }

    /// Add an event for one specific date.
    pub fn add_dated(&mut self, date: NaiveDate, name: &str) -> Result<()> {
        let name = clean_name(name)?;
        push_unique(self.dated.entry(date).or_default(), name);
        Ok(())
    }

    /// Recurring events on `month`/`day`, in insertion order.
    pub fn events_for(&self, month: u32, day: u32) -> Vec<&str> {
        self.recurring
            .get(&(month, day))
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Whether a recurring event called `name` exists on `month`/`day`.
    pub fn has_recurring(&self, month: u32, day: u32, name: &str) -> bool {
        self.events_for(month, day)
            .iter()
            .any(|n| n.eq_ignore_ascii_case(name.trim()))
    }

    /// Every event on `date`: recurring first, then dated, then season
    /// markers.
    pub fn events_on(&self, date: NaiveDate) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.events_for(date.month(), date.day()) {
            push_unique(&mut names, name);
        }
        if let Some(dated) = self.dated.get(&date) {
            for name in dated {
                push_unique(&mut names, name);
            }
        }
        if self.seasons {
            for (marker, at) in season_markers(date.year()) {
                if at.date_naive() == date {
                    push_unique(&mut names, marker.name());
                }
            }
        }
        names
    }

    /// Events for every day of a month that has at least one, keyed by day.
    ///
    /// Season markers are computed once for the year rather than per day.
    pub fn events_in_month(&self, year: i32, month: u32) -> Result<BTreeMap<u32, Vec<String>>> {
        let days = days_in_month(year, month)?;
        let mut by_day: BTreeMap<u32, Vec<String>> = BTreeMap::new();

        for day in 1..=days {
            for name in self.events_for(month, day) {
                push_unique(by_day.entry(day).or_default(), name);
            }
        }

        for (date, names) in &self.dated {
            if date.year() == year && date.month() == month {
                for name in names {
                    push_unique(by_day.entry(date.day()).or_default(), name);
                }
            }
        }

        if self.seasons {
            for (marker, at) in season_markers(year) {
                let date = at.date_naive();
                if date.year() == year && date.month() == month {
                    push_unique(by_day.entry(date.day()).or_default(), marker.name());
                }
            }
        }

        Ok(by_day)
    }

    pub fn is_empty(&self) -> bool {
        self.recurring.is_empty() && self.dated.is_empty() && !self.seasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomEvent;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_builtin_valentines() {
        let table = EventTable::builtin();
        assert_eq!(table.events_for(2, 14), vec!["Valentine's Day"]);
        assert!(table.events_for(2, 15).is_empty());
    }

    #[test]
    fn test_events_for_unknown_day_is_empty() {
        let table = EventTable::new();
        assert!(table.events_for(6, 1).is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_add_recurring_deduplicates() {
        let mut table = EventTable::new();
        table.add_recurring(5, 4, "Star Wars Day").unwrap();
        table.add_recurring(5, 4, "  Star Wars Day ").unwrap();
        assert_eq!(table.events_for(5, 4), vec!["Star Wars Day"]);
    }

    #[test]
    fn test_has_recurring_ignores_case_and_padding() {
        let table = EventTable::builtin();
        assert!(table.has_recurring(12, 25, " christmas day "));
        assert!(!table.has_recurring(12, 26, "Christmas Day"));
        assert!(!table.has_recurring(12, 25, "Boxing Day"));
    }

    #[test]
    fn test_add_recurring_validates() {
        let mut table = EventTable::new();
        assert!(table.add_recurring(2, 29, "Leap Day").is_ok());
        assert!(table.add_recurring(2, 30, "Nope").is_err());
        assert!(table.add_recurring(13, 1, "Nope").is_err());
        assert!(table.add_recurring(4, 0, "Nope").is_err());
        assert!(table.add_recurring(4, 1, "   ").is_err());
    }

    #[test]
    fn test_dated_events_only_match_their_year() {
        let mut table = EventTable::new();
        table.add_dated(ymd(2020, 2, 29), "Leap Day Party").unwrap();

        assert_eq!(table.events_on(ymd(2020, 2, 29)), vec!["Leap Day Party"]);
        assert!(table.events_on(ymd(2024, 2, 29)).is_empty());
    }

    #[test]
    fn test_events_on_orders_recurring_before_dated() {
        let mut table = EventTable::builtin();
        table.add_dated(ymd(2021, 12, 25), "Family dinner").unwrap();

        assert_eq!(
            table.events_on(ymd(2021, 12, 25)),
            vec!["Christmas Day", "Family dinner"]
        );
    }

    #[test]
    fn test_seasons_toggle() {
        let without = EventTable::new();
        assert!(without.events_on(ymd(2020, 3, 20)).is_empty());

        let with = EventTable::new().with_seasons(true);
        assert_eq!(with.events_on(ymd(2020, 3, 20)), vec!["March Equinox"]);
        assert_eq!(with.events_on(ymd(2020, 12, 21)), vec!["December Solstice"]);
    }

    #[test]
    fn test_events_in_month() {
        let table = EventTable::builtin().with_seasons(true);

        let february = table.events_in_month(2020, 2).unwrap();
        assert_eq!(february.len(), 1);
        assert_eq!(february[&14], vec!["Valentine's Day"]);

        let march = table.events_in_month(2020, 3).unwrap();
        assert_eq!(march[&17], vec!["St. Patrick's Day"]);
        assert_eq!(march[&20], vec!["March Equinox"]);

        assert!(table.events_in_month(2020, 13).is_err());
    }

    #[test]
    fn test_recurring_feb_29_skips_common_years() {
        let mut table = EventTable::new();
        table.add_recurring(2, 29, "Leap Day").unwrap();

        assert_eq!(table.events_in_month(2020, 2).unwrap()[&29], vec!["Leap Day"]);
        assert!(table.events_in_month(2021, 2).unwrap().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = EventsConfig {
            holidays: false,
            seasons: false,
            custom: vec![
                CustomEvent {
                    month: 9,
                    day: 19,
                    name: "Talk Like a Pirate Day".to_string(),
                    year: None,
                },
                CustomEvent {
                    month: 7,
                    day: 20,
                    name: "Moon landing".to_string(),
                    year: Some(1969),
                },
            ],
        };

        let table = EventTable::from_config(&config).unwrap();
        assert!(table.events_for(2, 14).is_empty());
        assert_eq!(table.events_for(9, 19), vec!["Talk Like a Pirate Day"]);
        assert_eq!(table.events_on(ymd(1969, 7, 20)), vec!["Moon landing"]);
        assert!(table.events_on(ymd(1970, 7, 20)).is_empty());
    }

    #[test]
    fn test_from_config_rejects_bad_dated_event() {
        let config = EventsConfig {
            holidays: true,
            seasons: false,
            custom: vec![CustomEvent {
                month: 2,
                day: 29,
                name: "Not a leap year".to_string(),
                year: Some(2021),
            }],
        };
        assert!(matches!(
            EventTable::from_config(&config),
            Err(Error::InvalidArgument(_))
        ));
    }
}
