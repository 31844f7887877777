//! Month grid generation.
//!
//! Every day of the requested month gets exactly one [`DayCell`]. A day's
//! position comes from the weekday of the 1st: with `offset` leading blanks,
//! day `d` sits in slot `offset + d - 1`, i.e. row `slot / 7`, column
//! `slot % 7`. The worst case (31 days starting in the last column) needs
//! six rows, so no month ever lands past row index 5.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::dates::{
    WeekStart, YearMonth, days_in_month, month_abbreviation, month_name, weekday_offset,
};
use crate::error::{Error, Result};
use crate::events::EventTable;

/// Columns per grid row.
pub const DAYS_PER_WEEK: u32 = 7;

/// Rows the layout provides. Enough for any month.
pub const MAX_WEEK_ROWS: u32 = 6;

/// One day in the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<String>,
    /// 0-based row within the grid.
    pub week_row: u32,
    /// 0-based column, 0 being the configured first day of the week.
    pub column: u32,
}

impl DayCell {
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

/// All cells of one displayed month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    /// Abbreviated month name, e.g. "Feb".
    pub label: String,
    pub week_start: WeekStart,
    /// Empty slots before day 1 in the first row.
    pub leading_blanks: u32,
    pub row_count: u32,
    pub cells: Vec<DayCell>,
}

impl MonthGrid {
    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }

    /// Cell for day-of-month `day`, if the month has it.
    pub fn cell(&self, day: u32) -> Option<&DayCell> {
        let index = day.checked_sub(1)? as usize;
        self.cells.get(index)
    }

    /// The cell marked as today, if today falls in this month.
    pub fn today(&self) -> Option<&DayCell> {
        self.cells.iter().find(|c| c.is_today)
    }

    /// Cells that carry at least one event.
    pub fn event_days(&self) -> impl Iterator<Item = &DayCell> {
        self.cells.iter().filter(|c| c.has_events())
    }

    /// Cells arranged into rows of seven, `None` for blank slots.
    pub fn rows(&self) -> Vec<[Option<&DayCell>; DAYS_PER_WEEK as usize]> {
        let mut rows = vec![[None; DAYS_PER_WEEK as usize]; self.row_count as usize];
        for cell in &self.cells {
            if let Some(row) = rows.get_mut(cell.week_row as usize) {
                row[cell.column as usize] = Some(cell);
            }
        }
        rows
    }

    /// "February 2020".
    pub fn title(&self) -> String {
        match month_name(self.month) {
            Ok(name) => format!("{} {}", name, self.year),
            Err(_) => format!("{} {}", self.label, self.year),
        }
    }
}

/// Build the grid for `month` of `year` with Sunday-first weeks.
///
/// `today` marks at most one cell; it may lie outside the month.
pub fn build_month_grid(
    year: i32,
    month: u32,
    events: &EventTable,
    today: NaiveDate,
) -> Result<MonthGrid> {
    build_month_grid_with(year, month, events, today, WeekStart::Sunday)
}

/// Build the grid with an explicit first day of the week.
pub fn build_month_grid_with(
    year: i32,
    month: u32,
    events: &EventTable,
    today: NaiveDate,
    week_start: WeekStart,
) -> Result<MonthGrid> {
    let year_month = YearMonth::new(year, month)?;
    let days = days_in_month(year, month)?;
    let first = year_month.first_day()?;
    let leading_blanks = weekday_offset(first, week_start);
    let mut by_day: BTreeMap<u32, Vec<String>> = events.events_in_month(year, month)?;

    let mut cells = Vec::with_capacity(days as usize);
    for day in 1..=days {
        let date = first.with_day(day).ok_or_else(|| {
            Error::InvalidArgument(format!("{} has no day {}", year_month, day))
        })?;
        let slot = leading_blanks + day - 1;
        cells.push(DayCell {
            date,
            is_today: date == today,
            events: by_day.remove(&day).unwrap_or_default(),
            week_row: slot / DAYS_PER_WEEK,
            column: slot % DAYS_PER_WEEK,
        });
    }

    let row_count = (leading_blanks + days).div_ceil(DAYS_PER_WEEK);
    debug_assert!(row_count <= MAX_WEEK_ROWS);

    tracing::trace!(
        %year_month,
        leading_blanks,
        row_count,
        event_days = cells.iter().filter(|c| c.has_events()).count(),
        "Built month grid"
    );

    Ok(MonthGrid {
        year,
        month,
        label: month_abbreviation(month)?.to_string(),
        week_start,
        leading_blanks,
        row_count,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::{Clock, FixedClock};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn february_2020() -> MonthGrid {
        let clock = FixedClock::at("2020-02-01T12:00:00Z").unwrap();
        build_month_grid(2020, 2, &EventTable::builtin(), clock.today()).unwrap()
    }

    #[test]
    fn test_leap_february_label_and_valentines() {
        let grid = february_2020();
        assert_eq!(grid.label, "Feb");
        assert_eq!(grid.title(), "February 2020");

        let valentines = grid.cell(14).unwrap();
        assert_eq!(valentines.events, vec!["Valentine's Day"]);
    }

    #[test]
    fn test_leap_february_has_29th_within_rows() {
        let grid = february_2020();
        assert_eq!(grid.cells.len(), 29);

        let last = grid.cell(29).unwrap();
        assert_eq!(last.date, ymd(2020, 2, 29));
        // Feb 1 2020 is a Saturday: 6 blanks, so the 29th is in row 4
        assert_eq!(grid.leading_blanks, 6);
        assert_eq!(last.week_row, 4);
        assert_eq!(last.column, 6);
        assert!(last.week_row < MAX_WEEK_ROWS);
        assert_eq!(grid.row_count, 5);
    }

    #[test]
    fn test_leap_february_has_no_30th() {
        let grid = february_2020();
        assert!(grid.cell(30).is_none());
        assert!(grid.cells.iter().all(|c| c.date.month() == 2));
    }

    #[test]
    fn test_today_is_marked_once() {
        let grid = february_2020();
        let today: Vec<u32> = grid
            .cells
            .iter()
            .filter(|c| c.is_today)
            .map(|c| c.day())
            .collect();
        assert_eq!(today, vec![1]);
        assert_eq!(grid.today().unwrap().day(), 1);
    }

    #[test]
    fn test_today_outside_month_marks_nothing() {
        let grid = build_month_grid(2020, 3, &EventTable::new(), ymd(2020, 2, 1)).unwrap();
        assert!(grid.today().is_none());
    }

    #[test]
    fn test_invalid_month() {
        let table = EventTable::new();
        let today = ymd(2020, 1, 1);
        assert!(matches!(
            build_month_grid(2020, 0, &table, today),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            build_month_grid(2020, 13, &table, today),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_every_month_fits_and_is_complete() {
        let table = EventTable::new();
        let today = ymd(2000, 1, 1);
        for week_start in [WeekStart::Sunday, WeekStart::Monday] {
            for year in 1890..=2110 {
                for month in 1..=12 {
                    let grid =
                        build_month_grid_with(year, month, &table, today, week_start).unwrap();
                    let expected = days_in_month(year, month).unwrap();

                    assert_eq!(grid.cells.len() as u32, expected);
                    assert!(grid.row_count <= MAX_WEEK_ROWS);

                    let mut previous_row = 0;
                    for (i, cell) in grid.cells.iter().enumerate() {
                        assert_eq!(cell.day(), i as u32 + 1);
                        assert!(cell.week_row >= previous_row);
                        assert!(cell.week_row < MAX_WEEK_ROWS);
                        assert_eq!(
                            cell.week_row * DAYS_PER_WEEK + cell.column,
                            grid.leading_blanks + cell.day() - 1
                        );
                        assert_eq!(cell.column, weekday_offset(cell.date, week_start));
                        previous_row = cell.week_row;
                    }
                }
            }
        }
    }

    #[test]
    fn test_six_row_month() {
        // August 2020 starts on a Saturday and has 31 days
        let grid = build_month_grid(2020, 8, &EventTable::new(), ymd(2020, 8, 1)).unwrap();
        assert_eq!(grid.row_count, 6);
        assert_eq!(grid.cell(31).unwrap().week_row, 5);
    }

    #[test]
    fn test_four_row_february() {
        // February 2015 starts on a Sunday and has 28 days
        let grid = build_month_grid(2015, 2, &EventTable::new(), ymd(2015, 2, 1)).unwrap();
        assert_eq!(grid.leading_blanks, 0);
        assert_eq!(grid.row_count, 4);
    }

    #[test]
    fn test_monday_start_shifts_columns() {
        let grid =
            build_month_grid_with(2020, 2, &EventTable::new(), ymd(2020, 2, 1), WeekStart::Monday)
                .unwrap();
        assert_eq!(grid.leading_blanks, 5);
        assert_eq!(grid.cell(29).unwrap().week_row, 4);
        assert_eq!(grid.cell(29).unwrap().column, 5);
    }

    #[test]
    fn test_rows_layout() {
        let grid = february_2020();
        let rows = grid.rows();
        assert_eq!(rows.len(), 5);
        assert!(rows[0][..6].iter().all(Option::is_none));
        assert_eq!(rows[0][6].unwrap().day(), 1);
        assert_eq!(rows[4][6].unwrap().day(), 29);
    }

    #[test]
    fn test_serializes_for_renderers() {
        let grid = february_2020();
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["label"], "Feb");
        assert_eq!(json["week_start"], "sunday");
        assert_eq!(json["cells"][13]["events"][0], "Valentine's Day");
        assert_eq!(json["cells"][0]["is_today"], true);
        assert_eq!(json["cells"][28]["date"], "2020-02-29");
    }
}
