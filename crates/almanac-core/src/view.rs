//! Month navigation state for long-lived hosts.

use chrono::NaiveDate;

use crate::dates::{Clock, DayRollover, WeekStart, YearMonth};
use crate::error::Result;
use crate::events::EventTable;
use crate::grid::{MonthGrid, build_month_grid_with};

/// The month a host is showing, plus what it needs to rebuild the grid.
///
/// Navigation always works on whole months, so there is no day-of-month to
/// clamp when moving from a 31-day month into February.
#[derive(Debug, Clone)]
pub struct CalendarView {
    shown: YearMonth,
    events: EventTable,
    week_start: WeekStart,
    rollover: DayRollover,
}

impl CalendarView {
    /// Start on the clock's current month.
    pub fn new(clock: &dyn Clock, events: EventTable, week_start: WeekStart) -> Self {
        let rollover = DayRollover::new(clock);
        Self {
            shown: YearMonth::from_date(rollover.current()),
            events,
            week_start,
            rollover,
        }
    }

    pub fn shown(&self) -> YearMonth {
        self.shown
    }

    pub fn today(&self) -> NaiveDate {
        self.rollover.current()
    }

    pub fn events(&self) -> &EventTable {
        &self.events
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    /// Whether the shown month contains today.
    pub fn is_current_month(&self) -> bool {
        self.shown.contains(self.today())
    }

    pub fn prev(&mut self) -> YearMonth {
        self.shown = self.shown.prev();
        self.shown
    }

    pub fn next(&mut self) -> YearMonth {
        self.shown = self.shown.next();
        self.shown
    }

    pub fn go_to(&mut self, year: i32, month: u32) -> Result<YearMonth> {
        self.shown = YearMonth::new(year, month)?;
        Ok(self.shown)
    }

    pub fn go_to_today(&mut self) -> YearMonth {
        self.shown = YearMonth::from_date(self.today());
        self.shown
    }

    /// Poll the clock. When the day has changed, "today" moves and a view
    /// that was on the old current month follows it.
    ///
    /// Returns true when the host should re-render.
    pub fn refresh(&mut self, clock: &dyn Clock) -> bool {
        let was_current = self.is_current_month();
        let Some(today) = self.rollover.check(clock) else {
            return false;
        };

        if was_current {
            self.shown = YearMonth::from_date(today);
        }
        tracing::debug!(%today, shown = %self.shown, "Calendar view refreshed");
        true
    }

    /// Grid for the shown month.
    pub fn grid(&self) -> Result<MonthGrid> {
        build_month_grid_with(
            self.shown.year,
            self.shown.month,
            &self.events,
            self.today(),
            self.week_start,
        )
    }
}
