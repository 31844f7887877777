//! almanac-core - Calendar grid, events and light/dark appearance.

pub mod appearance;
pub mod config;
pub mod dates;
pub mod error;
pub mod events;
pub mod grid;
pub mod logging;
pub mod seasons;
pub mod store;
pub mod theme;
pub mod view;

pub use appearance::{
    AppearanceMode, AppearancePreference, AppearanceResolver, EnvSystemPreference,
    ManualSystemPreference, ModeChange, StaticSystemPreference, Subscription, SystemPreference,
    Theme,
};
pub use config::{Config, ConfigLoadResult};
pub use dates::{Clock, DayRollover, FixedClock, SystemClock, WeekStart, YearMonth};
pub use error::{Error, Result};
pub use events::EventTable;
pub use grid::{DayCell, MonthGrid, build_month_grid, build_month_grid_with};
pub use store::{FileStore, MemoryStore, PreferenceStore};
pub use theme::{ThemePalette, parse_hex_color};
pub use view::CalendarView;
