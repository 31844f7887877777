use almanac_core::{CalendarView, Clock, Config, EventTable, MonthGrid, Theme, ThemePalette};
use anyhow::{Context, Result};
use serde::Serialize;

use crate::commands::theme::resolver;
use crate::render::{Painter, render_month};

/// JSON shape of `show --json`.
#[derive(Serialize)]
struct ShowOutput<'a> {
    theme: Theme,
    current_date_highlight: &'a str,
    #[serde(flatten)]
    grid: &'a MonthGrid,
}

pub fn run(
    config: &Config,
    clock: &dyn Clock,
    year: Option<i32>,
    month: Option<u32>,
    json: bool,
    color: bool,
) -> Result<()> {
    let events = EventTable::from_config(&config.events).context("invalid [events] config")?;
    let mut view = CalendarView::new(clock, events, config.week_start());

    if year.is_some() || month.is_some() {
        let shown = view.shown();
        view.go_to(year.unwrap_or(shown.year), month.unwrap_or(shown.month))?;
    }

    let grid = view.grid()?;
    let palette = resolver(config).palette();

    if json {
        println!("{}", to_json(&grid, &palette)?);
        return Ok(());
    }

    print!("{}", render_month(&grid, &Painter::new(&palette, color)));
    Ok(())
}

fn to_json(grid: &MonthGrid, palette: &ThemePalette) -> Result<String> {
    let output = ShowOutput {
        theme: palette.theme,
        current_date_highlight: &palette.current_date_highlight,
        grid,
    };
    Ok(serde_json::to_string_pretty(&output)?)
}
