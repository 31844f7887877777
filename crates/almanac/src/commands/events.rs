use almanac_core::dates::month_abbreviation;
use almanac_core::{Clock, Config, EventTable};
use anyhow::{Context, Result};
use chrono::Datelike;

use crate::render::{faint, strong};

pub fn run(
    config: &Config,
    clock: &dyn Clock,
    year: Option<i32>,
    month: Option<u32>,
    color: bool,
) -> Result<()> {
    let table = EventTable::from_config(&config.events).context("invalid [events] config")?;
    let year = year.unwrap_or_else(|| clock.today().year());

    let lines = list(&table, year, month, color)?;
    if lines.is_empty() {
        println!("{}", faint("No events found", color));
    }
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

/// One line per event day in `year`, limited to `month` when given.
fn list(table: &EventTable, year: i32, month: Option<u32>, color: bool) -> Result<Vec<String>> {
    let months: Vec<u32> = match month {
        Some(month) => vec![month],
        None => (1..=12).collect(),
    };

    let mut lines = Vec::new();
    for month in months {
        let label = month_abbreviation(month)?;
        for (day, names) in table.events_in_month(year, month)? {
            let date = format!("{} {} {:>2}", year, label, day);
            lines.push(format!("{}  {}", strong(&date, color), names.join(", ")));
        }
    }
    Ok(lines)
}
