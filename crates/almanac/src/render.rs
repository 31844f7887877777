//! Terminal rendering of month grids.
//!
//! Colors come from the effective [`ThemePalette`] so that the current-date
//! highlight matches what a graphical renderer would draw.

use almanac_core::{MonthGrid, ThemePalette};
use owo_colors::OwoColorize;

/// Width of one rendered week row: seven two-character cells plus gaps.
const ROW_WIDTH: usize = 7 * 3 - 1;

/// Bold `text` when color is on.
pub fn strong(text: &str, color: bool) -> String {
    if color {
        text.bold().to_string()
    } else {
        text.to_string()
    }
}

/// Dim `text` when color is on.
pub fn faint(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_string()
    }
}

/// Applies palette colors, or nothing when color is off.
pub struct Painter<'a> {
    palette: &'a ThemePalette,
    color: bool,
}

impl<'a> Painter<'a> {
    pub fn new(palette: &'a ThemePalette, color: bool) -> Self {
        Self { palette, color }
    }

    fn title(&self, text: &str) -> String {
        strong(text, self.color)
    }

    fn muted(&self, text: &str) -> String {
        if self.color {
            let (r, g, b) = self.palette.muted_rgb();
            text.truecolor(r, g, b).to_string()
        } else {
            text.to_string()
        }
    }

    fn day(&self, text: &str, is_today: bool, has_events: bool) -> String {
        if !self.color {
            return text.to_string();
        }

        let (ar, ag, ab) = self.palette.accent_rgb();
        let (hr, hg, hb) = self.palette.current_date_solid();
        let (er, eg, eb) = self.palette.event_solid();
        match (is_today, has_events) {
            (true, true) => text
                .truecolor(ar, ag, ab)
                .on_truecolor(hr, hg, hb)
                .bold()
                .to_string(),
            (true, false) => text.on_truecolor(hr, hg, hb).bold().to_string(),
            (false, true) => text
                .truecolor(ar, ag, ab)
                .on_truecolor(er, eg, eb)
                .to_string(),
            (false, false) => text.to_string(),
        }
    }

    fn accent(&self, text: &str) -> String {
        if self.color {
            let (r, g, b) = self.palette.accent_rgb();
            text.truecolor(r, g, b).to_string()
        } else {
            text.to_string()
        }
    }
}

/// Draw `grid` followed by a legend of its event days.
pub fn render_month(grid: &MonthGrid, painter: &Painter<'_>) -> String {
    let mut lines = Vec::with_capacity(grid.row_count as usize + 4);

    let title = grid.title();
    let pad = ROW_WIDTH.saturating_sub(title.len()) / 2;
    lines.push(format!("{}{}", " ".repeat(pad), painter.title(&title)));
    lines.push(painter.muted(&grid.week_start.headers().join(" ")));

    for row in grid.rows() {
        let cells: Vec<String> = row
            .iter()
            .map(|slot| match slot {
                Some(cell) => {
                    painter.day(&format!("{:>2}", cell.day()), cell.is_today, cell.has_events())
                }
                None => "  ".to_string(),
            })
            .collect();
        lines.push(cells.join(" ").trim_end().to_string());
    }

    let legend = render_legend(grid, painter);
    if !legend.is_empty() {
        lines.push(String::new());
        lines.extend(legend);
    }

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// One line per event day: "14  Valentine's Day".
fn render_legend(grid: &MonthGrid, painter: &Painter<'_>) -> Vec<String> {
    grid.event_days()
        .map(|cell| {
            format!(
                "{}  {}",
                painter.accent(&format!("{:>2}", cell.day())),
                cell.events.join(", ")
            )
        })
        .collect()
}
