//! Colors derived from the effective theme.
//!
//! `ThemePalette` is the single source of truth for the colors a renderer
//! needs. Renderers with CSS use [`ThemePalette::css_vars_block`]; terminal
//! renderers use the `*_rgb` accessors.

use crate::appearance::Theme;
use crate::config::Config;

// Current-date highlight: a translucent overlay of the foreground tone.
const CURRENT_DATE_OPACITY_DARK: f64 = 0.1;
const CURRENT_DATE_OPACITY_LIGHT: f64 = 0.06;

const BORDER_OPACITY_DARK: f64 = 0.10;
const BORDER_OPACITY_LIGHT: f64 = 0.12;

const FOREGROUND_MUTED_OPACITY: f64 = 0.7;

// Event days get the accent at this strength.
const EVENT_ACCENT_OPACITY: f64 = 0.2;

const DEFAULT_BACKGROUND_DARK: &str = "#1a1a1f";
const DEFAULT_BACKGROUND_LIGHT: &str = "#ffffff";
const DEFAULT_FOREGROUND_DARK: &str = "#ffffff";
const DEFAULT_FOREGROUND_LIGHT: &str = "#1a1a1a";

pub const DEFAULT_ACCENT: &str = "#e06c75";

/// Parse a hex color string to RGB tuple. Returns None if invalid.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let color = color.trim().trim_start_matches('#');

    // Expand shorthand (e.g., "fff" -> "ffffff")
    let color = if color.len() == 3 {
        color.chars().flat_map(|c| [c, c]).collect::<String>()
    } else {
        color.to_string()
    };

    if color.len() != 6 || !color.is_ascii() {
        return None;
    }

    let r = u8::from_str_radix(&color[0..2], 16).ok()?;
    let g = u8::from_str_radix(&color[2..4], 16).ok()?;
    let b = u8::from_str_radix(&color[4..6], 16).ok()?;

    Some((r, g, b))
}

/// Relative luminance per WCAG (0.0 = black, 1.0 = white).
pub fn relative_luminance((r, g, b): (u8, u8, u8)) -> f64 {
    fn channel(c: u8) -> f64 {
        let c_srgb = c as f64 / 255.0;
        if c_srgb <= 0.03928 {
            c_srgb / 12.92
        } else {
            ((c_srgb + 0.055) / 1.055).powf(2.4)
        }
    }

    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// Blend `top` over `bottom`. `alpha` is the weight of `top` (0.0 to 1.0).
pub fn blend_rgb(top: (u8, u8, u8), bottom: (u8, u8, u8), alpha: f64) -> (u8, u8, u8) {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 * alpha + b as f64 * (1.0 - alpha)).round() as u8;
    (mix(top.0, bottom.0), mix(top.1, bottom.1), mix(top.2, bottom.2))
}

/// Convert RGB tuple to hex color string.
pub fn rgb_to_hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Format an RGBA color string, e.g. `rgba(0, 0, 0, 0.06)`.
pub fn rgba_str((r, g, b): (u8, u8, u8), a: f64) -> String {
    format!("rgba({}, {}, {}, {})", r, g, b, a)
}

/// Resolved colors for one effective theme.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemePalette {
    pub theme: Theme,
    pub background: String,
    pub foreground: String,
    pub foreground_muted: String,
    pub border: String,
    pub accent: String,
    /// Text drawn on top of the accent.
    pub accent_text: String,
    /// Background of days that carry events.
    pub event_highlight: String,
    /// Background of the current date cell.
    pub current_date_highlight: String,

    // Kept alongside the strings for terminal rendering and blending.
    background_rgb: (u8, u8, u8),
    foreground_rgb: (u8, u8, u8),
    accent_rgb: (u8, u8, u8),
    highlight_rgb: (u8, u8, u8),
    highlight_alpha: f64,
}

impl ThemePalette {
    /// Palette for `theme`. An invalid or missing `accent` falls back to
    /// [`DEFAULT_ACCENT`].
    pub fn for_theme(theme: Theme, accent: Option<&str>) -> Self {
        let accent_rgb = match accent {
            Some(value) => parse_hex_color(value).unwrap_or_else(|| {
                tracing::warn!("Invalid accent color '{}', using {}", value, DEFAULT_ACCENT);
                default_accent_rgb()
            }),
            None => default_accent_rgb(),
        };

        let (background, foreground, border_opacity, highlight_alpha) = match theme {
            Theme::Dark => (
                DEFAULT_BACKGROUND_DARK,
                DEFAULT_FOREGROUND_DARK,
                BORDER_OPACITY_DARK,
                CURRENT_DATE_OPACITY_DARK,
            ),
            Theme::Light => (
                DEFAULT_BACKGROUND_LIGHT,
                DEFAULT_FOREGROUND_LIGHT,
                BORDER_OPACITY_LIGHT,
                CURRENT_DATE_OPACITY_LIGHT,
            ),
        };

        // Overlays use pure white on dark and pure black on light
        let highlight_rgb = match theme {
            Theme::Dark => (255, 255, 255),
            Theme::Light => (0, 0, 0),
        };

        let background_rgb = parse_hex_color(background).unwrap_or((0, 0, 0));
        let foreground_rgb = parse_hex_color(foreground).unwrap_or((255, 255, 255));

        // Pick whichever of black/white reads better on the accent
        let accent_text = if relative_luminance(accent_rgb) < 0.179 {
            "#ffffff"
        } else {
            "#000000"
        };

        Self {
            theme,
            background: background.to_string(),
            foreground: foreground.to_string(),
            foreground_muted: rgba_str(highlight_rgb, FOREGROUND_MUTED_OPACITY),
            border: rgba_str(highlight_rgb, border_opacity),
            accent: rgb_to_hex(accent_rgb),
            accent_text: accent_text.to_string(),
            event_highlight: rgba_str(accent_rgb, EVENT_ACCENT_OPACITY),
            current_date_highlight: rgba_str(highlight_rgb, highlight_alpha),
            background_rgb,
            foreground_rgb,
            accent_rgb,
            highlight_rgb,
            highlight_alpha,
        }
    }

    /// Palette for `theme` using the configured accent.
    pub fn from_config(theme: Theme, config: &Config) -> Self {
        Self::for_theme(theme, Some(&config.theme.accent))
    }

    /// CSS class for the root surface: "dark" or "light".
    pub fn css_class(&self) -> &'static str {
        self.theme.as_str()
    }

    /// The current-date highlight flattened onto the background, for
    /// surfaces that cannot draw translucency.
    pub fn current_date_solid(&self) -> (u8, u8, u8) {
        blend_rgb(self.highlight_rgb, self.background_rgb, self.highlight_alpha)
    }

    /// Event highlight flattened onto the background.
    pub fn event_solid(&self) -> (u8, u8, u8) {
        blend_rgb(self.accent_rgb, self.background_rgb, EVENT_ACCENT_OPACITY)
    }

    pub fn background_rgb(&self) -> (u8, u8, u8) {
        self.background_rgb
    }

    pub fn foreground_rgb(&self) -> (u8, u8, u8) {
        self.foreground_rgb
    }

    pub fn accent_rgb(&self) -> (u8, u8, u8) {
        self.accent_rgb
    }

    /// Muted foreground flattened onto the background.
    pub fn muted_rgb(&self) -> (u8, u8, u8) {
        blend_rgb(self.highlight_rgb, self.background_rgb, FOREGROUND_MUTED_OPACITY)
    }

    /// Generate the :root CSS variable block.
    pub fn css_vars_block(&self) -> String {
        format!(
            r#"
:root {{
    /* ===== Surface ===== */
    --color-background: {background};
    --color-border: {border};

    /* ===== Text ===== */
    --color-foreground: {foreground};
    --color-foreground-muted: {foreground_muted};

    /* ===== Accent ===== */
    --color-accent: {accent};
    --color-accent-text: {accent_text};

    /* ===== Calendar ===== */
    --color-event-highlight: {event_highlight};
    --color-current-date: {current_date};
    --color-current-date-solid: {current_date_solid};
}}
"#,
            background = self.background,
            border = self.border,
            foreground = self.foreground,
            foreground_muted = self.foreground_muted,
            accent = self.accent,
            accent_text = self.accent_text,
            event_highlight = self.event_highlight,
            current_date = self.current_date_highlight,
            current_date_solid = rgb_to_hex(self.current_date_solid()),
        )
    }
}

fn default_accent_rgb() -> (u8, u8, u8) {
    (0xe0, 0x6c, 0x75)
}
