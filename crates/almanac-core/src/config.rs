//! Configuration types and parsing.
//!
//! The Config type is a plain serialization schema. Typed views of its
//! string-valued settings (week start, default appearance mode) are exposed
//! through accessor methods after `validate()` has accepted them.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use toml::Table;

use chrono::NaiveDate;

use crate::appearance::AppearanceMode;
use crate::dates::{WeekStart, days_in_month};
use crate::error::{Error, Result};
use crate::events::EventTable;
use crate::theme::parse_hex_color;

/// Known valid values for calendar.week_start.
const VALID_WEEK_STARTS: &[&str] = &["sunday", "monday"];

/// Known valid values for appearance.default_mode.
const VALID_APPEARANCE_MODES: &[&str] = &["system", "auto", "light", "dark"];

/// Embedded default configuration TOML, compiled into the binary.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../../config.toml");

/// Result of loading a configuration file.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Path where config was found, if any.
    pub source: Option<PathBuf>,
    /// Whether defaults were used (no config file found).
    pub used_defaults: bool,
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Month grid layout.
    pub calendar: CalendarConfig,

    /// Light/dark appearance.
    pub appearance: AppearanceConfig,

    /// Palette tweaks.
    pub theme: ThemeConfig,

    /// Holiday and custom event sources.
    pub events: EventsConfig,
}

impl Config {
    /// Load configuration from the embedded default TOML string.
    pub fn from_default_toml() -> Result<Self> {
        let config: Config = toml::from_str(DEFAULT_CONFIG_TOML)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, merging with embedded defaults.
    ///
    /// Returns an error if the file doesn't exist or can't be parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::load_with_defaults(&content)
    }

    /// Parse a TOML string, deep-merged over the embedded defaults (user
    /// values win).
    pub fn load_with_defaults(user_toml: &str) -> Result<Self> {
        let mut base: Table = toml::from_str(DEFAULT_CONFIG_TOML)?;
        let user: Table = toml::from_str(user_toml)?;

        deep_merge_toml(&mut base, user);

        let config: Config = base.try_into()?;
        Ok(config)
    }

    /// Find and load configuration using the XDG lookup chain.
    ///
    /// If `explicit_path` is `Some`, that path is used directly and an error
    /// is returned if it doesn't exist or can't be parsed (no fallback).
    ///
    /// Otherwise searches, in order:
    /// 1. `$XDG_CONFIG_HOME/almanac/config.toml`
    /// 2. `~/.config/almanac/config.toml`
    /// 3. `./config.toml`
    ///
    /// A file that exists but fails to load is an error. Only when no file
    /// exists at all are the embedded defaults used.
    pub fn find_and_load(explicit_path: Option<&Path>) -> Result<ConfigLoadResult> {
        if let Some(path) = explicit_path {
            let config = Self::load(path)?;
            return Ok(ConfigLoadResult {
                config,
                source: Some(path.to_path_buf()),
                used_defaults: false,
            });
        }

        let search_paths = Self::config_search_paths();

        for path in &search_paths {
            if !path.exists() {
                continue;
            }
            match Self::load(path) {
                Ok(config) => {
                    return Ok(ConfigLoadResult {
                        config,
                        source: Some(path.clone()),
                        used_defaults: false,
                    });
                }
                Err(e) => {
                    tracing::error!("Config file {:?} exists but failed to load: {}", path, e);
                    return Err(e);
                }
            }
        }

        tracing::info!("No config file found, using built-in default config");
        tracing::debug!(
            "Searched: {}",
            search_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(ConfigLoadResult {
            config: Self::from_default_toml()?,
            source: None,
            used_defaults: true,
        })
    }

    /// Get the list of paths to search for config files.
    pub fn config_search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg_config).join("almanac/config.toml"));
        }

        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/almanac/config.toml"));
        }

        paths.push(PathBuf::from("config.toml"));

        paths
    }

    /// Validate the configuration, collecting every invalid value.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        let week_start = self.calendar.week_start.to_ascii_lowercase();
        if !VALID_WEEK_STARTS.contains(&week_start.as_str()) {
            errors.push(format!(
                "calendar.week_start: invalid value '{}', expected one of: {}",
                self.calendar.week_start,
                VALID_WEEK_STARTS.join(", ")
            ));
        }

        let mode = self.appearance.default_mode.to_ascii_lowercase();
        if !VALID_APPEARANCE_MODES.contains(&mode.as_str()) {
            errors.push(format!(
                "appearance.default_mode: invalid value '{}', expected one of: {}",
                self.appearance.default_mode,
                VALID_APPEARANCE_MODES.join(", ")
            ));
        }

        let accent = self.theme.accent.as_str();
        if !accent.starts_with('#') || parse_hex_color(accent).is_none() {
            errors.push(format!(
                "theme.accent: invalid value '{}', expected a hex color like '#e06c75'",
                accent
            ));
        }

        for (i, event) in self.events.custom.iter().enumerate() {
            if let Some(problem) = event.problem() {
                errors.push(format!("events.custom[{}]: {}", i, problem));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(Error::ConfigValidation(errors))
        }
    }

    /// Non-fatal issues that probably indicate a mistake.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let builtin = EventTable::builtin();

        for (i, event) in self.events.custom.iter().enumerate() {
            if event.year.is_some() || !self.events.holidays {
                continue;
            }
            if builtin.has_recurring(event.month, event.day, &event.name) {
                warnings.push(format!(
                    "events.custom[{}]: '{}' is already a built-in holiday",
                    i, event.name
                ));
            }
        }

        if !self.events.holidays && !self.events.seasons && self.events.custom.is_empty() {
            warnings.push("events: every event source is disabled".to_string());
        }

        warnings
    }

    /// First day of the week. Falls back to Sunday for unvalidated input.
    pub fn week_start(&self) -> WeekStart {
        self.calendar.week_start.parse().unwrap_or_default()
    }

    /// Appearance mode used when nothing has been persisted yet.
    pub fn default_mode(&self) -> AppearanceMode {
        self.appearance.default_mode.parse().unwrap_or_default()
    }

    /// Human-readable summary of the configuration.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();

        lines.push("Calendar:".to_string());
        lines.push(format!("  week_start: {}", self.calendar.week_start));

        lines.push("\nAppearance:".to_string());
        lines.push(format!("  default_mode: {}", self.appearance.default_mode));
        if let Some(ref path) = self.appearance.state_file {
            lines.push(format!("  state_file: {}", path.display()));
        }

        lines.push("\nTheme:".to_string());
        lines.push(format!("  accent: {}", self.theme.accent));

        lines.push("\nEvents:".to_string());
        lines.push(format!(
            "  holidays: {}",
            if self.events.holidays {
                "enabled"
            } else {
                "disabled"
            }
        ));
        lines.push(format!(
            "  seasons: {}",
            if self.events.seasons {
                "enabled"
            } else {
                "disabled"
            }
        ));
        lines.push(format!("  custom: {} event(s)", self.events.custom.len()));
        for event in &self.events.custom {
            match event.year {
                Some(year) => lines.push(format!(
                    "    - {}-{:02}-{:02} {}",
                    year, event.month, event.day, event.name
                )),
                None => lines.push(format!(
                    "    - {:02}-{:02} {} (yearly)",
                    event.month, event.day, event.name
                )),
            }
        }

        lines.join("\n")
    }
}

/// Deep merge two TOML tables, with `overlay` values taking precedence.
///
/// Nested tables merge recursively. Arrays and scalars are replaced.
fn deep_merge_toml(base: &mut Table, overlay: Table) {
    for (key, overlay_value) in overlay {
        match (base.get_mut(&key), overlay_value) {
            (Some(toml::Value::Table(base_table)), toml::Value::Table(overlay_table)) => {
                deep_merge_toml(base_table, overlay_table);
            }
            (_, overlay_value) => {
                base.insert(key, overlay_value);
            }
        }
    }
}

/// Month grid layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalendarConfig {
    /// "sunday" or "monday".
    pub week_start: String,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_start: "sunday".to_string(),
        }
    }
}

/// Appearance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppearanceConfig {
    /// "system", "light" or "dark".
    pub default_mode: String,

    /// Override for the persisted preference file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_file: Option<PathBuf>,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            default_mode: "system".to_string(),
            state_file: None,
        }
    }
}

/// Palette configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    /// Hex accent color for event days.
    pub accent: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            accent: "#e06c75".to_string(),
        }
    }
}

/// Event sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
    /// Include the built-in fixed-date holidays.
    pub holidays: bool,

    /// Include computed equinoxes and solstices.
    pub seasons: bool,

    /// User-defined events.
    pub custom: Vec<CustomEvent>,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            holidays: true,
            seasons: true,
            custom: Vec::new(),
        }
    }
}

/// A user-defined event. Without `year` it repeats annually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomEvent {
    pub month: u32,
    pub day: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

impl CustomEvent {
    /// Describe what is wrong with this entry, if anything.
    fn problem(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("name must not be empty".to_string());
        }
        match self.year {
            Some(year) => {
                if NaiveDate::from_ymd_opt(year, self.month, self.day).is_none() {
                    return Some(format!(
                        "{}-{:02}-{:02} is not a valid date",
                        year, self.month, self.day
                    ));
                }
            }
            None => {
                // Leap year so Feb 29 is allowed for yearly events
                let Ok(max_day) = days_in_month(2000, self.month) else {
                    return Some(format!("month {} must be in 1..=12", self.month));
                };
                if self.day == 0 || self.day > max_day {
                    return Some(format!(
                        "day {} is out of range for month {}",
                        self.day, self.month
                    ));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_toml_matches_typed_defaults() {
        let from_toml = Config::from_default_toml().unwrap();
        let typed = Config::default();

        assert_eq!(from_toml.calendar.week_start, typed.calendar.week_start);
        assert_eq!(from_toml.appearance.default_mode, typed.appearance.default_mode);
        assert_eq!(from_toml.appearance.state_file, typed.appearance.state_file);
        assert_eq!(from_toml.theme.accent, typed.theme.accent);
        assert_eq!(from_toml.events.holidays, typed.events.holidays);
        assert_eq!(from_toml.events.seasons, typed.events.seasons);
        assert_eq!(from_toml.events.custom, typed.events.custom);
    }

    #[test]
    fn test_default_config_validates() {
        let config = Config::from_default_toml().unwrap();
        config.validate().unwrap();
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_load_with_defaults_empty_config() {
        let config = Config::load_with_defaults("").unwrap();
        assert_eq!(config.week_start(), WeekStart::Sunday);
        assert_eq!(config.default_mode(), AppearanceMode::System);
        assert!(config.events.holidays);
    }

    #[test]
    fn test_load_with_defaults_nested_override() {
        let config = Config::load_with_defaults(
            r#"
[calendar]
week_start = "monday"

[events]
seasons = false
"#,
        )
        .unwrap();

        assert_eq!(config.week_start(), WeekStart::Monday);
        assert!(!config.events.seasons);
        // Sibling keys keep their defaults
        assert!(config.events.holidays);
        assert_eq!(config.theme.accent, "#e06c75");
    }

    #[test]
    fn test_load_with_defaults_custom_events() {
        let config = Config::load_with_defaults(
            r#"
[[events.custom]]
month = 5
day = 4
name = "Star Wars Day"

[[events.custom]]
month = 7
day = 20
name = "Moon landing"
year = 1969
"#,
        )
        .unwrap();

        assert_eq!(config.events.custom.len(), 2);
        assert_eq!(config.events.custom[0].year, None);
        assert_eq!(config.events.custom[1].year, Some(1969));
        config.validate().unwrap();
    }

    #[test]
    fn test_load_with_defaults_rejects_unknown_fields() {
        let result = Config::load_with_defaults(
            r#"
[calendar]
week_start = "monday"
weekstart = "sunday"
"#,
        );
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_load_with_defaults_rejects_unknown_section() {
        let result = Config::load_with_defaults("[widgets]\nleft = []\n");
        assert!(matches!(result, Err(Error::ConfigParse(_))));
    }

    #[test]
    fn test_deep_merge_toml_tables() {
        let mut base: Table = toml::from_str("[a]\nx = 1\ny = 2\n").unwrap();
        let overlay: Table = toml::from_str("[a]\ny = 3\nz = 4\n").unwrap();

        deep_merge_toml(&mut base, overlay);

        let a = base["a"].as_table().unwrap();
        assert_eq!(a["x"].as_integer(), Some(1));
        assert_eq!(a["y"].as_integer(), Some(3));
        assert_eq!(a["z"].as_integer(), Some(4));
    }

    #[test]
    fn test_deep_merge_toml_arrays_replace() {
        let mut base: Table = toml::from_str("list = [1, 2, 3]\n").unwrap();
        let overlay: Table = toml::from_str("list = [9]\n").unwrap();

        deep_merge_toml(&mut base, overlay);

        assert_eq!(base["list"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_validate_invalid_week_start() {
        let mut config = Config::default();
        config.calendar.week_start = "friday".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("calendar.week_start"));
    }

    #[test]
    fn test_validate_invalid_default_mode() {
        let mut config = Config::default();
        config.appearance.default_mode = "sepia".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("appearance.default_mode"));
    }

    #[test]
    fn test_validate_mode_is_case_insensitive() {
        let mut config = Config::default();
        config.appearance.default_mode = "Dark".to_string();
        config.validate().unwrap();
        assert_eq!(config.default_mode(), AppearanceMode::Dark);
    }

    #[test]
    fn test_validate_invalid_accent() {
        let mut config = Config::default();
        config.theme.accent = "red".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("theme.accent"));
    }

    #[test]
    fn test_validate_bad_custom_events() {
        let mut config = Config::default();
        config.events.custom = vec![
            CustomEvent {
                month: 2,
                day: 30,
                name: "Impossible".to_string(),
                year: None,
            },
            CustomEvent {
                month: 2,
                day: 29,
                name: "Not leap".to_string(),
                year: Some(2019),
            },
            CustomEvent {
                month: 13,
                day: 1,
                name: "Nope".to_string(),
                year: None,
            },
            CustomEvent {
                month: 1,
                day: 2,
                name: "  ".to_string(),
                year: None,
            },
        ];

        match config.validate() {
            Err(Error::ConfigValidation(errors)) => {
                assert_eq!(errors.len(), 4);
                assert!(errors[0].starts_with("events.custom[0]"));
                assert!(errors[3].contains("name"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_multiple_errors() {
        let mut config = Config::default();
        config.calendar.week_start = "friday".to_string();
        config.appearance.default_mode = "sepia".to_string();
        config.theme.accent = "#zzz".to_string();

        match config.validate() {
            Err(Error::ConfigValidation(errors)) => assert_eq!(errors.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_warning_for_duplicate_builtin() {
        let mut config = Config::default();
        config.events.custom.push(CustomEvent {
            month: 2,
            day: 14,
            name: "valentine's day".to_string(),
            year: None,
        });

        let warnings = config.warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("built-in"));

        config.events.holidays = false;
        assert!(config.warnings().is_empty());
    }

    #[test]
    fn test_warning_when_everything_disabled() {
        let mut config = Config::default();
        config.events.holidays = false;
        config.events.seasons = false;
        assert_eq!(config.warnings().len(), 1);
    }

    #[test]
    fn test_config_search_paths() {
        let paths = Config::config_search_paths();
        assert!(!paths.is_empty());
        assert_eq!(paths.last().unwrap(), &PathBuf::from("config.toml"));
    }

    #[test]
    fn test_summary_sections() {
        let mut config = Config::default();
        config.events.custom.push(CustomEvent {
            month: 7,
            day: 20,
            name: "Moon landing".to_string(),
            year: Some(1969),
        });

        let summary = config.summary();
        assert!(summary.contains("Calendar:"));
        assert!(summary.contains("Appearance:"));
        assert!(summary.contains("Theme:"));
        assert!(summary.contains("Events:"));
        assert!(summary.contains("1969-07-20 Moon landing"));
    }
}
