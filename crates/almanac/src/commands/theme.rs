use almanac_core::{
    AppearanceMode, AppearanceResolver, Config, EnvSystemPreference, FileStore, MemoryStore,
    PreferenceStore,
};
use anyhow::Result;
use tracing::warn;

use crate::render::{faint, strong};

/// Resolver backed by the configured state file and the environment's
/// color-scheme signal.
pub fn resolver(config: &Config) -> AppearanceResolver {
    let system = EnvSystemPreference::from_env();
    let store: Box<dyn PreferenceStore> = match FileStore::from_config(config) {
        Some(store) => Box::new(store),
        None => {
            warn!("No state directory available; appearance changes will not be saved");
            Box::new(MemoryStore::new())
        }
    };

    AppearanceResolver::with_default_mode(&system, store, config.default_mode())
        .with_accent(config.theme.accent.clone())
}

pub fn get(config: &Config, json: bool, color: bool) -> Result<()> {
    print!("{}", report(&resolver(config), json, color)?);
    Ok(())
}

pub fn set(config: &Config, mode: AppearanceMode, color: bool) -> Result<()> {
    println!("{}", apply(&resolver(config), mode, color));
    Ok(())
}

/// Current preference as JSON or as aligned `key: value` lines.
fn report(resolver: &AppearanceResolver, json: bool, color: bool) -> Result<String> {
    let preference = resolver.preference();
    let palette = resolver.palette();

    if json {
        let value = serde_json::json!({
            "mode": preference.mode,
            "system_prefers_dark": preference.system_prefers_dark,
            "effective": preference.effective(),
            "current_date_highlight": palette.current_date_highlight,
        });
        return Ok(format!("{}\n", serde_json::to_string_pretty(&value)?));
    }

    let system = if preference.system_prefers_dark {
        "dark"
    } else {
        "light"
    };
    let lines = [
        format!("{} {}", faint("mode:     ", color), preference.mode),
        format!("{} {}", faint("system:   ", color), system),
        format!(
            "{} {}",
            faint("effective:", color),
            strong(preference.effective().as_str(), color)
        ),
        format!("{} {}", faint("highlight:", color), palette.current_date_highlight),
    ];
    Ok(lines.join("\n") + "\n")
}

/// Select `mode` and describe the outcome.
fn apply(resolver: &AppearanceResolver, mode: AppearanceMode, color: bool) -> String {
    let change = resolver.set_mode(mode);

    if change.changed {
        format!(
            "Appearance set to {} (effective: {})",
            strong(change.mode.as_str(), color),
            change.effective
        )
    } else {
        faint(
            &format!(
                "Appearance kept at {} (effective: {})",
                change.mode, change.effective
            ),
            color,
        )
    }
}
