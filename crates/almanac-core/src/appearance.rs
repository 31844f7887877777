//! Light/dark appearance resolution.
//!
//! The user picks one of three modes (system, light, dark). The effective
//! theme is derived, never stored:
//!
//! - `Dark` if the mode is `Dark`, or the mode is `System` and the
//!   environment prefers dark
//! - `Light` otherwise
//!
//! A Light/Dark override is not disturbed by later system signals; those are
//! still recorded so that returning to `System` picks up the current value.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::PreferenceStore;
use crate::theme::ThemePalette;

/// The user's appearance choice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppearanceMode {
    /// Follow the environment's color-scheme preference.
    #[default]
    System,
    Light,
    Dark,
}

impl AppearanceMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AppearanceMode::System => "system",
            AppearanceMode::Light => "light",
            AppearanceMode::Dark => "dark",
        }
    }
}

impl fmt::Display for AppearanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppearanceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" | "auto" => Ok(AppearanceMode::System),
            "light" => Ok(AppearanceMode::Light),
            "dark" => Ok(AppearanceMode::Dark),
            other => Err(Error::InvalidArgument(format!(
                "invalid appearance mode '{}', expected 'system', 'light' or 'dark'",
                other
            ))),
        }
    }
}

/// The theme actually applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mode plus the last known system signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppearancePreference {
    pub mode: AppearanceMode,
    pub system_prefers_dark: bool,
}

impl AppearancePreference {
    pub fn new(mode: AppearanceMode, system_prefers_dark: bool) -> Self {
        Self {
            mode,
            system_prefers_dark,
        }
    }

    pub fn effective(&self) -> Theme {
        match self.mode {
            AppearanceMode::Dark => Theme::Dark,
            AppearanceMode::Light => Theme::Light,
            AppearanceMode::System if self.system_prefers_dark => Theme::Dark,
            AppearanceMode::System => Theme::Light,
        }
    }
}

/// Handle for a registered callback. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription to a source that never fires.
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type Listener<T> = Arc<dyn Fn(T) + Send + Sync>;

struct ListenerEntries<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

/// Callbacks keyed by id. Shared by push-driven signal sources and the
/// resolver's theme watchers.
pub(crate) struct ListenerSet<T> {
    inner: Arc<Mutex<ListenerEntries<T>>>,
}

impl<T> Clone for ListenerSet<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Copy + 'static> ListenerSet<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(ListenerEntries {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    pub(crate) fn add(&self, callback: Listener<T>) -> Subscription {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.entries.push((id, callback));
            id
        };

        let weak = Arc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().entries.retain(|(entry_id, _)| *entry_id != id);
            }
        })
    }

    /// Invoke every callback with `value`. Callbacks run outside the lock so
    /// they may subscribe or unsubscribe.
    pub(crate) fn notify(&self, value: T) {
        let snapshot: Vec<Listener<T>> = self
            .inner
            .lock()
            .entries
            .iter()
            .map(|(_, callback)| callback.clone())
            .collect();
        for callback in snapshot {
            callback(value);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

/// The environment's "prefers-color-scheme: dark" signal.
pub trait SystemPreference {
    /// Current value of the signal.
    fn prefers_dark(&self) -> bool;

    /// Register for changes. The callback receives the new value.
    fn subscribe(&self, callback: Box<dyn Fn(bool) + Send + Sync>) -> Subscription;
}

/// A push-driven signal. Hosts (and tests) call
/// [`set_prefers_dark`](Self::set_prefers_dark) when the environment changes.
#[derive(Clone)]
pub struct ManualSystemPreference {
    prefers_dark: Arc<Mutex<bool>>,
    listeners: ListenerSet<bool>,
}

impl ManualSystemPreference {
    pub fn new(prefers_dark: bool) -> Self {
        Self {
            prefers_dark: Arc::new(Mutex::new(prefers_dark)),
            listeners: ListenerSet::new(),
        }
    }

    /// Update the signal. Listeners are only called when the value changes.
    pub fn set_prefers_dark(&self, prefers_dark: bool) {
        {
            let mut current = self.prefers_dark.lock();
            if *current == prefers_dark {
                return;
            }
            *current = prefers_dark;
        }
        debug!(prefers_dark, "System color scheme changed");
        self.listeners.notify(prefers_dark);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl SystemPreference for ManualSystemPreference {
    fn prefers_dark(&self) -> bool {
        *self.prefers_dark.lock()
    }

    fn subscribe(&self, callback: Box<dyn Fn(bool) + Send + Sync>) -> Subscription {
        self.listeners.add(Arc::from(callback))
    }
}

/// A signal that never changes.
#[derive(Debug, Clone, Copy)]
pub struct StaticSystemPreference(pub bool);

impl SystemPreference for StaticSystemPreference {
    fn prefers_dark(&self) -> bool {
        self.0
    }

    fn subscribe(&self, _callback: Box<dyn Fn(bool) + Send + Sync>) -> Subscription {
        Subscription::noop()
    }
}

/// Environment variable read by [`EnvSystemPreference`] first.
pub const COLOR_SCHEME_ENV: &str = "ALMANAC_COLOR_SCHEME";

/// Reads the color-scheme preference once from the process environment.
///
/// `ALMANAC_COLOR_SCHEME=dark|light` wins. Otherwise the terminal's
/// `COLORFGBG` background index is used (0-6 and 8 are dark). Anything else
/// falls back to light.
#[derive(Debug, Clone, Copy)]
pub struct EnvSystemPreference {
    prefers_dark: bool,
}

impl EnvSystemPreference {
    pub fn from_env() -> Self {
        let scheme = std::env::var(COLOR_SCHEME_ENV).ok();
        let colorfgbg = std::env::var("COLORFGBG").ok();
        Self {
            prefers_dark: Self::detect(scheme.as_deref(), colorfgbg.as_deref()),
        }
    }

    /// Pure detection logic behind [`from_env`](Self::from_env).
    pub fn detect(scheme: Option<&str>, colorfgbg: Option<&str>) -> bool {
        if let Some(scheme) = scheme {
            match scheme.trim().to_ascii_lowercase().as_str() {
                "dark" | "prefer-dark" => return true,
                "light" | "prefer-light" | "default" => return false,
                other => debug!("Ignoring unknown {} value '{}'", COLOR_SCHEME_ENV, other),
            }
        }

        let background = colorfgbg
            .and_then(|value| value.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());
        matches!(background, Some(0..=6 | 8))
    }
}

impl SystemPreference for EnvSystemPreference {
    fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }

    fn subscribe(&self, _callback: Box<dyn Fn(bool) + Send + Sync>) -> Subscription {
        Subscription::noop()
    }
}

/// Outcome of [`AppearanceResolver::set_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeChange {
    /// The mode to persist.
    pub mode: AppearanceMode,
    pub effective: Theme,
    /// Whether the selection differed from the previous mode.
    pub changed: bool,
}

/// Owns the appearance preference for one session.
///
/// Construction reads the persisted mode and the system signal once and
/// subscribes to the signal. Dropping the resolver drops that subscription.
pub struct AppearanceResolver {
    state: Arc<Mutex<AppearancePreference>>,
    watchers: ListenerSet<Theme>,
    store: Box<dyn PreferenceStore>,
    accent: Option<String>,
    _system_subscription: Subscription,
}

impl AppearanceResolver {
    /// Create a resolver whose mode defaults to `System` when nothing is
    /// persisted.
    pub fn new(system: &dyn SystemPreference, store: Box<dyn PreferenceStore>) -> Self {
        Self::with_default_mode(system, store, AppearanceMode::System)
    }

    /// Create a resolver with an explicit fallback mode.
    pub fn with_default_mode(
        system: &dyn SystemPreference,
        store: Box<dyn PreferenceStore>,
        default_mode: AppearanceMode,
    ) -> Self {
        let stored = store.load_mode();
        let mode = stored.unwrap_or(default_mode);
        let preference = AppearancePreference::new(mode, system.prefers_dark());

        info!(
            %mode,
            restored = stored.is_some(),
            system_prefers_dark = preference.system_prefers_dark,
            effective = %preference.effective(),
            "Appearance initialized"
        );

        let state = Arc::new(Mutex::new(preference));
        let watchers = ListenerSet::new();

        let weak_state = Arc::downgrade(&state);
        let signal_watchers = watchers.clone();
        let subscription = system.subscribe(Box::new(move |prefers_dark| {
            apply_system_signal(&weak_state, &signal_watchers, prefers_dark);
        }));

        Self {
            state,
            watchers,
            store,
            accent: None,
            _system_subscription: subscription,
        }
    }

    /// Accent color used by [`palette`](Self::palette).
    pub fn with_accent(mut self, accent: impl Into<String>) -> Self {
        self.accent = Some(accent.into());
        self
    }

    pub fn mode(&self) -> AppearanceMode {
        self.state.lock().mode
    }

    pub fn system_prefers_dark(&self) -> bool {
        self.state.lock().system_prefers_dark
    }

    pub fn preference(&self) -> AppearancePreference {
        *self.state.lock()
    }

    pub fn effective(&self) -> Theme {
        self.state.lock().effective()
    }

    /// Palette for the current effective theme.
    pub fn palette(&self) -> ThemePalette {
        ThemePalette::for_theme(self.effective(), self.accent.as_deref())
    }

    /// Apply a user selection and write it through to the store.
    ///
    /// The store is written on every call, so a mode that only matched the
    /// configured default becomes an explicit stored choice. Watchers are
    /// called only when the effective theme moves.
    pub fn set_mode(&self, mode: AppearanceMode) -> ModeChange {
        let (before, after, changed) = {
            let mut state = self.state.lock();
            let before = state.effective();
            let changed = state.mode != mode;
            state.mode = mode;
            (before, state.effective(), changed)
        };

        self.store.save_mode(mode);
        if changed {
            info!(%mode, effective = %after, "Appearance mode changed");
        } else {
            debug!(%mode, "Appearance mode reselected");
        }

        if before != after {
            self.watchers.notify(after);
        }

        ModeChange {
            mode,
            effective: after,
            changed,
        }
    }

    /// Record a new system signal. The effective theme only moves while the
    /// mode is `System`.
    pub fn on_system_preference_changed(&self, prefers_dark: bool) -> Theme {
        apply_system_signal(&Arc::downgrade(&self.state), &self.watchers, prefers_dark);
        self.effective()
    }

    /// Call `callback` with the new theme whenever the effective theme
    /// changes.
    pub fn watch(&self, callback: impl Fn(Theme) + Send + Sync + 'static) -> Subscription {
        self.watchers.add(Arc::new(callback))
    }
}

impl fmt::Debug for AppearanceResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppearanceResolver")
            .field("preference", &self.preference())
            .field("accent", &self.accent)
            .finish_non_exhaustive()
    }
}

fn apply_system_signal(
    state: &Weak<Mutex<AppearancePreference>>,
    watchers: &ListenerSet<Theme>,
    prefers_dark: bool,
) {
    let Some(state) = state.upgrade() else {
        return;
    };

    let (before, after) = {
        let mut state = state.lock();
        let before = state.effective();
        state.system_prefers_dark = prefers_dark;
        (before, state.effective())
    };

    debug!(prefers_dark, effective = %after, "System preference applied");

    if before != after {
        watchers.notify(after);
    }
}
