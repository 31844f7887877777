//! Persistence for the chosen appearance mode.
//!
//! Stores never fail from the caller's point of view: a missing or unreadable
//! file reads as "nothing stored", and a failed write is logged and dropped.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::appearance::AppearanceMode;
use crate::config::Config;
use crate::error::{Error, Result};

/// Key-value persistence for the appearance mode.
pub trait PreferenceStore: Send + Sync {
    /// The stored mode, or `None` if nothing usable is stored.
    fn load_mode(&self) -> Option<AppearanceMode>;

    /// Remember `mode`. Failures are logged, not returned.
    fn save_mode(&self, mode: AppearanceMode);
}

#[derive(Debug, Default)]
struct MemoryState {
    mode: Option<AppearanceMode>,
    writes: usize,
}

/// In-memory store. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `mode`. The initial value does not count
    /// as a write.
    pub fn with_mode(mode: AppearanceMode) -> Self {
        let store = Self::new();
        store.state.lock().mode = Some(mode);
        store
    }

    pub fn stored(&self) -> Option<AppearanceMode> {
        self.state.lock().mode
    }

    /// Number of `save_mode` calls so far.
    pub fn writes(&self) -> usize {
        self.state.lock().writes
    }
}

impl PreferenceStore for MemoryStore {
    fn load_mode(&self) -> Option<AppearanceMode> {
        self.stored()
    }

    fn save_mode(&self, mode: AppearanceMode) {
        let mut state = self.state.lock();
        state.mode = Some(mode);
        state.writes += 1;
    }
}

/// On-disk layout of the state file.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StateFile {
    appearance: AppearanceState,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct AppearanceState {
    mode: Option<String>,
}

/// TOML-backed store:
///
/// ```toml
/// [appearance]
/// mode = "dark"
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_STATE_HOME/almanac/state.toml`, else
    /// `~/.local/state/almanac/state.toml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(state_home) = env::var("XDG_STATE_HOME")
            && !state_home.is_empty()
        {
            return Some(PathBuf::from(state_home).join("almanac/state.toml"));
        }

        env::var("HOME")
            .ok()
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(".local/state/almanac/state.toml"))
    }

    /// Store at `appearance.state_file` if configured, else the default path.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .appearance
            .state_file
            .clone()
            .or_else(Self::default_path)
            .map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(&self) -> Result<StateFile> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StateFile::default()),
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content).map_err(|source| Error::StateParse {
            path: self.path.clone(),
            source,
        })
    }

    fn write_state(&self, state: &StateFile) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        // Write then rename so a crash never leaves a half-written file
        let content = toml::to_string_pretty(state)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn load_mode(&self) -> Option<AppearanceMode> {
        let state = match self.read_state() {
            Ok(state) => state,
            Err(e) => {
                warn!("Ignoring unreadable state file: {}", e);
                return None;
            }
        };

        let raw = state.appearance.mode?;
        match raw.parse() {
            Ok(mode) => {
                debug!(path = %self.path.display(), %mode, "Loaded appearance mode");
                Some(mode)
            }
            Err(e) => {
                warn!("Ignoring stored appearance mode in {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn save_mode(&self, mode: AppearanceMode) {
        let mut state = self.read_state().unwrap_or_else(|e| {
            warn!("Replacing unreadable state file: {}", e);
            StateFile::default()
        });
        state.appearance.mode = Some(mode.to_string());

        match self.write_state(&state) {
            Ok(()) => debug!(path = %self.path.display(), %mode, "Saved appearance mode"),
            Err(e) => warn!("Failed to save appearance mode to {:?}: {}", self.path, e),
        }
    }
}
