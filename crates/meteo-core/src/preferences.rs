//! Persistent key-value preference store.
//!
//! A single JSON object of string keys to textual values, kept in the
//! config directory. Values are stored the way a browser profile's local
//! storage would hold them, so the theme flag is the text `true` or `false`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::PreferenceError;

const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Key of the dark theme flag.
pub const DARK_MODE_KEY: &str = "darkMode";

#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store backed by `dir/preferences.json`. Nothing is read until asked.
    pub fn open(dir: &Path) -> Self {
        Self {
            path: dir.join(PREFERENCES_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw textual value for `key`, or `None` when absent or unreadable.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());

        let json = serde_json::to_string_pretty(&entries)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| self.write_error(source))?;
        }
        std::fs::write(&self.path, json).map_err(|source| self.write_error(source))?;

        Ok(())
    }

    /// Dark theme flag; absent or malformed entries read as `false`.
    pub fn load_dark_mode(&self) -> bool {
        match self.get(DARK_MODE_KEY) {
            None => false,
            Some(text) => parse_flag(&text).unwrap_or_else(|| {
                tracing::warn!(value = %text, "Ignoring malformed {} preference", DARK_MODE_KEY);
                false
            }),
        }
    }

    pub fn save_dark_mode(&self, enabled: bool) -> Result<(), PreferenceError> {
        self.set(DARK_MODE_KEY, &serde_json::to_string(&enabled)?)
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read preferences: {}", e);
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), "Preferences file is malformed: {}", e);
            BTreeMap::new()
        })
    }

    fn write_error(&self, source: std::io::Error) -> PreferenceError {
        PreferenceError::Write {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Parse the textual encoding of a boolean flag.
fn parse_flag(text: &str) -> Option<bool> {
    serde_json::from_str::<bool>(text.trim()).ok()
}
