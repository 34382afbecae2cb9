//! Persisted user preferences behind an explicit port.
//!
//! The only state the tool remembers between runs is small and stringly —
//! currently the last-used output directory. Rather than reaching for
//! ambient global state, the pipeline takes a [`PrefStore`] (read/write
//! string by key) owned by the caller, so tests run against [`MemoryPrefs`]
//! and the CLI uses [`JsonFilePrefs`] under the user config directory.
//!
//! Loading is lenient: a missing or unparsable prefs file yields an empty
//! store. Preferences are a convenience, never a reason to fail a build.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key for the last directory a package was built to.
pub const LAST_OUTPUT_DIR_KEY: &str = "last-output-directory";

#[derive(Error, Debug)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize preferences: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed preference storage.
pub trait PrefStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// In-memory store for tests and one-shot invocations.
#[derive(Debug, Default)]
pub struct MemoryPrefs {
    values: BTreeMap<String, String>,
}

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PrefStore for MemoryPrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// On-disk serialized form. Versioned so a future format change can
/// invalidate old files instead of misreading them.
#[derive(Debug, Serialize, Deserialize)]
struct PrefsFile {
    version: u32,
    values: BTreeMap<String, String>,
}

const PREFS_VERSION: u32 = 1;

/// JSON-file-backed store with write-through saves.
#[derive(Debug)]
pub struct JsonFilePrefs {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl JsonFilePrefs {
    /// Load from `path`. A missing, unparsable, or wrong-version file yields
    /// an empty store.
    pub fn load(path: &Path) -> Self {
        let values = std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str::<PrefsFile>(&content).ok())
            .filter(|file| file.version == PREFS_VERSION)
            .map(|file| file.values)
            .unwrap_or_default();
        Self {
            path: path.to_path_buf(),
            values,
        }
    }

    /// Default prefs location under the user config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("modelpack").join("prefs.json"))
    }

    /// Remove all stored preferences, on disk too.
    pub fn clear(&mut self) -> Result<(), PrefsError> {
        self.values.clear();
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    fn save(&self) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = PrefsFile {
            version: PREFS_VERSION,
            values: self.values.clone(),
        };
        std::fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}

impl PrefStore for JsonFilePrefs {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn memory_prefs_set_and_get() {
        let mut prefs = MemoryPrefs::new();
        assert_eq!(prefs.get(LAST_OUTPUT_DIR_KEY), None);
        prefs.set(LAST_OUTPUT_DIR_KEY, "/builds").unwrap();
        assert_eq!(prefs.get(LAST_OUTPUT_DIR_KEY), Some("/builds".into()));
    }

    #[test]
    fn json_prefs_survive_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");

        let mut prefs = JsonFilePrefs::load(&path);
        prefs.set(LAST_OUTPUT_DIR_KEY, "/builds").unwrap();

        let reloaded = JsonFilePrefs::load(&path);
        assert_eq!(reloaded.get(LAST_OUTPUT_DIR_KEY), Some("/builds".into()));
    }

    #[test]
    fn missing_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let prefs = JsonFilePrefs::load(&tmp.path().join("nope.json"));
        assert_eq!(prefs.get(LAST_OUTPUT_DIR_KEY), None);
    }

    #[test]
    fn corrupt_file_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");
        fs::write(&path, "not json at all").unwrap();

        let prefs = JsonFilePrefs::load(&path);
        assert_eq!(prefs.get(LAST_OUTPUT_DIR_KEY), None);
    }

    #[test]
    fn wrong_version_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");
        fs::write(
            &path,
            r#"{"version": 99, "values": {"last-output-directory": "/old"}}"#,
        )
        .unwrap();

        let prefs = JsonFilePrefs::load(&path);
        assert_eq!(prefs.get(LAST_OUTPUT_DIR_KEY), None);
    }

    #[test]
    fn set_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/prefs.json");

        let mut prefs = JsonFilePrefs::load(&path);
        prefs.set("key", "value").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn clear_removes_file_and_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("prefs.json");

        let mut prefs = JsonFilePrefs::load(&path);
        prefs.set("key", "value").unwrap();
        prefs.clear().unwrap();

        assert_eq!(prefs.get("key"), None);
        assert!(!path.exists());
    }
}
