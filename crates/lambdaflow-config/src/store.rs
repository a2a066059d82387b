//! Key-value persistence for values reused across deployments
//!
//! Settings live in `settings.json` under the config directory and hold
//! identifiers resolved by earlier runs (account ID, role ARN, REST API ID...).

use crate::error::{ConfigError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const SETTINGS_VERSION: u32 = 1;

/// Minimal get/set capability over persisted settings
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str);

    fn remove(&mut self, key: &str) -> Option<String>;

    fn keys(&self) -> Vec<String>;
}

/// In-memory store, used when nothing should touch the disk
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SettingsFile {
    version: u32,
    updated_at: DateTime<Utc>,
    values: BTreeMap<String, String>,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            updated_at: Utc::now(),
            values: BTreeMap::new(),
        }
    }
}

/// File-backed settings store
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    settings: SettingsFile,
    dirty: bool,
}

impl ConfigStore {
    /// Open the store at `path`; a missing file yields an empty store
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let settings = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let settings: SettingsFile = serde_json::from_str(&content)?;
            if settings.version > SETTINGS_VERSION {
                return Err(ConfigError::UnsupportedVersion {
                    path,
                    found: settings.version,
                    supported: SETTINGS_VERSION,
                });
            }
            tracing::debug!(
                "Loaded {} settings from {}",
                settings.values.len(),
                path.display()
            );
            settings
        } else {
            tracing::debug!("Settings file not found, starting empty");
            SettingsFile::default()
        };

        Ok(Self {
            path,
            settings,
            dirty: false,
        })
    }

    /// Open the store at the default settings location
    pub fn open_default() -> Result<Self> {
        Self::open(crate::settings_path()?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.settings.updated_at
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".backup");
        self.path.with_file_name(name)
    }

    /// Write pending changes, keeping the previous file as a backup
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        if self.path.exists() {
            let backup = self.backup_path();
            if backup.exists() {
                std::fs::remove_file(&backup)?;
            }
            std::fs::rename(&self.path, &backup)?;
        }

        let content = serde_json::to_string_pretty(&self.settings)?;
        std::fs::write(&self.path, content)?;
        self.dirty = false;

        tracing::debug!(
            "Saved {} settings to {}",
            self.settings.values.len(),
            self.path.display()
        );
        Ok(())
    }
}

impl KeyValueStore for ConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.settings.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        if self.settings.values.get(key).map(String::as_str) == Some(value) {
            return;
        }
        self.settings
            .values
            .insert(key.to_string(), value.to_string());
        self.settings.updated_at = Utc::now();
        self.dirty = true;
    }

    fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.settings.values.remove(key);
        if removed.is_some() {
            self.settings.updated_at = Utc::now();
            self.dirty = true;
        }
        removed
    }

    fn keys(&self) -> Vec<String> {
        self.settings.values.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_store_save_load() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut store = ConfigStore::open(&path).unwrap();
        store.set("aws.rest_api_id", "abc123");
        store.save().unwrap();

        let loaded = ConfigStore::open(&path).unwrap();
        assert_eq!(loaded.get("aws.rest_api_id"), Some("abc123".to_string()));
        assert_eq!(loaded.keys(), vec!["aws.rest_api_id".to_string()]);
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = tempdir().unwrap();
        let store = ConfigStore::open(temp_dir.path().join("none.json")).unwrap();
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_save_creates_backup() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut store = ConfigStore::open(&path).unwrap();
        store.set("aws.region", "eu-west-1");
        store.save().unwrap();
        store.set("aws.region", "us-east-1");
        store.save().unwrap();

        assert!(temp_dir.path().join("settings.json.backup").exists());
        let loaded = ConfigStore::open(&path).unwrap();
        assert_eq!(loaded.get("aws.region"), Some("us-east-1".to_string()));
    }

    #[test]
    fn test_unchanged_store_does_not_write() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");

        let mut store = ConfigStore::open(&path).unwrap();
        store.save().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_newer_version_rejected() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"version": 99, "updated_at": "2024-01-01T00:00:00Z", "values": {}}"#,
        )
        .unwrap();

        assert!(matches!(
            ConfigStore::open(&path),
            Err(ConfigError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_memory_store_remove() {
        let mut store = MemoryStore::new();
        store.set("k", "v");
        assert_eq!(store.remove("k"), Some("v".to_string()));
        assert!(store.get("k").is_none());
    }
}
