//! Client-local string key/value persistence.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bolo_core::error::{BoloError, Result};

/// Persistent string storage under fixed keys.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several keys as one unit: either all land or none change.
    ///
    /// The default writes one key at a time and puts earlier keys back if a
    /// later write fails. Stores that can write in one step override it.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut written: Vec<(&str, Option<String>)> = Vec::with_capacity(entries.len());
        for &(key, value) in entries {
            let prior = self.get(key)?;
            if let Err(e) = self.set(key, value) {
                for (key, prior) in written.into_iter().rev() {
                    let restored = match prior {
                        Some(prior) => self.set(key, &prior),
                        None => self.remove(key),
                    };
                    if let Err(re) = restored {
                        tracing::warn!(key = %key, error = %re, "Could not restore key after failed write");
                    }
                }
                return Err(e);
            }
            written.push((key, prior));
        }
        Ok(())
    }
}

/// Volatile store, used in tests and when no data directory is available.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|e| BoloError::Storage(format!("store lock poisoned: {}", e)))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut values = self.lock()?;
        for &(key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

/// Store backed by a flat TOML table on disk.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous contents intact.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string(values)?;
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self
            .guard
            .lock()
            .map_err(|e| BoloError::Storage(format!("store lock poisoned: {}", e)))?;
        let mut values = self.read_all()?;
        f(&mut values);
        self.write_all(&values)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|values| {
            values.remove(key);
        })
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        self.update(|values| {
            for &(key, value) in entries {
                values.insert(key.to_string(), value.to_string());
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
